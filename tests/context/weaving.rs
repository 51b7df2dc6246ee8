use std::sync::Arc ;
use std::sync::atomic::{ AtomicUsize, Ordering };
use class_link::{
	AccessFlags, BootstrapError, BoxError, ClassNode, ContextBuilder, LoaderConfig, MemorySource, PipelineError,
	RegistryError, SourceParent, TransformError, TransformPhase, TransformationService, UnitName,
	WeaveEngine, WeaveEngineFactory, WeaveError, WeavingService,
};
use crate::fixture_classes::{ empty_class, field_access, source_with };

struct MarkerEngine ;

impl WeaveEngine for MarkerEngine {

	fn is_synthetic( &self, name: &UnitName ) -> bool { name.simple_name().ends_with( "Generated" ) }

	fn generate( &self, _name: &UnitName, node: &mut ClassNode ) -> Result<bool, BoxError> {
		node.add_field( AccessFlags::PUBLIC | AccessFlags::STATIC, "generated", "Z" )?;
		Ok( true )
	}

	fn transform( &self, name: &UnitName, node: &mut ClassNode ) -> Result<bool, BoxError> {
		if name.simple_name() == "Plain" { return Ok( false ) }
		node.add_field( AccessFlags::PRIVATE, "woven", "I" )?;
		Ok( true )
	}

}

struct Factory { fail: bool }

impl WeaveEngineFactory for Factory {
	fn create( &self ) -> Result<Box<dyn WeaveEngine>, BoxError> {
		match self.fail {
			true => Err( "engine unavailable".into() ),
			false => Ok( Box::new( MarkerEngine )),
		}
	}
}

/// Active in WEAVE only. Adds an `introspected` field, or reports a violation.
#[derive( Default )]
struct Introspector { violate: bool, applied: AtomicUsize }

impl TransformationService for Introspector {

	fn name( &self ) -> &str { "introspector" }

	fn priority( &self, phase: TransformPhase ) -> i32 {
		match phase {
			TransformPhase::Load => -1,
			TransformPhase::Weave => 0,
		}
	}

	fn should_apply( &self, _name: &UnitName, _node: &ClassNode ) -> bool { true }

	fn apply( &self, _name: &UnitName, node: &ClassNode, _phase: TransformPhase ) -> Result<Option<ClassNode>, TransformError> {
		self.applied.fetch_add( 1, Ordering::SeqCst );
		if self.violate { return Err( TransformError::fatal( "inconsistent tree" )) }
		let mut node = node.clone();
		node.add_field( AccessFlags::PUBLIC, "introspected", "Z" ).map_err( TransformError::recoverable )?;
		Ok( Some( node ))
	}

}

fn context_with( service: Arc<Introspector> ) -> class_link::LoaderContext {
	let ( context, _ ) = ContextBuilder::new( LoaderConfig::default() )
		.with_weave_factory( Arc::new( Factory { fail: false }))
		.with_service( service )
		.with_source( Arc::new( source_with( "memory", &[ "com.example.Target" ])))
		.build()
		.expect( "Failed to build context" );
	context
}

fn context() -> class_link::LoaderContext {
	let parent = Arc::new( SourceParent::default() );
	parent.sources().add( Arc::new( source_with( "parent", &[ "com.example.Inherited" ])));
	let source = source_with( "memory", &[ "com.example.Target", "com.example.Plain" ]);
	let ( context, _ ) = ContextBuilder::new( LoaderConfig::default() )
		.with_weave_factory( Arc::new( Factory { fail: false }))
		.with_parent( parent )
		.with_source( Arc::new( source ))
		.build()
		.expect( "Failed to build context" );
	context
}

#[test]
fn weaving_runs_during_load() {

	let context = context();

	assert!( context.weaving().is_some_and(| weaving | weaving.is_ready() ));
	let target = context.activate( &unit!( "com.example.Target" )).unwrap();
	assert_eq!( field_access( target.bytes(), "woven" ), AccessFlags::PRIVATE );

	// An engine that reports no change leaves the original bytes.
	let plain = context.activate( &unit!( "com.example.Plain" )).unwrap();
	assert_eq!( plain.bytes(), empty_class( "com.example.Plain" ).as_slice() );

}

#[test]
fn weaving_class_node_for_existing_and_inherited_units() {

	let context = context();

	match context.weave_class_node( &unit!( "com.example.Target" )) {
		Ok( node ) if node.name().unwrap() == "com/example/Target" && node.fields().is_empty() => {}
		other => panic!( "Expected the untransformed Target, found: {:#?}", other ),
	}
	// Only the WEAVE phase reads through to the parent's resources.
	match context.weave_class_node( &unit!( "com.example.Inherited" )) {
		Ok( node ) if node.name().unwrap() == "com/example/Inherited" => {}
		other => panic!( "Expected Inherited from the parent, found: {:#?}", other ),
	}

}

#[test]
fn weaving_class_node_generates_synthetic_units() {

	let context = context();

	match context.weave_class_node( &unit!( "com.example.Generated" )) {
		Ok( node ) if node.fields().len() == 1 && node.member_name( &node.fields()[0] ) == Ok( "generated" ) => {}
		other => panic!( "Expected a generated class, found: {:#?}", other ),
	}
	match context.weave_class_node( &unit!( "com.example.Missing" )) {
		Err( WeaveError::ClassNotFound( name )) if name.as_str() == "com.example.Missing" => {}
		other => panic!( "Expected Err( ClassNotFound ), found: {:#?}", other ),
	}

}

#[test]
fn weaving_without_factory() {

	let ( context, _ ) = ContextBuilder::new( LoaderConfig::default() ).build().unwrap();
	match context.weave_class_node( &unit!( "com.example.Any" )) {
		Err( WeaveError::FactoryMissing ) => {}
		other => panic!( "Expected Err( FactoryMissing ), found: {:#?}", other ),
	}

	let service = WeavingService::new();
	match service.prepare() {
		Err( WeaveError::FactoryMissing ) => {}
		other => panic!( "Expected Err( FactoryMissing ), found: {:#?}", other ),
	}
	match service.class_node( &unit!( "com.example.Any" ), &[] ) {
		Err( WeaveError::NotReady ) => {}
		other => panic!( "Expected Err( NotReady ), found: {:#?}", other ),
	}

}

#[test]
fn weaving_failing_factory_aborts_bootstrap() {

	let result = ContextBuilder::new( LoaderConfig::default() )
		.with_weave_factory( Arc::new( Factory { fail: true }))
		.with_source( Arc::new( MemorySource::new( "memory" )))
		.build();

	match result {
		Err( BootstrapError::Registry( RegistryError::Setup { service, .. })) if service == WeavingService::NAME => {}
		other => panic!( "Expected Err( Registry( Setup )), found: {:?}", other.map(|( context, _ )| context )),
	}

}

#[test]
fn weaving_class_node_runs_weave_services() {

	let service = Arc::new( Introspector::default() );
	let context = context_with( Arc::clone( &service ));
	let name = unit!( "com.example.Target" );

	match context.weave_class_node( &name ) {
		Ok( node ) if node.fields().len() == 1 && node.member_name( &node.fields()[0] ) == Ok( "introspected" ) => {}
		other => panic!( "Expected the WEAVE transformed Target, found: {:#?}", other ),
	}
	// WEAVE services stay out of LOAD.
	let unit = context.activate( &name ).unwrap();
	assert!( ClassNode::parse( unit.bytes() ).unwrap().fields().iter().all(| field | field.access != AccessFlags::PUBLIC ));
	assert_eq!( service.applied.load( Ordering::SeqCst ), 1 );

}

#[test]
fn weaving_class_node_surfaces_weave_violations() {

	let context = context_with( Arc::new( Introspector { violate: true, ..Introspector::default() }));

	match context.weave_class_node( &unit!( "com.example.Target" )) {
		Err( WeaveError::Transform( PipelineError::Violation { service, .. })) if service == "introspector" => {}
		other => panic!( "Expected Err( Transform( Violation )), found: {:#?}", other ),
	}

}
