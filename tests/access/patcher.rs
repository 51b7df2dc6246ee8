use std::sync::Arc ;
use class_link::{
	AccessError, AccessFlags, AccessPatcher, AccessRegistry, ClassTransformer, PipelineError,
	TransformOutcome, TransformPhase, TransformationService,
};
use crate::fixture_classes::{ class_bytes, field_access, init_logging, method_access };

fn patched_transformer( rules: &str ) -> ClassTransformer {
	let registry = Arc::new( AccessRegistry::new() );
	let ( _, errors ) = registry.register_text( rules ).unwrap();
	assert_no_compile_errors!( errors );
	let transformer = ClassTransformer::new();
	transformer.register( Arc::new( AccessPatcher::new( registry ))).unwrap();
	transformer.finalize_setup().unwrap();
	transformer
}

#[test]
fn patcher_rewrites_class_and_members() {

	init_logging();
	let transformer = patched_transformer( "\
		public-f com.example.Foo\n\
		public com.example.Foo counter\n\
		protected com.example.Foo run()V\n\
		protected-f com.example.Bar baz\n\
	" );
	let input = class_bytes( "com.example.Foo",
		&[( AccessFlags::PRIVATE | AccessFlags::FINAL, "counter", "I" ), ( AccessFlags::PRIVATE, "untouched", "I" )],
		&[( AccessFlags::PRIVATE, "run", "()V" ), ( AccessFlags::PRIVATE, "run", "(I)V" )],
	);

	let output = match transformer.transform_bytes( &unit!( "com.example.Foo" ), &input, TransformPhase::Load ) {
		Ok( TransformOutcome::Rewritten( bytes )) => bytes,
		other => panic!( "Expected Ok( Rewritten ), found: {:?}", other ),
	};

	let node = class_link::ClassNode::parse( &output ).unwrap();
	assert_eq!( node.access, AccessFlags::PUBLIC | AccessFlags::SUPER );
	assert_eq!( field_access( &output, "counter" ), AccessFlags::PUBLIC | AccessFlags::FINAL );
	assert_eq!( field_access( &output, "untouched" ), AccessFlags::PRIVATE );
	assert_eq!( method_access( &output, "run", "()V" ), AccessFlags::PROTECTED );
	assert_eq!( method_access( &output, "run", "(I)V" ), AccessFlags::PRIVATE );

}

#[test]
fn patcher_ignores_classes_without_rules() {

	let transformer = patched_transformer( "public com.example.Foo\n" );
	let input = class_bytes( "com.example.Other", &[], &[] );

	match transformer.transform_bytes( &unit!( "com.example.Other" ), &input, TransformPhase::Load ) {
		Ok( TransformOutcome::Untouched ) => {}
		other => panic!( "Expected Ok( Untouched ), found: {:?}", other ),
	}

}

#[test]
fn patcher_missing_member_is_a_violation() {

	let transformer = patched_transformer( "public com.example.Foo ghost\n" );
	let input = class_bytes( "com.example.Foo", &[( AccessFlags::PRIVATE, "real", "I" )], &[] );

	match transformer.transform_bytes( &unit!( "com.example.Foo" ), &input, TransformPhase::Load ) {
		Err( PipelineError::Violation { service, source, .. }) if service == AccessPatcher::NAME => {
			match source.downcast_ref::<AccessError>() {
				Some( AccessError::MissingField { class, field }) if class == "com/example/Foo" && field == "ghost" => {}
				other => panic!( "Expected MissingField, found: {:?}", other ),
			}
		},
		other => panic!( "Expected Err( Violation ), found: {:?}", other ),
	}

}

#[test]
fn patcher_apply_before_lock_is_a_violation() {

	let registry = Arc::new( AccessRegistry::new() );
	registry.register_text( "public com.example.Foo\n" ).unwrap();
	let transformer = ClassTransformer::new();
	transformer.register( Arc::new( AccessPatcher::new( Arc::clone( &registry )))).unwrap();

	let input = class_bytes( "com.example.Foo", &[], &[] );
	match transformer.transform_bytes( &unit!( "com.example.Foo" ), &input, TransformPhase::Load ) {
		Err( PipelineError::Violation { source, .. }) if matches!( source.downcast_ref::<AccessError>(), Some( AccessError::NotLocked )) => {}
		other => panic!( "Expected Err( Violation( NotLocked )), found: {:?}", other ),
	}

}

#[test]
fn patcher_phases_and_setup() {

	let registry = Arc::new( AccessRegistry::new() );
	let patcher = AccessPatcher::new( Arc::clone( &registry ));

	assert_eq!( patcher.priority( TransformPhase::Load ), AccessPatcher::LOAD_PRIORITY );
	assert!( patcher.priority( TransformPhase::Weave ) < 0 );

	patcher.on_finalize_setup().unwrap();
	assert!( registry.is_locked() );

}
