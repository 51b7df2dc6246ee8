use std::sync::Arc ;
use class_link::{ ClassTransformer, SourceParent, TransformPhase, UnitLoader };
use crate::fixture_classes::source_with ;

fn loader() -> UnitLoader {
	let parent = Arc::new( SourceParent::default() );
	parent.sources().add( Arc::new( source_with( "parent", &[ "com.example.Inherited" ])));
	let loader = UnitLoader::new( Arc::new( ClassTransformer::new() )).with_parent( parent );
	loader.add_source( Arc::new( source_with( "own", &[ "com.example.Own" ])));
	loader
}

#[test]
fn raw_bytes_weave_falls_back_to_parent_resources() {

	let loader = loader();
	let name = unit!( "com.example.Inherited" );

	assert!( loader.unit_raw_bytes( &name, TransformPhase::Load ).is_none() );
	match loader.unit_raw_bytes( &name, TransformPhase::Weave ) {
		Some( resource ) if resource.origin().location() == "parent" => {}
		other => panic!( "Expected the parent's bytes, found: {:#?}", other ),
	}

}

#[test]
fn raw_bytes_own_source_in_both_phases() {

	let loader = loader();
	let name = unit!( "com.example.Own" );

	for phase in TransformPhase::ALL {
		match loader.unit_raw_bytes( &name, phase ) {
			Some( resource ) if resource.origin().location() == "own" => {}
			other => panic!( "Expected own bytes in {}, found: {:#?}", phase, other ),
		}
	}
	// Reading raw bytes does not activate anything.
	assert!( !loader.is_active( &name ));

}

#[test]
fn raw_bytes_resources_fall_back_to_parent() {

	let loader = loader();

	assert!( loader.resource( "com/example/Inherited.class" ).is_some() );
	assert!( loader.resource( "com/example/Nowhere.class" ).is_none() );

}
