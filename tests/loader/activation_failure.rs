use std::sync::Arc ;
use class_link::{ ClassTransformer, DefineError, LoadError, MemorySource, UnitDefiner, UnitLoader, UnitName, UnitState };
use crate::fixture_classes::empty_class ;

#[derive( Debug )]
struct Rejecting ;

impl UnitDefiner for Rejecting {
	fn define( &self, name: &UnitName, _bytes: &[u8] ) -> Result<(), DefineError> {
		match name.simple_name().starts_with( "Forbidden" ) {
			true => Err( DefineError::Rejected( format!( "{name} is forbidden" ).into() )),
			false => Ok(()),
		}
	}
}

#[test]
fn activation_failure_name_mismatch() {

	let loader = UnitLoader::new( Arc::new( ClassTransformer::new() ));
	loader.add_source( Arc::new( MemorySource::new( "memory" ).with( "com/example/Liar.class", empty_class( "com.example.Honest" ))));
	let name = unit!( "com.example.Liar" );

	match loader.activate( &name ) {
		Err( LoadError::Activation { name: failed, source: DefineError::NameMismatch { found, .. }})
			if failed == name && found == "com/example/Honest" => {}
		other => panic!( "Expected Err( Activation( NameMismatch )), found: {:?}", other ),
	}
	assert_eq!( loader.state( &name ), UnitState::Unresolved );

}

#[test]
fn activation_failure_malformed_bytes() {

	let loader = UnitLoader::new( Arc::new( ClassTransformer::new() ));
	loader.add_source( Arc::new( MemorySource::new( "memory" ).with( "com/example/Junk.class", b"junk".to_vec() )));

	match loader.activate( &unit!( "com.example.Junk" )) {
		Err( LoadError::Activation { source: DefineError::Malformed( _ ), .. }) => {}
		other => panic!( "Expected Err( Activation( Malformed )), found: {:?}", other ),
	}

}

#[test]
fn activation_failure_is_retried_on_next_request() {

	let source = Arc::new( MemorySource::new( "memory" ).with( "com/example/Fixed.class", b"junk".to_vec() ));
	let loader = UnitLoader::new( Arc::new( ClassTransformer::new() ));
	loader.add_source( source.clone() );
	let name = unit!( "com.example.Fixed" );

	assert!( loader.activate( &name ).is_err() );
	source.insert( name.resource_path(), empty_class( "com.example.Fixed" ));
	assert!( loader.activate( &name ).is_ok() );
	assert!( loader.is_active( &name ));

}

#[test]
fn activation_failure_custom_definer() {

	let loader = UnitLoader::new( Arc::new( ClassTransformer::new() )).with_definer( Arc::new( Rejecting ));
	loader.add_source( Arc::new( MemorySource::new( "memory" )
		.with( "com/example/ForbiddenFruit.class", empty_class( "com.example.ForbiddenFruit" ))
		.with( "com/example/Apple.class", empty_class( "com.example.Apple" ))));

	match loader.activate( &unit!( "com.example.ForbiddenFruit" )) {
		Err( LoadError::Activation { source: DefineError::Rejected( reason ), .. }) if reason.to_string().contains( "forbidden" ) => {}
		other => panic!( "Expected Err( Activation( Rejected )), found: {:?}", other ),
	}
	assert!( loader.activate( &unit!( "com.example.Apple" )).is_ok() );

}
