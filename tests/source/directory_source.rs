use class_link::{ DirectorySource, ResourceSource, SourceError, SourceRegistry, MANIFEST_PATH };
use crate::fixture_classes::empty_class ;

fn populated_dir() -> tempfile::TempDir {
	let dir = tempfile::tempdir().expect( "Failed to create temp dir" );
	std::fs::create_dir_all( dir.path().join( "com/example" )).unwrap();
	std::fs::create_dir_all( dir.path().join( "META-INF" )).unwrap();
	std::fs::write( dir.path().join( "com/example/Foo.class" ), empty_class( "com.example.Foo" )).unwrap();
	std::fs::write( dir.path().join( MANIFEST_PATH ), "Manifest-Version: 1.0\nImplementation-Title: dir\n" ).unwrap();
	dir
}

#[test]
fn directory_source_reads_files_under_root() {

	let dir = populated_dir();
	let source = DirectorySource::new( dir.path() );

	match source.read( "com/example/Foo.class" ) {
		Ok( Some( bytes )) if *bytes == *empty_class( "com.example.Foo" ) => {}
		other => panic!( "Expected the class bytes, found: {:?}", other ),
	}
	match source.read( "com/example/Missing.class" ) {
		Ok( None ) => {}
		other => panic!( "Expected Ok( None ), found: {:?}", other ),
	}
	// Directories are not resources.
	match source.read( "com/example" ) {
		Ok( None ) => {}
		other => panic!( "Expected Ok( None ), found: {:?}", other ),
	}

}

#[test]
fn directory_source_loads_manifest_at_open() {

	let dir = populated_dir();
	let source = DirectorySource::new( dir.path() );

	match source.origin().manifest() {
		Some( manifest ) if manifest.main_attribute( "implementation-title" ) == Some( "dir" ) => {}
		other => panic!( "Expected the directory manifest, found: {:#?}", other ),
	}

}

#[test]
fn directory_source_rejects_escaping_paths() {

	let dir = populated_dir();
	let source = DirectorySource::new( dir.path().join( "com" ));

	for path in [ "../META-INF/MANIFEST.MF", "/etc/passwd", "example/../../x" ] {
		match source.read( path ) {
			Err( SourceError::InvalidPath( _ )) => {}
			other => panic!( "Expected Err( InvalidPath ) for {path}, found: {:?}", other ),
		}
	}

}

#[test]
fn directory_source_added_by_path() {

	let dir = populated_dir();
	let registry = SourceRegistry::new();
	registry.add_path( dir.path() ).expect( "Failed to add directory" );

	assert!( registry.resolve( "com/example/Foo.class" ).is_some() );

	match registry.add_path( dir.path().join( "does-not-exist" )) {
		Err( SourceError::Open { .. }) => {}
		other => panic!( "Expected Err( Open ), found: {:?}", other ),
	}

}
