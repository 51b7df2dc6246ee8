use std::io::Write ;
use class_link::{ ArchiveSource, ResourceSource, SourceError, SourceRegistry, MANIFEST_PATH };
use flate2::Compression ;
use flate2::write::GzEncoder ;
use tar::{ Builder, EntryType, Header };
use crate::fixture_classes::empty_class ;

fn file_header( size: usize ) -> Header {
	let mut header = Header::new_gnu();
	header.set_size( size as u64 );
	header.set_mode( 0o644 );
	header.set_entry_type( EntryType::Regular );
	header
}

fn tar_of( files: &[( &str, Vec<u8> )] ) -> Vec<u8> {
	let mut builder = Builder::new( Vec::new() );
	let mut dir = Header::new_gnu();
	dir.set_entry_type( EntryType::Directory );
	dir.set_mode( 0o755 );
	dir.set_size( 0 );
	builder.append_data( &mut dir, "com/example/", std::io::empty() ).unwrap();
	for ( path, bytes ) in files {
		let mut header = file_header( bytes.len() );
		builder.append_data( &mut header, path, bytes.as_slice() ).unwrap();
	}
	builder.into_inner().unwrap()
}

fn gzip( data: &[u8] ) -> Vec<u8> {
	let mut encoder = GzEncoder::new( Vec::new(), Compression::default() );
	encoder.write_all( data ).unwrap();
	encoder.finish().unwrap()
}

fn sample_tar() -> Vec<u8> {
	tar_of( &[
		( "com/example/Foo.class", empty_class( "com.example.Foo" )),
		( "./com/example/Bar.class", empty_class( "com.example.Bar" )),
		( MANIFEST_PATH, b"Manifest-Version: 1.0\nSpecification-Title: archive\n".to_vec() ),
	])
}

#[test]
fn archive_source_indexes_regular_files() {

	let source = ArchiveSource::from_bytes( "sample.tar", &sample_tar() ).expect( "Failed to index archive" );

	assert_eq!( source.len(), 3 );
	match source.read( "com/example/Foo.class" ) {
		Ok( Some( bytes )) if *bytes == *empty_class( "com.example.Foo" ) => {}
		other => panic!( "Expected the class bytes, found: {:?}", other ),
	}
	// Leading "./" components are normalised away.
	assert!( matches!( source.read( "com/example/Bar.class" ), Ok( Some( _ ))));
	assert!( matches!( source.read( "com/example/" ), Ok( None )));

}

#[test]
fn archive_source_gzip_is_detected() {

	let source = ArchiveSource::from_bytes( "sample.tar.gz", &gzip( &sample_tar() )).expect( "Failed to index archive" );

	assert!( matches!( source.read( "com/example/Foo.class" ), Ok( Some( _ ))));
	match source.origin().manifest() {
		Some( manifest ) if manifest.main_attribute( "Specification-Title" ) == Some( "archive" ) => {}
		other => panic!( "Expected the archive manifest, found: {:#?}", other ),
	}

}

#[test]
fn archive_source_rejects_traversal_entries() {

	let payload = b"evil".to_vec();
	let mut header = file_header( payload.len() );
	let name = b"../evil.class" ;
	header.as_old_mut().name[..name.len()].copy_from_slice( name );
	header.set_cksum();

	let mut builder = Builder::new( Vec::new() );
	builder.append( &header, payload.as_slice() ).unwrap();
	let data = builder.into_inner().unwrap();

	match ArchiveSource::from_bytes( "evil.tar", &data ) {
		Err( SourceError::InvalidPath( path )) if path.contains( "evil.class" ) => {}
		other => panic!( "Expected Err( InvalidPath ), found: {:?}", other ),
	}

}

#[test]
fn archive_source_added_by_path() {

	let dir = tempfile::tempdir().expect( "Failed to create temp dir" );
	let path = dir.path().join( "classes.tar.gz" );
	std::fs::write( &path, gzip( &sample_tar() )).unwrap();

	let registry = SourceRegistry::new();
	registry.add_path( &path ).expect( "Failed to add archive" );

	match registry.resolve( "com/example/Foo.class" ) {
		Some( resource ) if resource.origin().location().ends_with( "classes.tar.gz" ) => {}
		other => panic!( "Expected a resource from the archive, found: {:#?}", other ),
	}

}
