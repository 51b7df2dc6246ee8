use std::path::{ Path, PathBuf };
use std::sync::Arc ;

use super::{ Origin, ResourceSource, SourceError, MANIFEST_PATH, check_relative, parse_manifest };



/// Resources stored as files under a root directory.
#[derive( Debug )]
pub struct DirectorySource {
	root: PathBuf,
	origin: Origin,
}

impl DirectorySource {

	/// Uses `root` as a source. The manifest is read once, here.
	pub fn new( root: impl AsRef<Path> ) -> Self {
		let root = root.as_ref().to_path_buf();
		let location = root.display().to_string();
		let manifest = std::fs::read( root.join( MANIFEST_PATH ))
			.ok()
			.and_then(| bytes | parse_manifest( &location, &bytes ));
		Self { origin: Origin::new( location, manifest ), root }
	}

	#[inline] pub fn root( &self ) -> &Path { &self.root }

}

impl ResourceSource for DirectorySource {

	fn origin( &self ) -> &Origin { &self.origin }

	fn read( &self, path: &str ) -> Result<Option<Arc<[u8]>>, SourceError> {
		check_relative( path )?;
		let file = self.root.join( path );
		if !file.is_file() { return Ok( None ) }
		match std::fs::read( &file ) {
			Ok( bytes ) => Ok( Some( bytes.into() )),
			Err( err ) if err.kind() == std::io::ErrorKind::NotFound => Ok( None ),
			Err( source ) => Err( SourceError::Io {
				location: self.origin.location().to_string(),
				path: path.to_string(),
				source,
			}),
		}
	}

}
