//! Ordered providers of raw class bytes.

use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use parking_lot::RwLock ;
use thiserror::Error ;

mod archive ;
mod directory ;
mod manifest ;
mod memory ;

pub use archive::ArchiveSource ;
pub use directory::DirectorySource ;
pub use manifest::{ Manifest, ManifestError, PackageAttributes };
pub use memory::MemorySource ;



/// Path of the manifest inside a source.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF" ;

/// Where a resource was found.
#[derive( Debug, Clone )]
pub struct Origin {
	location: Arc<str>,
	manifest: Option<Arc<Manifest>>,
}

impl Origin {
	pub fn new( location: impl Into<Arc<str>>, manifest: Option<Manifest> ) -> Self {
		Self { location: location.into(), manifest: manifest.map( Arc::new )}
	}
	#[inline] pub fn location( &self ) -> &str { &self.location }
	#[inline] pub fn manifest( &self ) -> Option<&Manifest> { self.manifest.as_deref() }
}

/// Raw bytes together with the source they came from.
#[derive( Debug, Clone )]
pub struct Resource {
	bytes: Arc<[u8]>,
	origin: Origin,
}

impl Resource {
	pub fn new( bytes: Arc<[u8]>, origin: Origin ) -> Self { Self { bytes, origin }}
	#[inline] pub fn bytes( &self ) -> &Arc<[u8]> { &self.bytes }
	#[inline] pub fn origin( &self ) -> &Origin { &self.origin }
	pub fn into_parts( self ) -> ( Arc<[u8]>, Origin ) {( self.bytes, self.origin )}
}

/// Errors raised by a source while opening or reading.
#[derive( Debug, Error )]
pub enum SourceError {
	#[error( "Failed to read '{path}' from {location}: {source}" )]
	Io { location: String, path: String, #[source] source: std::io::Error },
	#[error( "Failed to open source '{}': {source}", path.display() )]
	Open { path: PathBuf, #[source] source: std::io::Error },
	#[error( "Archive '{}' has more than {limit} entries", path.display() )]
	TooManyEntries { path: PathBuf, limit: usize },
	#[error( "Invalid resource path: {0}" )] InvalidPath( String ),
}

/// A root that can provide bytes for resource paths such as `a/b/C.class`.
pub trait ResourceSource: Send + Sync + std::fmt::Debug {

	/// Identity of the source, attached to every resource it provides.
	fn origin( &self ) -> &Origin ;

	/// Reads the resource at `path`, `Ok( None )` if the source does not have it.
	///
	/// # Errors
	/// Fails when the source has trouble reading, not when the path is absent.
	fn read( &self, path: &str ) -> Result<Option<Arc<[u8]>>, SourceError> ;

}

/// The append-only, ordered set of sources a loader resolves against.
///
/// Earlier sources take precedence. Resolution works on a snapshot, so sources
/// may be appended while other threads are resolving.
#[derive( Default )]
pub struct SourceRegistry {
	sources: RwLock<Arc<[Arc<dyn ResourceSource>]>>,
}

impl std::fmt::Debug for SourceRegistry {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "SourceRegistry" )
			.field( "sources", &self.sources.read().iter().map(| source | source.origin().location().to_string() ).collect::<Vec<_>>() )
			.finish()
	}
}

impl SourceRegistry {

	pub fn new() -> Self { Self::default() }

	/// Appends a source with the lowest precedence so far.
	pub fn add( &self, source: Arc<dyn ResourceSource> ) {
		tracing::debug!( location = source.origin().location(), "Adding resource source" );
		let mut sources = self.sources.write();
		*sources = sources.iter().cloned().chain( std::iter::once( source )).collect();
	}

	/// Opens `path` as a [`DirectorySource`] or an [`ArchiveSource`] and appends it.
	///
	/// # Errors
	/// Fails if the path does not exist or the archive cannot be read.
	pub fn add_path( &self, path: impl AsRef<Path> ) -> Result<(), SourceError> {
		let source = open_path( path.as_ref() )?;
		self.add( source );
		Ok(())
	}

	/// The sources in precedence order.
	pub fn snapshot( &self ) -> Arc<[Arc<dyn ResourceSource>]> { Arc::clone( &self.sources.read() )}

	#[inline] pub fn len( &self ) -> usize { self.sources.read().len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.sources.read().is_empty() }

	/// The first source's bytes for `path`.
	///
	/// Sources that fail to read are logged and skipped.
	pub fn resolve( &self, path: &str ) -> Option<Resource> { self.resolve_from( 0, path ).0 }

	/// Like [`resolve`]( Self::resolve ) but skips the first `skip` sources.
	/// Also returns how many sources were registered at the time of the lookup.
	pub fn resolve_from( &self, skip: usize, path: &str ) -> ( Option<Resource>, usize ) {
		let sources = self.snapshot();
		let found = sources.iter().skip( skip ).find_map(| source | match source.read( path ) {
			Ok( Some( bytes )) => Some( Resource::new( bytes, source.origin().clone() )),
			Ok( None ) => None,
			Err( err ) => {
				tracing::warn!( location = source.origin().location(), path, error = %err, "Skipping unreadable source" );
				None
			},
		});
		( found, sources.len() )
	}

}

pub(crate) fn open_path( path: &Path ) -> Result<Arc<dyn ResourceSource>, SourceError> {
	let metadata = std::fs::metadata( path ).map_err(| source | SourceError::Open { path: path.to_path_buf(), source })?;
	Ok( match metadata.is_dir() {
		true => Arc::new( DirectorySource::new( path )),
		false => Arc::new( ArchiveSource::open( path )?),
	})
}

/// Validates a resource path relative to a source root.
pub(crate) fn check_relative( path: &str ) -> Result<(), SourceError> {
	let invalid = path.is_empty()
		|| path.starts_with( '/' )
		|| path.contains( '\\' )
		|| path.split( '/' ).any(| segment | segment == ".." );
	match invalid {
		true => Err( SourceError::InvalidPath( path.to_string() )),
		false => Ok(()),
	}
}

/// Parses a manifest found in a source, treating a malformed one as absent.
pub(crate) fn parse_manifest( location: &str, bytes: &[u8] ) -> Option<Manifest> {
	let text = match std::str::from_utf8( bytes ) {
		Ok( text ) => text,
		Err( _ ) => {
			tracing::warn!( location, "Ignoring manifest that is not UTF-8" );
			return None ;
		},
	};
	match Manifest::parse( text ) {
		Ok( manifest ) => Some( manifest ),
		Err( err ) => {
			tracing::warn!( location, error = %err, "Ignoring malformed manifest" );
			None
		},
	}
}
