use std::collections::HashMap ;
use std::io::Read ;
use std::path::{ Component, Path, PathBuf };
use std::sync::Arc ;
use flate2::read::GzDecoder ;
use tar::Archive ;

use super::{ Origin, ResourceSource, SourceError, MANIFEST_PATH, parse_manifest };



/// A tar archive, optionally gzip-compressed, indexed into memory when opened.
///
/// Only regular files are indexed. Entries with absolute or `..` paths are
/// rejected, as are archives with more than [`MAX_ENTRY_COUNT`]( Self::MAX_ENTRY_COUNT )
/// entries.
#[derive( Debug )]
pub struct ArchiveSource {
	origin: Origin,
	entries: HashMap<String, Arc<[u8]>>,
}

impl ArchiveSource {

	pub const MAX_ENTRY_COUNT: usize = 100_000 ;
	const GZIP_MAGIC: [u8; 2] = [ 0x1f, 0x8b ];

	/// Reads and indexes the archive at `path`.
	///
	/// # Errors
	/// Fails if the file cannot be read, is not a tar archive, holds an unsafe
	/// path or too many entries.
	pub fn open( path: impl AsRef<Path> ) -> Result<Self, SourceError> {
		let path = path.as_ref();
		let data = std::fs::read( path ).map_err(| source | SourceError::Open { path: path.to_path_buf(), source })?;
		Self::from_bytes( path.display().to_string(), &data )
	}

	/// Indexes an archive already held in memory.
	///
	/// # Errors
	/// Same as [`open`]( Self::open ), minus the file access.
	pub fn from_bytes( location: impl Into<Arc<str>>, data: &[u8] ) -> Result<Self, SourceError> {
		let location: Arc<str> = location.into();
		let entries = match data.starts_with( &Self::GZIP_MAGIC ) {
			true => index( &location, GzDecoder::new( data ))?,
			false => index( &location, data )?,
		};
		let manifest = entries.get( MANIFEST_PATH ).and_then(| bytes | parse_manifest( &location, bytes ));
		tracing::debug!( location = &*location, entries = entries.len(), "Indexed archive source" );
		Ok( Self { origin: Origin::new( location, manifest ), entries })
	}

	#[inline] pub fn len( &self ) -> usize { self.entries.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.entries.is_empty() }

}

impl ResourceSource for ArchiveSource {
	fn origin( &self ) -> &Origin { &self.origin }
	fn read( &self, path: &str ) -> Result<Option<Arc<[u8]>>, SourceError> {
		Ok( self.entries.get( path ).cloned() )
	}
}

fn index( location: &str, reader: impl Read ) -> Result<HashMap<String, Arc<[u8]>>, SourceError> {

	let io_error = | source: std::io::Error | SourceError::Io {
		location: location.to_string(),
		path: String::new(),
		source,
	};

	let mut archive = Archive::new( reader );
	let mut entries = HashMap::new();
	let mut count = 0usize ;

	for entry in archive.entries().map_err( io_error )? {
		let mut entry = entry.map_err( io_error )?;

		count = count.saturating_add( 1 );
		if count > ArchiveSource::MAX_ENTRY_COUNT {
			return Err( SourceError::TooManyEntries { path: PathBuf::from( location ), limit: ArchiveSource::MAX_ENTRY_COUNT });
		}

		if !entry.header().entry_type().is_file() { continue }

		let entry_path = entry.path().map_err( io_error )?.into_owned();
		let name = normalise( &entry_path ).ok_or_else(|| SourceError::InvalidPath( entry_path.display().to_string() ))?;

		let mut bytes = Vec::new();
		entry.read_to_end( &mut bytes ).map_err(| source | SourceError::Io {
			location: location.to_string(),
			path: name.clone(),
			source,
		})?;
		entries.insert( name, Arc::from( bytes ));
	}

	Ok( entries )

}

/// Joins the normal components with `/`, `None` for unsafe paths.
fn normalise( path: &Path ) -> Option<String> {
	let mut segments = Vec::new();
	for component in path.components() {
		match component {
			Component::Normal( segment ) => segments.push( segment.to_str()? ),
			Component::CurDir => {},
			Component::ParentDir | Component::RootDir | Component::Prefix( _ ) => return None,
		}
	}
	match segments.is_empty() {
		true => None,
		false => Some( segments.join( "/" )),
	}
}
