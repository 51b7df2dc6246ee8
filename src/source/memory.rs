use std::collections::HashMap ;
use std::sync::Arc ;
use parking_lot::RwLock ;

use super::{ Manifest, Origin, ResourceSource, SourceError };



/// Resources held in memory, keyed by path.
///
/// Entries can be added after the source has been registered.
#[derive( Debug )]
pub struct MemorySource {
	origin: Origin,
	entries: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemorySource {

	pub fn new( location: impl Into<Arc<str>> ) -> Self {
		Self { origin: Origin::new( location, None ), entries: RwLock::new( HashMap::new() )}
	}

	pub fn with_manifest( location: impl Into<Arc<str>>, manifest: Manifest ) -> Self {
		Self { origin: Origin::new( location, Some( manifest )), entries: RwLock::new( HashMap::new() )}
	}

	/// Stores `bytes` at `path`, replacing any previous entry.
	pub fn insert( &self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>> ) {
		self.entries.write().insert( path.into(), bytes.into() );
	}

	/// Chaining form of [`insert`]( Self::insert ).
	pub fn with( self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>> ) -> Self {
		self.insert( path, bytes );
		self
	}

}

impl ResourceSource for MemorySource {
	fn origin( &self ) -> &Origin { &self.origin }
	fn read( &self, path: &str ) -> Result<Option<Arc<[u8]>>, SourceError> {
		Ok( self.entries.read().get( path ).cloned() )
	}
}
