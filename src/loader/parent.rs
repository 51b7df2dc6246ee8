use std::collections::HashMap ;
use std::path::Path ;
use std::sync::Arc ;
use parking_lot::Mutex ;

use crate::{ Resource, SourceError, SourceRegistry, UnitName };
use super::{ LoadError, LoadedUnit, Provider, UnitDefiner, VerifyingDefiner };



/// The provider a loader falls back to for units it does not define itself.
pub trait ParentLoader: Send + Sync + std::fmt::Debug {

	/// The parent's definition of `name`, if it has one.
	///
	/// # Errors
	/// Fails when the parent has the unit but cannot make it live.
	fn load_unit( &self, name: &UnitName ) -> Result<Option<Arc<LoadedUnit>>, LoadError> ;

	/// The parent's bytes for a resource path such as `a/b/C.class`.
	fn resource( &self, path: &str ) -> Option<Resource> ;

}

/// A parent that knows nothing.
#[derive( Debug, Default, Clone, Copy )]
pub struct EmptyParent ;

impl ParentLoader for EmptyParent {
	fn load_unit( &self, _name: &UnitName ) -> Result<Option<Arc<LoadedUnit>>, LoadError> { Ok( None ) }
	fn resource( &self, _path: &str ) -> Option<Resource> { None }
}

/// A parent backed by its own sources, defining units as they are without
/// running any transformation.
#[derive( Debug )]
pub struct SourceParent {
	sources: SourceRegistry,
	definer: Arc<dyn UnitDefiner>,
	defined: Mutex<HashMap<UnitName, Arc<LoadedUnit>>>,
}

impl Default for SourceParent {
	fn default() -> Self { Self::new( Arc::new( VerifyingDefiner )) }
}

impl SourceParent {

	pub fn new( definer: Arc<dyn UnitDefiner> ) -> Self {
		Self { sources: SourceRegistry::new(), definer, defined: Mutex::new( HashMap::new() )}
	}

	#[inline] pub fn sources( &self ) -> &SourceRegistry { &self.sources }

	/// # Errors
	/// See [`SourceRegistry::add_path`].
	pub fn add_path( &self, path: impl AsRef<Path> ) -> Result<(), SourceError> { self.sources.add_path( path )}

}

impl ParentLoader for SourceParent {

	fn load_unit( &self, name: &UnitName ) -> Result<Option<Arc<LoadedUnit>>, LoadError> {
		let mut defined = self.defined.lock();
		if let Some( unit ) = defined.get( name ) { return Ok( Some( Arc::clone( unit ))) }

		let Some( resource ) = self.sources.resolve( &name.resource_path() ) else { return Ok( None ) };
		let ( bytes, origin ) = resource.into_parts();
		self.definer.define( name, &bytes )
			.map_err(| source | LoadError::Activation { name: name.clone(), source })?;
		tracing::trace!( unit = %name, "Defined parent unit" );
		let unit = Arc::new( LoadedUnit {
			name: name.clone(),
			bytes,
			origin: Some( origin ),
			package: None,
			provider: Provider::Parent,
		});
		defined.insert( name.clone(), Arc::clone( &unit ));
		Ok( Some( unit ))
	}

	fn resource( &self, path: &str ) -> Option<Resource> { self.sources.resolve( path )}

}
