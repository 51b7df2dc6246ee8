use std::collections::HashMap ;
use std::collections::hash_map::Entry ;
use std::sync::Arc ;
use parking_lot::Mutex ;
use thiserror::Error ;

use crate::PackageAttributes ;



/// A package defined by a loader.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Package {
	name: String,
	attributes: PackageAttributes,
}

impl Package {
	#[inline] pub fn name( &self ) -> &str { &self.name }
	#[inline] pub fn attributes( &self ) -> &PackageAttributes { &self.attributes }
}

#[derive( Debug, Error )]
pub enum PackageError {
	/// The package already exists with different attributes.
	#[error( "Package '{}' is already defined with different attributes", existing.name )]
	Conflict { existing: Arc<Package>, requested: PackageAttributes },
}

/// Packages defined by one loader, each at most once.
#[derive( Debug, Default )]
pub struct PackageRegistry {
	packages: Mutex<HashMap<String, Arc<Package>>>,
}

impl PackageRegistry {

	pub fn new() -> Self { Self::default() }

	/// Defines `name` or returns the existing definition if the attributes agree.
	///
	/// # Errors
	/// Fails if the package exists with different attributes. The existing
	/// definition is left in place and carried in the error.
	pub fn define( &self, name: &str, attributes: PackageAttributes ) -> Result<Arc<Package>, PackageError> {
		match self.packages.lock().entry( name.to_string() ) {
			Entry::Occupied( entry ) if entry.get().attributes == attributes => Ok( Arc::clone( entry.get() )),
			Entry::Occupied( entry ) => Err( PackageError::Conflict { existing: Arc::clone( entry.get() ), requested: attributes }),
			Entry::Vacant( entry ) => {
				tracing::trace!( package = name, "Defining package" );
				Ok( Arc::clone( entry.insert( Arc::new( Package { name: name.to_string(), attributes }))))
			},
		}
	}

	pub fn get( &self, name: &str ) -> Option<Arc<Package>> { self.packages.lock().get( name ).cloned() }

	pub fn len( &self ) -> usize { self.packages.lock().len() }

	pub fn is_empty( &self ) -> bool { self.packages.lock().is_empty() }

}
