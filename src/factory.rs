use std::collections::HashMap ;
use std::sync::Arc ;
use itertools::Itertools ;
use thiserror::Error ;

use crate::{ BoxError, TransformationService };



type Constructor = Box<dyn Fn() -> Result<Arc<dyn TransformationService>, BoxError> + Send + Sync> ;

/// Constructors of plugin-supplied services, keyed by the identifiers plugins
/// declare in their `transform_services` list.
#[derive( Default )]
pub struct ServiceFactories {
	constructors: HashMap<String, Constructor>,
}

impl std::fmt::Debug for ServiceFactories {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ServiceFactories" )
			.field( "ids", &self.constructors.keys().sorted().collect::<Vec<_>>() )
			.finish()
	}
}

#[derive( Debug, Error )]
pub enum FactoryError {
	#[error( "No service factory registered for '{0}'" )] Unknown( String ),
	#[error( "Failed to construct service '{id}': {source}" )]
	Construction { id: String, #[source] source: BoxError },
}

impl ServiceFactories {

	pub fn new() -> Self { Self::default() }

	/// Registers a fallible constructor, replacing any previous one for `id`.
	pub fn register(
		&mut self,
		id: impl Into<String>,
		constructor: impl Fn() -> Result<Arc<dyn TransformationService>, BoxError> + Send + Sync + 'static,
	) -> &mut Self {
		self.constructors.insert( id.into(), Box::new( constructor ));
		self
	}

	/// Registers a constructor that cannot fail.
	pub fn register_with<S, F>( &mut self, id: impl Into<String>, constructor: F ) -> &mut Self
	where
		S: TransformationService + 'static,
		F: Fn() -> S + Send + Sync + 'static,
	{
		self.register( id, move || Ok( Arc::new( constructor() ) as Arc<dyn TransformationService> ))
	}

	#[inline] pub fn contains( &self, id: &str ) -> bool { self.constructors.contains_key( id )}

	/// Builds a fresh instance of the service registered under `id`.
	///
	/// # Errors
	/// Fails if `id` is unknown or its constructor fails.
	pub fn create( &self, id: &str ) -> Result<Arc<dyn TransformationService>, FactoryError> {
		let constructor = self.constructors.get( id ).ok_or_else(|| FactoryError::Unknown( id.to_string() ))?;
		constructor().map_err(| source | FactoryError::Construction { id: id.to_string(), source })
	}

}
