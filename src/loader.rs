//! The identity-caching loader that turns unit names into live units.
//!
//! Activation of a name runs resolution, the exclusion filter, the LOAD phase
//! of the [`ClassTransformer`], definition and package registration, in that
//! order, at most once per name. A short-lived map lock hands out one slot per
//! name and the slot's own mutex serialises activation of that name, so
//! unrelated names proceed in parallel.

use std::collections::HashMap ;
use std::path::Path ;
use std::sync::Arc ;
use std::sync::atomic::{ AtomicU8, Ordering };
use parking_lot::Mutex ;
use thiserror::Error ;

use crate::{ ClassTransformer, Origin, PipelineError, Resource, ResourceSource, SourceError, SourceRegistry, TransformOutcome, TransformPhase, UnitName };

mod definer ;
mod filter ;
mod package ;
mod parent ;

pub use definer::{ UnitDefiner, VerifyingDefiner, DefineError };
pub use filter::{ TransformationFilter, BUILTIN_EXCLUSIONS };
pub use package::{ Package, PackageRegistry, PackageError };
pub use parent::{ ParentLoader, EmptyParent, SourceParent };



/// Who defined a unit.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum Provider {
	/// The loader itself, after transformation.
	Loader,
	/// The inherited provider.
	Parent,
}

/// A live unit.
#[derive( Debug )]
pub struct LoadedUnit {
	pub(crate) name: UnitName,
	pub(crate) bytes: Arc<[u8]>,
	pub(crate) origin: Option<Origin>,
	pub(crate) package: Option<Arc<Package>>,
	pub(crate) provider: Provider,
}

impl LoadedUnit {
	#[inline] pub fn name( &self ) -> &UnitName { &self.name }
	/// The bytes the unit was defined from.
	#[inline] pub fn bytes( &self ) -> &[u8] { &self.bytes }
	#[inline] pub fn origin( &self ) -> Option<&Origin> { self.origin.as_ref() }
	#[inline] pub fn package( &self ) -> Option<&Arc<Package>> { self.package.as_ref() }
	#[inline] pub fn provider( &self ) -> Provider { self.provider }
}

/// Lifecycle of a name inside one loader.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum UnitState {
	Unresolved,
	Resolving,
	Transforming,
	Active,
	/// The loader's own sources did not have the unit. Only sources added
	/// since are searched on later requests.
	NotFound,
}

impl UnitState {
	const fn from_u8( value: u8 ) -> Self {
		match value {
			1 => Self::Resolving,
			2 => Self::Transforming,
			3 => Self::Active,
			4 => Self::NotFound,
			_ => Self::Unresolved,
		}
	}
	const fn as_u8( self ) -> u8 {
		match self {
			Self::Unresolved => 0,
			Self::Resolving => 1,
			Self::Transforming => 2,
			Self::Active => 3,
			Self::NotFound => 4,
		}
	}
}

#[derive( Debug, Error )]
pub enum LoadError {
	/// Neither the loader nor its parent has the unit.
	#[error( "Unit not found: {0}" )] NotFound( UnitName ),
	#[error( "Failed to transform '{name}': {source}" )]
	Transform { name: UnitName, #[source] source: PipelineError },
	#[error( "Failed to activate '{name}': {source}" )]
	Activation { name: UnitName, #[source] source: DefineError },
}

impl LoadError {
	/// Whether the error is a plain miss a caller may recover from by asking elsewhere.
	#[inline] pub fn is_not_found( &self ) -> bool { matches!( self, Self::NotFound( _ ))}
	pub fn name( &self ) -> &UnitName {
		match self {
			Self::NotFound( name ) | Self::Transform { name, .. } | Self::Activation { name, .. } => name,
		}
	}
}

enum Slot {
	Unresolved,
	Active( Arc<LoadedUnit> ),
	/// The number of sources already searched.
	NotFound( usize ),
}

struct UnitSlot {
	gate: Mutex<Slot>,
	state: AtomicU8,
}

impl UnitSlot {
	fn new() -> Self { Self { gate: Mutex::new( Slot::Unresolved ), state: AtomicU8::new( UnitState::Unresolved.as_u8() )}}
	fn set( &self, state: UnitState ) { self.state.store( state.as_u8(), Ordering::Release ); }
	fn get( &self ) -> UnitState { UnitState::from_u8( self.state.load( Ordering::Acquire ))}
}

/// Loads units from its sources through a [`ClassTransformer`].
pub struct UnitLoader {
	sources: SourceRegistry,
	transformer: Arc<ClassTransformer>,
	parent: Arc<dyn ParentLoader>,
	definer: Arc<dyn UnitDefiner>,
	filter: TransformationFilter,
	packages: PackageRegistry,
	slots: Mutex<HashMap<UnitName, Arc<UnitSlot>>>,
}

impl std::fmt::Debug for UnitLoader {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "UnitLoader" )
			.field( "sources", &self.sources )
			.field( "transformer", &self.transformer )
			.field( "parent", &self.parent )
			.field( "filter", &self.filter )
			.field( "units", &self.slots.lock().len() )
			.finish_non_exhaustive()
	}
}

impl UnitLoader {

	/// A loader with no sources, an [`EmptyParent`] and a [`VerifyingDefiner`].
	pub fn new( transformer: Arc<ClassTransformer> ) -> Self {
		Self {
			sources: SourceRegistry::new(),
			transformer,
			parent: Arc::new( EmptyParent ),
			definer: Arc::new( VerifyingDefiner ),
			filter: TransformationFilter::new(),
			packages: PackageRegistry::new(),
			slots: Mutex::new( HashMap::new() ),
		}
	}

	pub fn with_parent( mut self, parent: Arc<dyn ParentLoader> ) -> Self { self.parent = parent ; self }

	pub fn with_definer( mut self, definer: Arc<dyn UnitDefiner> ) -> Self { self.definer = definer ; self }

	#[inline] pub fn transformer( &self ) -> &Arc<ClassTransformer> { &self.transformer }
	#[inline] pub fn sources( &self ) -> &SourceRegistry { &self.sources }
	#[inline] pub fn packages( &self ) -> &PackageRegistry { &self.packages }
	#[inline] pub fn filter( &self ) -> &TransformationFilter { &self.filter }
	#[inline] pub fn parent( &self ) -> &Arc<dyn ParentLoader> { &self.parent }

	/// Appends a source with the lowest precedence so far.
	pub fn add_source( &self, source: Arc<dyn ResourceSource> ) { self.sources.add( source ); }

	/// # Errors
	/// See [`SourceRegistry::add_path`].
	pub fn add_path( &self, path: impl AsRef<Path> ) -> Result<(), SourceError> { self.sources.add_path( path )}

	/// Leaves units accepted by `predicate` to this loader, AND-combined with the
	/// built-in exclusions and earlier predicates. Rejected units go to the parent.
	pub fn add_exclusion_filter( &self, predicate: impl Fn( &UnitName ) -> bool + Send + Sync + 'static ) {
		self.filter.add_predicate( Arc::new( predicate ));
	}

	/// Leaves every unit under `prefix` to the parent.
	pub fn exclude_prefix( &self, prefix: impl Into<String> ) { self.filter.exclude_prefix( prefix ); }

	/// Activates `name`, falling back to the parent when this loader does not
	/// handle or cannot find it. Repeated calls return the same unit.
	///
	/// # Errors
	/// [`LoadError::NotFound`] if nobody has the unit, otherwise the failure of
	/// transformation or definition.
	pub fn activate( &self, name: &UnitName ) -> Result<Arc<LoadedUnit>, LoadError> {
		tracing::trace!( unit = %name, "Attempting to load unit" );
		self.load( name, true )
	}

	/// Like [`activate`]( Self::activate ) but never asks the parent.
	///
	/// # Errors
	/// As [`activate`]( Self::activate ).
	pub fn find_unit( &self, name: &UnitName ) -> Result<Arc<LoadedUnit>, LoadError> {
		tracing::trace!( unit = %name, "Finding unit" );
		self.load( name, false )
	}

	/// Whether this loader has defined `name`.
	pub fn is_active( &self, name: &UnitName ) -> bool { self.state( name ) == UnitState::Active }

	pub fn state( &self, name: &UnitName ) -> UnitState {
		self.slots.lock().get( name ).map_or( UnitState::Unresolved, | slot | slot.get() )
	}

	/// The untransformed bytes of `name`.
	///
	/// Outside LOAD the parent's resources are consulted when the loader's own
	/// sources miss.
	pub fn unit_raw_bytes( &self, name: &UnitName, phase: TransformPhase ) -> Option<Resource> {
		let path = name.resource_path();
		self.sources.resolve( &path ).or_else(|| match phase {
			TransformPhase::Load => None,
			TransformPhase::Weave => self.parent.resource( &path ),
		})
	}

	/// A resource from this loader's sources, then the parent's.
	pub fn resource( &self, path: &str ) -> Option<Resource> {
		self.sources.resolve( path ).or_else(|| self.parent.resource( path ))
	}

	fn slot( &self, name: &UnitName ) -> Arc<UnitSlot> {
		Arc::clone( self.slots.lock().entry( name.clone() ).or_insert_with(|| Arc::new( UnitSlot::new() )))
	}

	fn delegate( &self, name: &UnitName, use_parent: bool ) -> Result<Arc<LoadedUnit>, LoadError> {
		if !use_parent { return Err( LoadError::NotFound( name.clone() )) }
		tracing::trace!( unit = %name, "Attempting to load parent unit" );
		match self.parent.load_unit( name )? {
			Some( unit ) => {
				tracing::trace!( unit = %name, "Loaded parent unit" );
				Ok( unit )
			},
			None => {
				tracing::trace!( unit = %name, "Unable to locate parent unit" );
				Err( LoadError::NotFound( name.clone() ))
			},
		}
	}

	fn load( &self, name: &UnitName, use_parent: bool ) -> Result<Arc<LoadedUnit>, LoadError> {

		let slot = self.slot( name );
		let mut gate = slot.gate.lock();

		let searched = match &*gate {
			Slot::Active( unit ) => return Ok( Arc::clone( unit )),
			Slot::NotFound( searched ) if *searched >= self.sources.len() => return self.delegate( name, use_parent ),
			Slot::NotFound( searched ) => *searched,
			Slot::Unresolved => 0,
		};

		if !self.filter.permits( name ) {
			tracing::trace!( unit = %name, "Skipping transformer excluded unit" );
			return self.delegate( name, use_parent );
		}

		slot.set( UnitState::Resolving );
		let ( resource, searched ) = self.sources.resolve_from( searched, &name.resource_path() );
		let Some( resource ) = resource else {
			tracing::trace!( unit = %name, "Unable to locate unit" );
			*gate = Slot::NotFound( searched );
			slot.set( UnitState::NotFound );
			return self.delegate( name, use_parent );
		};

		slot.set( UnitState::Transforming );
		match self.define( name, resource ) {
			Ok( unit ) => {
				tracing::trace!( unit = %name, "Loaded transformed unit" );
				*gate = Slot::Active( Arc::clone( &unit ));
				slot.set( UnitState::Active );
				Ok( unit )
			},
			Err( err ) => {
				*gate = Slot::Unresolved ;
				slot.set( UnitState::Unresolved );
				Err( err )
			},
		}

	}

	fn define( &self, name: &UnitName, resource: Resource ) -> Result<Arc<LoadedUnit>, LoadError> {

		let ( raw, origin ) = resource.into_parts();
		let bytes: Arc<[u8]> = match self.transformer.transform_bytes( name, &raw, TransformPhase::Load ) {
			Ok( TransformOutcome::Untouched ) => raw,
			Ok( TransformOutcome::Rewritten( bytes )) => bytes.into(),
			Err( source ) => return Err( LoadError::Transform { name: name.clone(), source }),
		};

		self.definer.define( name, &bytes )
			.map_err(| source | LoadError::Activation { name: name.clone(), source })?;

		let package = name.package().map(| package | self.package( package, &origin ));

		Ok( Arc::new( LoadedUnit { name: name.clone(), bytes, origin: Some( origin ), package, provider: Provider::Loader }))

	}

	fn package( &self, package: &str, origin: &Origin ) -> Arc<Package> {
		let attributes = origin.manifest()
			.map(| manifest | manifest.package_attributes( package ))
			.unwrap_or_default();
		match self.packages.define( package, attributes ) {
			Ok( package ) => package,
			Err( PackageError::Conflict { existing, .. }) => {
				tracing::warn!( package = existing.name(), location = origin.location(), "Package already defined with different attributes, keeping the first definition" );
				existing
			},
		}
	}

}

impl ParentLoader for UnitLoader {
	fn load_unit( &self, name: &UnitName ) -> Result<Option<Arc<LoadedUnit>>, LoadError> {
		match self.activate( name ) {
			Ok( unit ) => Ok( Some( unit )),
			Err( LoadError::NotFound( _ )) => Ok( None ),
			Err( err ) => Err( err ),
		}
	}
	fn resource( &self, path: &str ) -> Option<Resource> { UnitLoader::resource( self, path )}
}
