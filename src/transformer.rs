use std::panic::{ catch_unwind, AssertUnwindSafe };
use std::sync::Arc ;
use std::sync::atomic::{ AtomicBool, Ordering };
use itertools::Itertools ;
use parking_lot::RwLock ;
use pipe_trait::Pipe ;
use thiserror::Error ;

use crate::{ BoxError, ClassFileError, ClassNode, TransformError, TransformPhase, TransformationService, UnitName };



/// A predicate over unit names. `true` lets the unit through.
pub type UnitFilter = Arc<dyn Fn( &UnitName ) -> bool + Send + Sync> ;

type ServiceList = Arc<[Arc<dyn TransformationService>]> ;

/// Errors raised while changing the set of registered services.
#[derive( Debug, Error )]
pub enum RegistryError {
	/// The registry was sealed at the end of bootstrap.
	#[error( "Cannot register service '{0}': the transformer is sealed" )] Sealed( String ),
	/// A service failed its one-time setup hook.
	#[error( "Setup of service '{service}' failed: {source}" )]
	Setup { service: String, #[source] source: BoxError },
}

/// Errors that abort the pipeline for one unit.
#[derive( Debug, Error )]
pub enum PipelineError {
	#[error( "Failed to parse '{name}': {source}" )]
	Parse { name: UnitName, #[source] source: ClassFileError },
	#[error( "Service '{service}' reported a violation while transforming '{name}': {source}" )]
	Violation { name: UnitName, service: String, #[source] source: BoxError },
	#[error( "Failed to serialise '{name}': {source}" )]
	Serialize { name: UnitName, #[source] source: ClassFileError },
}

/// Result of running the pipeline over a unit.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum TransformOutcome {
	/// No service changed the unit. The caller keeps its input bytes.
	Untouched,
	/// The serialised result of the last applied service.
	Rewritten( Vec<u8> ),
}

impl TransformOutcome {
	/// The bytes to use, falling back to `input` when untouched.
	pub fn into_bytes( self, input: &[u8] ) -> Vec<u8> {
		match self {
			Self::Untouched => input.to_vec(),
			Self::Rewritten( bytes ) => bytes,
		}
	}
	#[inline] pub fn is_untouched( &self ) -> bool { matches!( self, Self::Untouched )}
}

/// The ordered registry of [`TransformationService`]s and the pipeline that runs them.
///
/// For every phase the services with a non-negative priority are sorted once
/// (stable, so ties keep registration order) and cached until the next
/// registration. Registration is possible until [`seal`]( Self::seal ).
#[derive( Default )]
pub struct ClassTransformer {
	services: RwLock<Vec<Arc<dyn TransformationService>>>,
	ordered: [RwLock<Option<ServiceList>>; 2],
	filters: RwLock<Vec<UnitFilter>>,
	sealed: AtomicBool,
}

impl std::fmt::Debug for ClassTransformer {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ClassTransformer" )
			.field( "services", &self.services.read().iter().map(| service | service.name().to_string() ).collect::<Vec<_>>() )
			.field( "filters", &self.filters.read().len() )
			.field( "sealed", &self.is_sealed() )
			.finish_non_exhaustive()
	}
}

impl ClassTransformer {

	pub fn new() -> Self { Self::default() }

	/// Adds a service and invalidates the cached orderings.
	///
	/// # Errors
	/// Fails once the transformer is sealed.
	pub fn register( &self, service: Arc<dyn TransformationService> ) -> Result<(), RegistryError> {
		let mut services = self.services.write();
		if self.is_sealed() { return Err( RegistryError::Sealed( service.name().to_string() )) }
		tracing::debug!( service = service.name(), "Registering transformation service" );
		services.push( service );
		self.ordered.iter().for_each(| cache | *cache.write() = None );
		Ok(())
	}

	/// Every registered service in registration order.
	pub fn services( &self ) -> Vec<Arc<dyn TransformationService>> { self.services.read().clone() }

	/// The first registered service called `name`.
	pub fn service( &self, name: &str ) -> Option<Arc<dyn TransformationService>> {
		self.services.read().iter().find(| service | service.name() == name ).cloned()
	}

	/// The services active in `phase`, lowest priority first.
	pub fn ordered_services( &self, phase: TransformPhase ) -> ServiceList {
		let cache = &self.ordered[phase.index()];
		if let Some( ordered ) = cache.read().as_ref() { return Arc::clone( ordered ) }

		// Holding the service list keeps a concurrent registration from clearing
		// the cache before the stale ordering is stored.
		let services = self.services.read();
		let ordered = services.iter()
			.filter(| service | service.priority( phase ) >= 0 )
			.cloned()
			.sorted_by_key(| service | service.priority( phase ))
			.collect::<ServiceList>();
		*cache.write() = Some( Arc::clone( &ordered ));
		ordered
	}

	/// Restricts the pipeline to units accepted by `filter` as well as every
	/// filter added before it.
	pub fn add_exclusion_filter( &self, filter: impl Fn( &UnitName ) -> bool + Send + Sync + 'static ) {
		self.filters.write().push( Arc::new( filter ));
	}

	/// Whether the exclusion filters let `name` through.
	pub fn permits( &self, name: &UnitName ) -> bool {
		self.filters.read().iter().all(| filter | filter( name ))
	}

	/// Runs every service's setup hook in registration order, then seals.
	///
	/// # Errors
	/// Stops at the first failing hook. The transformer stays unsealed in that case.
	pub fn finalize_setup( &self ) -> Result<(), RegistryError> {
		self.services().iter().try_for_each(| service | {
			tracing::debug!( service = service.name(), "Finalising service setup" );
			service.on_finalize_setup().map_err(| source | RegistryError::Setup { service: service.name().to_string(), source })
		})?;
		self.seal();
		Ok(())
	}

	/// Rejects any further registration.
	pub fn seal( &self ) {
		let _services = self.services.write();
		self.sealed.store( true, Ordering::Release );
	}

	#[inline] pub fn is_sealed( &self ) -> bool { self.sealed.load( Ordering::Acquire )}

	/// Runs the services active in `phase` over `input`.
	///
	/// Zero-length input stands for a unit that does not exist yet; the services
	/// see an empty class extending `java/lang/Object`.
	///
	/// # Errors
	/// Fails if the input cannot be parsed, if a service reports a violation, or if
	/// the final tree cannot be serialised. Recoverable service errors and panics
	/// are logged and skipped.
	pub fn transform_bytes( &self, name: &UnitName, input: &[u8], phase: TransformPhase ) -> Result<TransformOutcome, PipelineError> {

		if !self.permits( name ) {
			tracing::debug!( unit = %name, "Skipping resource excluded class" );
			return Ok( TransformOutcome::Untouched );
		}

		let services = self.ordered_services( phase );
		if services.is_empty() { return Ok( TransformOutcome::Untouched ) }

		let node = match input.is_empty() {
			true => ClassNode::synthesize( name ),
			false => ClassNode::parse( input ).map_err(| source | PipelineError::Parse { name: name.clone(), source })?,
		};

		match self.apply_services( name, node, phase, &services )? {
			None => Ok( TransformOutcome::Untouched ),
			Some( node ) => node.to_bytes()
				.map_err(| source | PipelineError::Serialize { name: name.clone(), source })?
				.pipe( TransformOutcome::Rewritten )
				.pipe( Ok ),
		}

	}

	/// Runs the services active in `phase` over an already parsed tree.
	///
	/// Returns `None` if no service replaced the tree.
	///
	/// # Errors
	/// Fails if a service reports a violation.
	pub fn transform_node( &self, name: &UnitName, node: ClassNode, phase: TransformPhase ) -> Result<Option<ClassNode>, PipelineError> {
		if !self.permits( name ) { return Ok( None ) }
		self.apply_services( name, node, phase, &self.ordered_services( phase ))
	}

	fn apply_services(
		&self,
		name: &UnitName,
		mut node: ClassNode,
		phase: TransformPhase,
		services: &[Arc<dyn TransformationService>],
	) -> Result<Option<ClassNode>, PipelineError> {

		let mut modified = false ;

		for service in services {
			let attempt = catch_unwind( AssertUnwindSafe(|| match service.should_apply( name, &node ) {
				true => service.apply( name, &node, phase ),
				false => Ok( None ),
			}));
			match attempt {
				Ok( Ok( Some( transformed ))) => {
					tracing::debug!( unit = %name, service = service.name(), %phase, "Applied transformation" );
					node = transformed ;
					modified = true ;
				},
				Ok( Ok( None )) => {},
				Ok( Err( TransformError::Recoverable( err ))) => {
					tracing::error!( unit = %name, service = service.name(), error = %err, "Failed to transform" );
				},
				Ok( Err( TransformError::Fatal( source ))) => {
					return Err( PipelineError::Violation { name: name.clone(), service: service.name().to_string(), source });
				},
				Err( payload ) => {
					tracing::error!( unit = %name, service = service.name(), panic = panic_message( payload.as_ref() ), "Transformation service panicked" );
				},
			}
		}

		Ok( match modified {
			true => Some( node ),
			false => None,
		})

	}

}

fn panic_message( payload: &( dyn std::any::Any + Send )) -> &str {
	payload.downcast_ref::<&'static str>().copied()
		.or_else(|| payload.downcast_ref::<String>().map( String::as_str ))
		.unwrap_or( "<non-string panic payload>" )
}
