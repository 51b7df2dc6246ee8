use thiserror::Error ;

use crate::{ ClassNode, TransformPhase, UnitName };



/// An error supplied by a service implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync> ;

/// Failure reported by [`TransformationService::apply`].
#[derive( Debug, Error )]
pub enum TransformError {
	/// The service could not transform this unit. The pipeline logs it and carries
	/// on with the tree as it was before the attempt.
	#[error( "{0}" )] Recoverable( BoxError ),
	/// An invariant the service depends on does not hold. The pipeline stops and
	/// the failure surfaces to whoever requested the unit.
	#[error( "{0}" )] Fatal( BoxError ),
}

impl TransformError {
	pub fn recoverable( error: impl Into<BoxError> ) -> Self { Self::Recoverable( error.into() )}
	pub fn fatal( error: impl Into<BoxError> ) -> Self { Self::Fatal( error.into() )}
	#[inline] pub fn is_fatal( &self ) -> bool { matches!( self, Self::Fatal( _ ))}
}

/// A pluggable stage of the transformation pipeline.
///
/// Services are registered with a [`ClassTransformer`]( crate::ClassTransformer ) and
/// ordered per phase by [`priority`]( Self::priority ): lower values run first and
/// negative values take the service out of that phase entirely. For every unit an
/// active service is first asked [`should_apply`]( Self::should_apply ) and then
/// [`apply`]( Self::apply ); returning `Ok( None )` means "nothing to change".
///
/// Implementations are shared between threads and called concurrently for
/// different units.
pub trait TransformationService: Send + Sync {

	/// A stable name used in logs.
	fn name( &self ) -> &str ;

	/// Ordering key for `phase`. Negative means inactive in that phase.
	fn priority( &self, phase: TransformPhase ) -> i32 ;

	fn should_apply( &self, name: &UnitName, node: &ClassNode ) -> bool ;

	/// Produces a replacement tree, or `None` to leave the unit as it is.
	///
	/// # Errors
	/// See [`TransformError`] for how each kind of failure is handled.
	fn apply( &self, name: &UnitName, node: &ClassNode, phase: TransformPhase ) -> Result<Option<ClassNode>, TransformError> ;

	/// Runs once after every service has been registered and before the first unit
	/// is loaded.
	///
	/// # Errors
	/// Any error aborts bootstrap.
	fn on_finalize_setup( &self ) -> Result<(), BoxError> { Ok(()) }

}
