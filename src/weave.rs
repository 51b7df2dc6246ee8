//! Adapter between the pipeline and an external weaving engine.
//!
//! The engine itself (structural code injection, synthetic class registries) is
//! not part of this crate. It is consumed through [`WeaveEngine`], created by a
//! [`WeaveEngineFactory`] offered to the [`WeavingService`] during bootstrap.

use std::sync::{ Arc, OnceLock };
use parking_lot::Mutex ;
use thiserror::Error ;

use crate::{ BoxError, ClassFileError, ClassNode, PipelineError, TransformError, TransformPhase, TransformationService, UnitName };



/// The capability set the pipeline needs from a weaving engine.
pub trait WeaveEngine: Send + Sync {

	/// Whether the engine generates `name` from scratch.
	fn is_synthetic( &self, name: &UnitName ) -> bool ;

	/// Fills `node` with the generated class. Returns whether anything was generated.
	///
	/// # Errors
	/// Engine defined.
	fn generate( &self, name: &UnitName, node: &mut ClassNode ) -> Result<bool, BoxError> ;

	/// Weaves into `node`. Returns whether the node changed.
	///
	/// # Errors
	/// Engine defined.
	fn transform( &self, name: &UnitName, node: &mut ClassNode ) -> Result<bool, BoxError> ;

}

/// Creates the engine once service setup is finalised.
pub trait WeaveEngineFactory: Send + Sync {

	/// # Errors
	/// Any error aborts bootstrap.
	fn create( &self ) -> Result<Box<dyn WeaveEngine>, BoxError> ;

}

#[derive( Debug, Error )]
pub enum WeaveError {
	#[error( "Weave engine factory is not available" )] FactoryMissing,
	#[error( "Weave engine has not been created yet" )] NotReady,
	#[error( "Class not found: {0}" )] ClassNotFound( UnitName ),
	#[error( "Failed to parse '{name}': {source}" )]
	Parse { name: UnitName, #[source] source: ClassFileError },
	#[error( "Weave engine failed: {0}" )] Engine( BoxError ),
	#[error( "WEAVE phase failed: {0}" )] Transform( #[from] PipelineError ),
}

/// Runs the weaving engine over every unit during LOAD.
#[derive( Default )]
pub struct WeavingService {
	factory: Mutex<Option<Arc<dyn WeaveEngineFactory>>>,
	engine: OnceLock<Box<dyn WeaveEngine>>,
}

impl std::fmt::Debug for WeavingService {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "WeavingService" )
			.field( "factory", &self.factory.lock().as_ref().map(| _ | "<factory>" ))
			.field( "ready", &self.is_ready() )
			.finish_non_exhaustive()
	}
}

impl WeavingService {

	pub const NAME: &'static str = "weaving" ;
	pub const LOAD_PRIORITY: i32 = 50 ;

	pub fn new() -> Self { Self::default() }

	/// Supplies the factory used at setup, replacing any earlier one.
	pub fn offer( &self, factory: Arc<dyn WeaveEngineFactory> ) { *self.factory.lock() = Some( factory ); }

	#[inline] pub fn is_ready( &self ) -> bool { self.engine.get().is_some() }

	fn engine( &self ) -> Result<&dyn WeaveEngine, WeaveError> {
		self.engine.get().map(| engine | &**engine ).ok_or( WeaveError::NotReady )
	}

	/// Creates the engine from the offered factory. Does nothing if it already exists.
	///
	/// # Errors
	/// Fails without a factory or when the factory fails.
	pub fn prepare( &self ) -> Result<(), WeaveError> {
		if self.is_ready() { return Ok(()) }
		let factory = self.factory.lock().clone().ok_or( WeaveError::FactoryMissing )?;
		let engine = factory.create().map_err( WeaveError::Engine )?;
		let _ = self.engine.set( engine );
		tracing::debug!( "Created weave engine" );
		Ok(())
	}

	/// The tree the weaving engine works on for `name`.
	///
	/// Non-empty `bytes` are parsed. Empty bytes stand for a class that does not
	/// exist; it is generated if the engine declares it synthetic.
	///
	/// # Errors
	/// [`WeaveError::ClassNotFound`] when empty bytes name a non-synthetic class.
	pub fn class_node( &self, name: &UnitName, bytes: &[u8] ) -> Result<ClassNode, WeaveError> {
		if !bytes.is_empty() {
			return ClassNode::parse( bytes ).map_err(| source | WeaveError::Parse { name: name.clone(), source });
		}
		let engine = self.engine()?;
		if engine.is_synthetic( name ) {
			let mut node = ClassNode::synthesize( name );
			if engine.generate( name, &mut node ).map_err( WeaveError::Engine )? { return Ok( node ) }
		}
		Err( WeaveError::ClassNotFound( name.clone() ))
	}

}

impl TransformationService for WeavingService {

	fn name( &self ) -> &str { Self::NAME }

	fn priority( &self, phase: TransformPhase ) -> i32 {
		match phase {
			TransformPhase::Load => Self::LOAD_PRIORITY,
			TransformPhase::Weave => -1,
		}
	}

	fn should_apply( &self, _name: &UnitName, _node: &ClassNode ) -> bool { true }

	fn apply( &self, name: &UnitName, node: &ClassNode, _phase: TransformPhase ) -> Result<Option<ClassNode>, TransformError> {
		let engine = self.engine().map_err( TransformError::fatal )?;
		let mut woven = node.clone();
		let changed = match engine.is_synthetic( name ) {
			true => engine.generate( name, &mut woven ),
			false => engine.transform( name, &mut woven ),
		}.map_err( TransformError::Recoverable )?;
		Ok( changed.then_some( woven ))
	}

	fn on_finalize_setup( &self ) -> Result<(), BoxError> {
		self.prepare().map_err( BoxError::from )
	}

}
