use std::sync::Arc ;

use crate::{ BoxError, ClassNode, TransformError, TransformPhase, TransformationService, UnitName };
use super::AccessRegistry ;



/// The LOAD phase service that applies an [`AccessRegistry`].
#[derive( Debug, Default, Clone )]
pub struct AccessPatcher {
	registry: Arc<AccessRegistry>,
}

impl AccessPatcher {

	pub const NAME: &'static str = "access-patcher" ;
	pub const LOAD_PRIORITY: i32 = 25 ;

	pub fn new( registry: Arc<AccessRegistry> ) -> Self { Self { registry }}

	#[inline] pub fn registry( &self ) -> &Arc<AccessRegistry> { &self.registry }

}

impl TransformationService for AccessPatcher {

	fn name( &self ) -> &str { Self::NAME }

	fn priority( &self, phase: TransformPhase ) -> i32 {
		match phase {
			TransformPhase::Load => Self::LOAD_PRIORITY,
			TransformPhase::Weave => -1,
		}
	}

	fn should_apply( &self, name: &UnitName, _node: &ClassNode ) -> bool {
		self.registry.contains( &name.internal_name() )
	}

	fn apply( &self, _name: &UnitName, node: &ClassNode, _phase: TransformPhase ) -> Result<Option<ClassNode>, TransformError> {
		let mut patched = node.clone();
		self.registry.apply_to( &mut patched ).map_err( TransformError::fatal )?;
		Ok( Some( patched ))
	}

	fn on_finalize_setup( &self ) -> Result<(), BoxError> {
		self.registry.lock();
		Ok(())
	}

}
