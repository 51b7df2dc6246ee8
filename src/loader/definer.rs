use thiserror::Error ;

use crate::{ BoxError, ClassFileError, ClassNode, UnitName };



/// Turns final unit bytes into a live unit.
///
/// This is the last step of activation. An error here fails the activation of
/// that unit only.
pub trait UnitDefiner: Send + Sync + std::fmt::Debug {

	/// # Errors
	/// Fails when the bytes cannot be made live under `name`.
	fn define( &self, name: &UnitName, bytes: &[u8] ) -> Result<(), DefineError> ;

}

#[derive( Debug, Error )]
pub enum DefineError {
	#[error( "Malformed class file: {0}" )] Malformed( #[from] ClassFileError ),
	#[error( "Class file declares '{found}' instead of '{expected}'" )]
	NameMismatch { expected: String, found: String },
	#[error( "Rejected: {0}" )] Rejected( BoxError ),
}

/// Checks that the bytes parse and declare the requested class.
#[derive( Debug, Default, Clone, Copy )]
pub struct VerifyingDefiner ;

impl UnitDefiner for VerifyingDefiner {
	fn define( &self, name: &UnitName, bytes: &[u8] ) -> Result<(), DefineError> {
		let node = ClassNode::parse( bytes )?;
		let expected = name.internal_name();
		let found = node.name()?;
		match found == expected {
			true => Ok(()),
			false => Err( DefineError::NameMismatch { expected, found: found.to_string() }),
		}
	}
}
