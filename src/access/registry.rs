use std::collections::HashMap ;
use std::collections::hash_map::Entry ;
use std::io::BufRead ;
use std::path::Path ;
use std::sync::OnceLock ;
use itertools::Itertools ;
use nonempty_collections::NEMap ;
use parking_lot::Mutex ;
use thiserror::Error ;

use crate::{ ClassFileError, ClassNode };
use crate::utils::PartialSuccess ;
use super::rule::{ compile_line, AccessDefinition, AccessOperation, CompileError, Finality, MemberKey };



#[derive( Debug, Error )]
pub enum AccessError {
	/// Definitions can no longer be added.
	#[error( "Access registry is locked and cannot be modified" )] Locked,
	/// Definitions are queried before the registry was locked.
	#[error( "Access registry is not locked yet" )] NotLocked,
	#[error( "Failed to read access rules from {location}: {source}" )]
	Io { location: String, #[source] source: std::io::Error },
	#[error( "Couldn't locate target field '{field}' in '{class}'" )]
	MissingField { class: String, field: String },
	#[error( "Couldn't locate target method '{name}{descriptor}' in '{class}'" )]
	MissingMethod { class: String, name: String, descriptor: String },
	#[error( "Attempted to transform unregistered class '{0}'" )] Unregistered( String ),
	#[error( "Malformed class node: {0}" )] ClassFile( #[from] ClassFileError ),
}

/// The resolved operations for one class, at most one per member.
#[derive( Debug, Clone )]
pub struct ClassAccess {
	members: NEMap<MemberKey, AccessOperation>,
}

impl ClassAccess {

	pub fn get( &self, member: &MemberKey ) -> Option<&AccessOperation> { self.members.get( member )}

	#[inline] pub fn len( &self ) -> usize { self.members.len().get() }

	pub fn members( &self ) -> impl Iterator<Item = ( &MemberKey, &AccessOperation )> {
		self.members.iter()
	}

}

/// Collects access definitions, then resolves and freezes them once.
///
/// Until [`lock`]( Self::lock ) definitions are kept in registration order per
/// target class. Locking keeps one operation per member: the one with the higher
/// visibility, or the earlier one on a tie. Any member that had competing
/// definitions has its finality forced to [`Finality::Remove`].
#[derive( Debug, Default )]
pub struct AccessRegistry {
	pending: Mutex<HashMap<String, Vec<AccessDefinition>>>,
	locked: OnceLock<HashMap<String, ClassAccess>>,
}

impl AccessRegistry {

	pub fn new() -> Self { Self::default() }

	#[inline] pub fn is_locked( &self ) -> bool { self.locked.get().is_some() }

	/// # Errors
	/// Fails once the registry is locked.
	pub fn add_definition( &self, definition: AccessDefinition ) -> Result<(), AccessError> {
		let mut pending = self.pending.lock();
		if self.is_locked() { return Err( AccessError::Locked ) }
		tracing::debug!( target_class = %definition.target, member = %definition.member, "Adding access definition" );
		pending.entry( definition.target.clone() ).or_default().push( definition );
		Ok(())
	}

	/// Compiles and adds every rule in `text`.
	///
	/// Lines that fail to compile are logged, skipped and returned next to the
	/// number of definitions added.
	///
	/// # Errors
	/// Fails once the registry is locked.
	pub fn register_text( &self, text: &str ) -> Result<PartialSuccess<usize, CompileError>, AccessError> {
		let mut pending = self.pending.lock();
		if self.is_locked() { return Err( AccessError::Locked ) }

		let mut added = 0 ;
		let mut errors = Vec::new();
		for ( index, raw ) in text.lines().enumerate() {
			match compile_line( index + 1, raw ) {
				Ok( Some( definition )) => {
					tracing::trace!( line = index + 1, target_class = %definition.target, member = %definition.member, "Compiled access definition" );
					pending.entry( definition.target.clone() ).or_default().push( definition );
					added += 1 ;
				},
				Ok( None ) => {},
				Err( err ) => {
					tracing::warn!( line = err.line, text = %err.text, "Couldn't compile access definition" );
					errors.push( err );
				},
			}
		}
		Ok(( added, errors ))
	}

	/// # Errors
	/// Fails if reading fails or the registry is locked.
	pub fn register_reader( &self, mut reader: impl BufRead ) -> Result<PartialSuccess<usize, CompileError>, AccessError> {
		let mut text = String::new();
		reader.read_to_string( &mut text ).map_err(| source | AccessError::Io { location: "reader".to_string(), source })?;
		self.register_text( &text )
	}

	/// # Errors
	/// Fails if the file cannot be read or the registry is locked.
	pub fn register_path( &self, path: impl AsRef<Path> ) -> Result<PartialSuccess<usize, CompileError>, AccessError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string( path )
			.map_err(| source | AccessError::Io { location: path.display().to_string(), source })?;
		tracing::debug!( path = %path.display(), "Registering access rules" );
		self.register_text( &text )
	}

	/// Resolves conflicts and freezes the registry. Later calls do nothing.
	pub fn lock( &self ) {
		let mut pending = self.pending.lock();
		if self.is_locked() { return }
		let resolved = std::mem::take( &mut *pending ).into_iter()
			.filter_map(|( class, definitions )| resolve( definitions ).map(| access | ( class, access )))
			.collect::<HashMap<_, _>>();
		tracing::debug!( classes = resolved.len(), "Locked access registry" );
		let _ = self.locked.set( resolved );
	}

	/// Whether rules target the class with internal name `class`.
	///
	/// Before locking this looks at the pending definitions.
	pub fn contains( &self, class: &str ) -> bool {
		match self.locked.get() {
			Some( locked ) => locked.contains_key( class ),
			None => self.pending.lock().contains_key( class ),
		}
	}

	/// Internal names of every targeted class, sorted.
	pub fn targets( &self ) -> Vec<String> {
		match self.locked.get() {
			Some( locked ) => locked.keys().cloned().sorted().collect(),
			None => self.pending.lock().keys().cloned().sorted().collect(),
		}
	}

	/// # Errors
	/// Fails before locking and for classes without rules.
	pub fn class_access( &self, class: &str ) -> Result<&ClassAccess, AccessError> {
		self.locked.get()
			.ok_or( AccessError::NotLocked )?
			.get( class )
			.ok_or_else(|| AccessError::Unregistered( class.to_string() ))
	}

	/// Rewrites the access flags of `node` and its targeted members.
	///
	/// # Errors
	/// Fails before locking, for classes without rules, and when a targeted
	/// member does not exist. `node` may be partially modified on failure.
	pub fn apply_to( &self, node: &mut ClassNode ) -> Result<(), AccessError> {
		let class = node.name()?.to_string();
		let access = self.class_access( &class )?;
		for ( member, operation ) in access.members() {
			match member {
				MemberKey::Class => node.access = operation.apply( node.access ),
				MemberKey::Field( field ) => {
					let target = node.field_mut( field ).ok_or_else(|| AccessError::MissingField {
						class: class.clone(), field: field.clone(),
					})?;
					target.access = operation.apply( target.access );
				},
				MemberKey::Method { name, descriptor } => {
					let target = node.method_mut( name, descriptor ).ok_or_else(|| AccessError::MissingMethod {
						class: class.clone(), name: name.clone(), descriptor: descriptor.clone(),
					})?;
					target.access = operation.apply( target.access );
				},
			}
			tracing::debug!( class = %class, %member, "Applied access transformation" );
		}
		Ok(())
	}

}

fn resolve( definitions: Vec<AccessDefinition> ) -> Option<ClassAccess> {

	let mut best: HashMap<MemberKey, ( AccessOperation, bool )> = HashMap::new();
	for AccessDefinition { member, operation, .. } in definitions {
		match best.entry( member ) {
			Entry::Vacant( entry ) => { entry.insert(( operation, false )); },
			Entry::Occupied( mut entry ) => {
				let ( current, conflicted ) = entry.get_mut();
				if *current == operation { continue }
				if operation.visibility.rank() > current.visibility.rank() { *current = operation }
				*conflicted = true ;
			},
		}
	}

	let mut resolved = best.into_iter().map(|( member, ( operation, conflicted ))| match conflicted {
		true => ( member, AccessOperation { finality: Finality::Remove, ..operation }),
		false => ( member, operation ),
	});
	let ( member, operation ) = resolved.next()?;
	let mut members = NEMap::new( member, operation );
	resolved.for_each(|( member, operation )| { members.insert( member, operation ); });
	Some( ClassAccess { members })

}
