use std::sync::LazyLock ;
use regex::{ Captures, Regex };
use thiserror::Error ;

use crate::AccessFlags ;



const VISIBILITY: &str = r"^\s*(public|protected|private|default)([+-]f)?" ;
const CLASS: &str = r"\s+([A-Za-z_$][A-Za-z0-9_$]*(?:[.$][A-Za-z_$][A-Za-z0-9_$]*)*)" ;
const MEMBER: &str = r"\s+([A-Za-z_$][A-Za-z0-9_$]*)" ;
const METHOD: &str = r"\s+([A-Za-z_$][A-Za-z0-9_$]*|<init>|<clinit>)\s*\(([^)]*)\)\s*(\[*(?:[BCDFIJSZV]|L[^;\s]+;)|[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)" ;
const END: &str = r"\s*$" ;

static CLASS_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new( &format!( "{VISIBILITY}{CLASS}{END}" )).expect( "invalid regex" ));
static FIELD_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new( &format!( "{VISIBILITY}{CLASS}{MEMBER}{END}" )).expect( "invalid regex" ));
static METHOD_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new( &format!( "{VISIBILITY}{CLASS}{METHOD}{END}" )).expect( "invalid regex" ));

/// Target visibility of an access rule.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum Visibility {
	Public,
	Protected,
	/// Package-private.
	Default,
	Private,
}

impl Visibility {

	/// Conflict ordering: public > protected > default > private.
	pub const fn rank( self ) -> u8 {
		match self {
			Self::Public => 3,
			Self::Protected => 2,
			Self::Default => 1,
			Self::Private => 0,
		}
	}

	/// Rewrites the visibility bits of `flags`.
	///
	/// `Protected` leaves public members public.
	pub fn apply( self, flags: AccessFlags ) -> AccessFlags {
		match self {
			Self::Public => ( flags - AccessFlags::PRIVATE - AccessFlags::PROTECTED ) | AccessFlags::PUBLIC,
			Self::Protected if flags.contains( AccessFlags::PUBLIC ) => flags,
			Self::Protected => ( flags - AccessFlags::PRIVATE ) | AccessFlags::PROTECTED,
			Self::Default => flags - AccessFlags::VISIBILITY,
			Self::Private => ( flags - AccessFlags::PUBLIC - AccessFlags::PROTECTED ) | AccessFlags::PRIVATE,
		}
	}

	fn from_token( token: &str ) -> Option<Self> {
		match token {
			"public" => Some( Self::Public ),
			"protected" => Some( Self::Protected ),
			"default" => Some( Self::Default ),
			"private" => Some( Self::Private ),
			_ => None,
		}
	}

}

/// What a rule does to `ACC_FINAL`.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum Finality {
	#[default] Unchanged,
	/// `+f`
	Add,
	/// `-f`
	Remove,
}

impl Finality {
	pub fn apply( self, flags: AccessFlags ) -> AccessFlags {
		match self {
			Self::Unchanged => flags,
			Self::Add => flags | AccessFlags::FINAL,
			Self::Remove => flags - AccessFlags::FINAL,
		}
	}
}

/// A visibility change together with a finality change.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub struct AccessOperation {
	pub visibility: Visibility,
	pub finality: Finality,
}

impl AccessOperation {
	pub const fn new( visibility: Visibility, finality: Finality ) -> Self { Self { visibility, finality }}
	pub fn apply( self, flags: AccessFlags ) -> AccessFlags { self.finality.apply( self.visibility.apply( flags ))}
}

/// The member of a class a rule targets.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub enum MemberKey {
	/// The class itself.
	Class,
	Field( String ),
	Method { name: String, descriptor: String },
}

impl std::fmt::Display for MemberKey {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		match self {
			Self::Class => f.write_str( "<class>" ),
			Self::Field( name ) => f.write_str( name ),
			Self::Method { name, descriptor } => write!( f, "{name}{descriptor}" ),
		}
	}
}

/// One compiled rule line.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct AccessDefinition {
	/// Internal name of the target class, e.g. `com/example/Foo$Bar`.
	pub target: String,
	pub member: MemberKey,
	pub operation: AccessOperation,
}

/// A rule line that matches none of the rule shapes.
#[derive( Debug, Error, Clone, PartialEq, Eq )]
#[error( "Line {line}: {reason}: '{text}'" )]
pub struct CompileError {
	pub line: usize,
	pub text: String,
	pub reason: &'static str,
}

/// Compiles one line of rule text.
///
/// Everything after `#` is a comment. Blank lines compile to `Ok( None )`.
///
/// # Errors
/// Fails if the line is not a class, field or method rule.
pub fn compile_line( line: usize, raw: &str ) -> Result<Option<AccessDefinition>, CompileError> {

	let text = raw.split_once( '#' ).map_or( raw, |( rule, _ )| rule ).trim();
	if text.is_empty() { return Ok( None ) }

	let error = | reason | CompileError { line, text: text.to_string(), reason };
	let matches = | rule: &'static LazyLock<Regex> | rule.captures( text );

	let ( captures, member ) = if let Some( captures ) = matches( &CLASS_RULE ) {
		( captures, MemberKey::Class )
	} else if let Some( captures ) = matches( &FIELD_RULE ) {
		let member = MemberKey::Field( group( &captures, 4 ).to_string() );
		( captures, member )
	} else if let Some( captures ) = matches( &METHOD_RULE ) {
		let member = MemberKey::Method {
			name: group( &captures, 4 ).to_string(),
			descriptor: format!( "({}){}", group( &captures, 5 ).trim(), group( &captures, 6 )),
		};
		( captures, member )
	} else {
		return Err( error( "not a class, field or method rule" ));
	};

	let visibility = Visibility::from_token( group( &captures, 1 )).ok_or_else(|| error( "unknown visibility" ))?;
	let finality = match captures.get( 2 ).map(| token | token.as_str() ) {
		Some( "+f" ) => Finality::Add,
		Some( "-f" ) => Finality::Remove,
		_ => Finality::Unchanged,
	};

	Ok( Some( AccessDefinition {
		target: group( &captures, 3 ).replace( '.', "/" ),
		member,
		operation: AccessOperation::new( visibility, finality ),
	}))

}

fn group<'t>( captures: &Captures<'t>, index: usize ) -> &'t str {
	captures.get( index ).map_or( "", | group | group.as_str() )
}
