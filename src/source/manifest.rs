use std::collections::HashMap ;
use thiserror::Error ;



/// A JAR-style manifest (`META-INF/MANIFEST.MF`).
///
/// The first section is the main section. Every later section starts with a
/// `Name:` attribute naming the entry it describes. Attribute keys compare
/// case-insensitively.
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct Manifest {
	main: HashMap<String, String>,
	entries: HashMap<String, HashMap<String, String>>,
}

/// The manifest text is not well formed.
#[derive( Debug, Error, Clone, PartialEq, Eq )]
pub enum ManifestError {
	#[error( "Line {0}: continuation without a preceding attribute" )] DanglingContinuation( usize ),
	#[error( "Line {0}: expected 'Key: Value'" )] MissingSeparator( usize ),
	#[error( "Line {0}: empty attribute name" )] EmptyKey( usize ),
	#[error( "Line {0}: section does not start with a 'Name' attribute" )] UnnamedSection( usize ),
}

/// The package attribute block declared for one package.
#[derive( Debug, Clone, Default, PartialEq, Eq, Hash )]
pub struct PackageAttributes {
	pub specification_title: Option<String>,
	pub specification_version: Option<String>,
	pub specification_vendor: Option<String>,
	pub implementation_title: Option<String>,
	pub implementation_version: Option<String>,
	pub implementation_vendor: Option<String>,
}

impl Manifest {

	const NAME: &'static str = "name" ;

	/// Parses manifest text.
	///
	/// # Errors
	/// Fails on lines that are neither attributes, continuations nor blank, and on
	/// non-main sections that do not begin with `Name:`.
	pub fn parse( text: &str ) -> Result<Self, ManifestError> {

		let mut manifest = Self::default();
		let mut current: Vec<( String, String )> = Vec::new();
		let mut section_start = 1 ;
		let mut in_main = true ;

		for ( index, raw ) in text.lines().enumerate() {
			let number = index + 1 ;
			let line = raw.strip_suffix( '\r' ).unwrap_or( raw );

			if line.is_empty() {
				if !current.is_empty() || in_main {
					manifest.finish_section( std::mem::take( &mut current ), section_start, in_main )?;
					in_main = false ;
				}
				section_start = number + 1 ;
				continue ;
			}

			if let Some( continuation ) = line.strip_prefix( ' ' ) {
				match current.last_mut() {
					Some(( _, value )) => value.push_str( continuation ),
					None => return Err( ManifestError::DanglingContinuation( number )),
				}
				continue ;
			}

			let ( key, value ) = line.split_once( ':' ).ok_or( ManifestError::MissingSeparator( number ))?;
			let key = key.trim();
			if key.is_empty() { return Err( ManifestError::EmptyKey( number )) }
			current.push(( key.to_ascii_lowercase(), value.strip_prefix( ' ' ).unwrap_or( value ).to_string() ));
		}

		manifest.finish_section( current, section_start, in_main )?;
		Ok( manifest )

	}

	fn finish_section( &mut self, attributes: Vec<( String, String )>, start: usize, is_main: bool ) -> Result<(), ManifestError> {
		if is_main {
			self.main.extend( attributes );
			return Ok(());
		}
		let mut attributes = attributes.into_iter();
		match attributes.next() {
			None => Ok(()),
			Some(( key, name )) if key == Self::NAME => {
				self.entries.entry( name ).or_default().extend( attributes );
				Ok(())
			},
			Some( _ ) => Err( ManifestError::UnnamedSection( start )),
		}
	}

	/// An attribute of the main section.
	pub fn main_attribute( &self, key: &str ) -> Option<&str> {
		self.main.get( &key.to_ascii_lowercase() ).map( String::as_str )
	}

	/// An attribute of the section named `entry`.
	pub fn entry_attribute( &self, entry: &str, key: &str ) -> Option<&str> {
		self.entries.get( entry )?.get( &key.to_ascii_lowercase() ).map( String::as_str )
	}

	/// The attribute block for a dotted package name.
	///
	/// Each attribute is read from the `a/b/` section first and from the main
	/// section when the package section does not declare it.
	pub fn package_attributes( &self, package: &str ) -> PackageAttributes {
		let section = format!( "{}/", package.replace( '.', "/" ));
		let lookup = | key: &str | self.entry_attribute( &section, key )
			.or_else(|| self.main_attribute( key ))
			.map( str::to_string );
		PackageAttributes {
			specification_title: lookup( "Specification-Title" ),
			specification_version: lookup( "Specification-Version" ),
			specification_vendor: lookup( "Specification-Vendor" ),
			implementation_title: lookup( "Implementation-Title" ),
			implementation_version: lookup( "Implementation-Version" ),
			implementation_vendor: lookup( "Implementation-Vendor" ),
		}
	}

}
