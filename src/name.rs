use std::sync::Arc ;
use thiserror::Error ;



/// A fully qualified class name in its canonical, dot-separated form.
///
/// Names are accepted in either binary (`com.example.Foo`) or internal
/// (`com/example/Foo`) form and normalised on construction, so two names that
/// denote the same class always compare equal. Cloning is cheap.
#[derive( Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash )]
pub struct UnitName( Arc<str> );

/// The string is not a usable class name.
#[derive( Debug, Error, PartialEq, Eq )]
pub enum InvalidName {
    #[error( "Class name is empty" )] Empty,
    #[error( "Class name '{0}' contains an empty segment" )] EmptySegment( String ),
    #[error( "Class name '{0}' contains whitespace" )] Whitespace( String ),
}

impl UnitName {

    /// Parses and normalises a class name.
    ///
    /// # Errors
    /// Fails on empty names, names with empty segments (`a..B`, `.A`) and names
    /// containing whitespace.
    pub fn new( name: impl AsRef<str> ) -> Result<Self, InvalidName> {
        let raw = name.as_ref();
        if raw.is_empty() { return Err( InvalidName::Empty ) }
        if raw.chars().any( char::is_whitespace ) { return Err( InvalidName::Whitespace( raw.to_string() )) }
        let canonical = raw.replace( '/', "." );
        if canonical.split( '.' ).any( str::is_empty ) {
            return Err( InvalidName::EmptySegment( raw.to_string() ));
        }
        Ok( Self( Arc::from( canonical )))
    }

    /// Canonical dotted form, e.g. `com.example.Foo`.
    #[inline] pub fn as_str( &self ) -> &str { &self.0 }

    /// Internal form as stored in class files, e.g. `com/example/Foo`.
    pub fn internal_name( &self ) -> String { self.0.replace( '.', "/" )}

    /// Path of the class file inside a source, e.g. `com/example/Foo.class`.
    pub fn resource_path( &self ) -> String { format!( "{}.class", self.internal_name() )}

    /// Dotted package name, `None` for classes in the default package.
    pub fn package( &self ) -> Option<&str> {
        self.0.rfind( '.' ).map(| index | &self.0[..index] )
    }

    /// The name without its package.
    pub fn simple_name( &self ) -> &str {
        self.0.rfind( '.' ).map_or( &self.0, | index | &self.0[index + 1..] )
    }

    /// Whether the name lies inside the namespace denoted by `prefix`.
    ///
    /// Prefixes ending in `.` match whole packages (`java.` matches `java.lang.Object`
    /// but not `javafx.Foo`); other prefixes match literally.
    pub fn starts_with( &self, prefix: &str ) -> bool { self.0.starts_with( prefix )}

}

impl std::fmt::Display for UnitName {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result { f.write_str( &self.0 )}
}

impl std::str::FromStr for UnitName {
    type Err = InvalidName ;
    fn from_str( s: &str ) -> Result<Self, Self::Err> { Self::new( s )}
}

impl TryFrom<&str> for UnitName {
    type Error = InvalidName ;
    fn try_from( value: &str ) -> Result<Self, Self::Error> { Self::new( value )}
}

impl AsRef<str> for UnitName {
    fn as_ref( &self ) -> &str { &self.0 }
}
