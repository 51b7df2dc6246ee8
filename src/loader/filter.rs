use parking_lot::RwLock ;

use crate::UnitName ;
use crate::transformer::UnitFilter ;



/// Namespaces that are always left to the parent loader.
pub const BUILTIN_EXCLUSIONS: [&str; 5] = [ "java.", "javax.", "jdk.", "sun.", "com.sun." ];

/// Decides which units a loader defines itself.
///
/// A unit is handled by the loader only if its name is outside every excluded
/// prefix and every predicate accepts it. Everything else goes to the parent
/// without touching the sources or the transformer.
pub struct TransformationFilter {
	prefixes: RwLock<Vec<String>>,
	predicates: RwLock<Vec<UnitFilter>>,
}

impl Default for TransformationFilter {
	fn default() -> Self {
		Self {
			prefixes: RwLock::new( BUILTIN_EXCLUSIONS.iter().map(| prefix | ( *prefix ).to_string() ).collect() ),
			predicates: RwLock::new( Vec::new() ),
		}
	}
}

impl std::fmt::Debug for TransformationFilter {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "TransformationFilter" )
			.field( "prefixes", &*self.prefixes.read() )
			.field( "predicates", &self.predicates.read().len() )
			.finish()
	}
}

impl TransformationFilter {

	pub fn new() -> Self { Self::default() }

	pub fn exclude_prefix( &self, prefix: impl Into<String> ) {
		let prefix = prefix.into();
		let mut prefixes = self.prefixes.write();
		if !prefixes.contains( &prefix ) { prefixes.push( prefix ) }
	}

	pub fn add_predicate( &self, predicate: UnitFilter ) { self.predicates.write().push( predicate ); }

	pub fn is_excluded_prefix( &self, name: &UnitName ) -> bool {
		self.prefixes.read().iter().any(| prefix | name.starts_with( prefix ))
	}

	pub fn permits( &self, name: &UnitName ) -> bool {
		!self.is_excluded_prefix( name ) && self.predicates.read().iter().all(| predicate | predicate( name ))
	}

}
