use std::path::{ Path, PathBuf };
use serde::Deserialize ;
use thiserror::Error ;



/// Bootstrap configuration of a loader.
///
/// ```toml
/// sources = ["libs/server.tar", "classes/"]
/// parent_sources = ["runtime/"]
/// excluded_packages = ["org.objectweb.asm."]
/// access_rules = ["rules/base.at"]
///
/// [[plugins]]
/// id = "example"
/// transform_services = ["example:logging"]
/// access_rules = ["rules/example.at"]
/// ```
#[derive( Debug, Clone, Default, PartialEq, Eq, Deserialize )]
#[serde( default, deny_unknown_fields )]
pub struct LoaderConfig {
	/// Directories and archives of the loader, highest precedence first.
	pub sources: Vec<PathBuf>,
	/// Directories and archives of the untransformed parent.
	pub parent_sources: Vec<PathBuf>,
	/// Extra name prefixes left to the parent.
	pub excluded_packages: Vec<String>,
	/// Access rule files.
	pub access_rules: Vec<PathBuf>,
	pub plugins: Vec<PluginServices>,
}

/// What one plugin contributes to the pipeline.
#[derive( Debug, Clone, Default, PartialEq, Eq, Deserialize )]
#[serde( default, deny_unknown_fields )]
pub struct PluginServices {
	pub id: String,
	/// Identifiers resolved through [`ServiceFactories`]( crate::ServiceFactories ).
	pub transform_services: Vec<String>,
	pub access_rules: Vec<PathBuf>,
}

#[derive( Debug, Error )]
pub enum ConfigError {
	#[error( "Failed to read config '{}': {source}", path.display() )]
	Io { path: PathBuf, #[source] source: std::io::Error },
	#[error( "Failed to parse config '{path}': {source}" )]
	Parse { path: String, #[source] source: toml::de::Error },
}

impl LoaderConfig {

	/// Parses configuration text. Paths are kept as written.
	///
	/// # Errors
	/// Fails on malformed TOML and unknown keys.
	pub fn from_toml_str( text: &str ) -> Result<Self, ConfigError> {
		toml::from_str( text ).map_err(| source | ConfigError::Parse { path: "<inline>".to_string(), source })
	}

	/// Reads a configuration file, resolving relative paths against its directory.
	///
	/// # Errors
	/// Fails if the file cannot be read or parsed.
	pub fn load( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string( path ).map_err(| source | ConfigError::Io { path: path.to_path_buf(), source })?;
		let config: Self = toml::from_str( &text ).map_err(| source | ConfigError::Parse { path: path.display().to_string(), source })?;
		tracing::debug!( path = %path.display(), "Loaded loader config" );
		Ok( match path.parent() {
			Some( base ) => config.resolved_against( base ),
			None => config,
		})
	}

	/// Joins every relative path onto `base`.
	pub fn resolved_against( mut self, base: &Path ) -> Self {
		let resolve = | paths: &mut Vec<PathBuf> | paths.iter_mut()
			.filter(| path | path.is_relative() )
			.for_each(| path | *path = base.join( &*path ));
		resolve( &mut self.sources );
		resolve( &mut self.parent_sources );
		resolve( &mut self.access_rules );
		self.plugins.iter_mut().for_each(| plugin | resolve( &mut plugin.access_rules ));
		self
	}

}
