use std::path::Path ;
use std::sync::Arc ;
use thiserror::Error ;

use crate::{
	AccessError, AccessPatcher, AccessRegistry, ClassNode, ClassTransformer, CompileError, ConfigError,
	FactoryError, LoadError, LoadedUnit, LoaderConfig, ParentLoader, PluginServices, RegistryError,
	ResourceSource, ServiceFactories, SourceError, SourceParent, TransformPhase, TransformationService,
	UnitDefiner, UnitLoader, UnitName, VerifyingDefiner, WeaveEngineFactory, WeaveError, WeavingService,
};
use crate::utils::PartialSuccess ;



/// Errors that abort building a [`LoaderContext`].
#[derive( Debug, Error )]
pub enum BootstrapError {
	#[error( "Config Error: {0}" )] Config( #[from] ConfigError ),
	#[error( "Source Error: {0}" )] Source( #[from] SourceError ),
	#[error( "Access Rule Error: {0}" )] Access( #[from] AccessError ),
	#[error( "Plugin '{plugin}' declares an unusable service: {source}" )]
	Service { plugin: String, #[source] source: FactoryError },
	#[error( "Registry Error: {0}" )] Registry( #[from] RegistryError ),
}

/// Wires the transformer, the access patcher, the weaving adapter, plugin
/// services and the loader together from a [`LoaderConfig`].
pub struct ContextBuilder {
	config: LoaderConfig,
	factories: ServiceFactories,
	weave_factory: Option<Arc<dyn WeaveEngineFactory>>,
	parent: Option<Arc<dyn ParentLoader>>,
	definer: Arc<dyn UnitDefiner>,
	services: Vec<Arc<dyn TransformationService>>,
	sources: Vec<Arc<dyn ResourceSource>>,
	access_rules: Vec<String>,
}

impl std::fmt::Debug for ContextBuilder {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ContextBuilder" )
			.field( "config", &self.config )
			.field( "factories", &self.factories )
			.field( "weave_factory", &self.weave_factory.as_ref().map(| _ | "<factory>" ))
			.field( "parent", &self.parent )
			.field( "services", &self.services.iter().map(| service | service.name().to_string() ).collect::<Vec<_>>() )
			.field( "sources", &self.sources )
			.finish_non_exhaustive()
	}
}

impl ContextBuilder {

	pub fn new( config: LoaderConfig ) -> Self {
		Self {
			config,
			factories: ServiceFactories::new(),
			weave_factory: None,
			parent: None,
			definer: Arc::new( VerifyingDefiner ),
			services: Vec::new(),
			sources: Vec::new(),
			access_rules: Vec::new(),
		}
	}

	/// # Errors
	/// See [`LoaderConfig::load`].
	pub fn from_config_path( path: impl AsRef<Path> ) -> Result<Self, BootstrapError> {
		Ok( Self::new( LoaderConfig::load( path )?))
	}

	pub fn with_factories( mut self, factories: ServiceFactories ) -> Self { self.factories = factories ; self }

	/// Enables the weaving adapter with the given engine factory.
	pub fn with_weave_factory( mut self, factory: Arc<dyn WeaveEngineFactory> ) -> Self { self.weave_factory = Some( factory ); self }

	/// Uses `parent` instead of one built from `parent_sources`.
	pub fn with_parent( mut self, parent: Arc<dyn ParentLoader> ) -> Self { self.parent = Some( parent ); self }

	pub fn with_definer( mut self, definer: Arc<dyn UnitDefiner> ) -> Self { self.definer = definer ; self }

	/// Registers a service directly, after the plugin services.
	pub fn with_service( mut self, service: Arc<dyn TransformationService> ) -> Self { self.services.push( service ); self }

	/// Adds a source after the configured ones.
	pub fn with_source( mut self, source: Arc<dyn ResourceSource> ) -> Self { self.sources.push( source ); self }

	/// Adds access rule text compiled after the configured rule files.
	pub fn with_access_rules( mut self, text: impl Into<String> ) -> Self { self.access_rules.push( text.into() ); self }

	pub fn with_plugin( mut self, plugin: PluginServices ) -> Self { self.config.plugins.push( plugin ); self }

	/// Builds and seals the pipeline.
	///
	/// Rule lines that fail to compile do not abort the build; they are returned
	/// next to the context.
	///
	/// # Errors
	/// Fails on unreadable sources or rule files, unknown or failing plugin
	/// services, and failing setup hooks.
	pub fn build( self ) -> Result<PartialSuccess<LoaderContext, CompileError>, BootstrapError> {

		let transformer = Arc::new( ClassTransformer::new() );
		let access = Arc::new( AccessRegistry::new() );
		let mut compile_errors = Vec::new();

		transformer.register( Arc::new( AccessPatcher::new( Arc::clone( &access ))))?;

		let weaving = match self.weave_factory {
			Some( factory ) => {
				let weaving = Arc::new( WeavingService::new() );
				weaving.offer( factory );
				transformer.register( Arc::clone( &weaving ) as Arc<dyn TransformationService> )?;
				Some( weaving )
			},
			None => None,
		};

		for path in &self.config.access_rules {
			let ( _, errors ) = access.register_path( path )?;
			compile_errors.extend( errors );
		}
		for text in &self.access_rules {
			let ( _, errors ) = access.register_text( text )?;
			compile_errors.extend( errors );
		}

		for plugin in &self.config.plugins {
			for path in &plugin.access_rules {
				let ( count, errors ) = access.register_path( path )?;
				tracing::debug!( plugin = %plugin.id, path = %path.display(), count, "Registered plugin access rules" );
				compile_errors.extend( errors );
			}
			for id in &plugin.transform_services {
				let service = self.factories.create( id )
					.map_err(| source | BootstrapError::Service { plugin: plugin.id.clone(), source })?;
				tracing::info!( plugin = %plugin.id, service = service.name(), "Registered class transformer" );
				transformer.register( service )?;
			}
		}

		self.services.into_iter().try_for_each(| service | transformer.register( service ))?;

		let parent = match self.parent {
			Some( parent ) => {
				if !self.config.parent_sources.is_empty() {
					tracing::warn!( "Ignoring parent_sources, an explicit parent was supplied" );
				}
				parent
			},
			None => {
				let parent = SourceParent::new( Arc::clone( &self.definer ));
				self.config.parent_sources.iter().try_for_each(| path | parent.add_path( path ))?;
				Arc::new( parent )
			},
		};

		let loader = UnitLoader::new( Arc::clone( &transformer ))
			.with_parent( parent )
			.with_definer( self.definer );
		self.config.sources.iter().try_for_each(| path | loader.add_path( path ))?;
		self.sources.into_iter().for_each(| source | loader.add_source( source ));
		self.config.excluded_packages.iter().for_each(| prefix | loader.exclude_prefix( prefix.clone() ));

		transformer.finalize_setup()?;
		tracing::debug!( services = transformer.services().len(), sources = loader.sources().len(), "Loader context ready" );

		Ok(( LoaderContext { loader: Arc::new( loader ), access, weaving }, compile_errors ))

	}

}

/// A bootstrapped loader together with handles to its built-in services.
#[derive( Debug, Clone )]
pub struct LoaderContext {
	loader: Arc<UnitLoader>,
	access: Arc<AccessRegistry>,
	weaving: Option<Arc<WeavingService>>,
}

impl LoaderContext {

	#[inline] pub fn loader( &self ) -> &Arc<UnitLoader> { &self.loader }
	#[inline] pub fn transformer( &self ) -> &Arc<ClassTransformer> { self.loader.transformer() }
	#[inline] pub fn access( &self ) -> &Arc<AccessRegistry> { &self.access }
	#[inline] pub fn weaving( &self ) -> Option<&Arc<WeavingService>> { self.weaving.as_ref() }

	/// # Errors
	/// See [`UnitLoader::activate`].
	pub fn activate( &self, name: &UnitName ) -> Result<Arc<LoadedUnit>, LoadError> { self.loader.activate( name )}

	/// The tree the weaving engine sees for `name`: its WEAVE phase bytes, run
	/// through the services active in WEAVE.
	///
	/// # Errors
	/// Fails without a weaving adapter, for classes that neither exist nor are
	/// synthetic, and when a WEAVE service reports a violation.
	pub fn weave_class_node( &self, name: &UnitName ) -> Result<ClassNode, WeaveError> {
		let weaving = self.weaving.as_ref().ok_or( WeaveError::FactoryMissing )?;
		let resource = self.loader.unit_raw_bytes( name, TransformPhase::Weave );
		let bytes = resource.as_ref().map_or( &[][..], | resource | &resource.bytes()[..] );
		let node = weaving.class_node( name, bytes )?;
		let transformed = self.transformer().transform_node( name, node.clone(), TransformPhase::Weave )?;
		Ok( transformed.unwrap_or( node ))
	}

}
