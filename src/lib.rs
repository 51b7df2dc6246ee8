//! A runtime class loading and transformation pipeline for JVM class files.
//!
//! Units (classes) are requested by name, located across a layered set of
//! sources, run through a prioritised pipeline of pluggable transformation
//! services and only then made live. Each name is activated at most once per
//! loader, however many threads ask for it at the same time.
//!
//! # Core Concepts
//!
//! - [`UnitLoader`]: The orchestrator. Resolves a name against its
//! 	[`SourceRegistry`], leaves excluded namespaces to its [`ParentLoader`], runs
//! 	the LOAD phase of its [`ClassTransformer`], registers the declaring
//! 	[`Package`] and hands the final bytes to a [`UnitDefiner`].
//!
//! - [`ResourceSource`]: A root providing raw bytes by path. Sources are consulted in
//! 	the order they were added. [`DirectorySource`], [`ArchiveSource`] (tar and
//! 	tar.gz) and [`MemorySource`] are provided.
//!
//! - [`TransformationService`]: A pipeline stage. It reports a priority per
//! 	[`TransformPhase`], lower running first and negative meaning "not in this phase".
//! 	A failing service is logged and skipped, unless it reports a violation with
//! 	[`TransformError::Fatal`].
//!
//! - [`AccessPatcher`]: The built-in LOAD phase service applying declarative
//! 	visibility and finality rules collected in an [`AccessRegistry`].
//!
//! - [`WeavingService`]: Adapter for an external weaving engine, created from a
//! 	[`WeaveEngineFactory`] at setup.
//!
//! - [`ContextBuilder`]: Builds all of the above from a [`LoaderConfig`] and a
//! 	table of [`ServiceFactories`] for plugin supplied services.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc ;
//! use class_link::{ AccessFlags, ClassNode, ContextBuilder, LoaderConfig, MemorySource, UnitName };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // A class with a private final field, served from memory.
//! let name = UnitName::new( "com.example.Foo" )?;
//! let mut node = ClassNode::synthesize( &name );
//! node.add_field( AccessFlags::PRIVATE | AccessFlags::FINAL, "counter", "I" )?;
//! let source = MemorySource::new( "memory" ).with( name.resource_path(), node.to_bytes()? );
//!
//! // Building the context compiles the access rules and seals the pipeline.
//! // Rule lines that fail to compile are returned next to the context.
//! let ( context, errors ) = ContextBuilder::new( LoaderConfig::default() )
//! 	.with_source( Arc::new( source ))
//! 	.with_access_rules( "public-f com.example.Foo counter" )
//! 	.build()?;
//! assert!( errors.is_empty() );
//!
//! // Activation runs the access patcher before the class becomes live.
//! let unit = context.activate( &name )?;
//! let mut patched = ClassNode::parse( unit.bytes() )?;
//! let field = patched.field_mut( "counter" ).ok_or( "missing field" )?;
//! assert_eq!( field.access, AccessFlags::PUBLIC );
//!
//! // Repeated activation returns the same unit.
//! assert!( Arc::ptr_eq( &unit, &context.activate( &name )? ));
//! # Ok(())
//! # }
//! ```
//!
//! # Phases
//!
//! [`TransformPhase::Load`] runs while a unit is activated. [`TransformPhase::Weave`]
//! runs when the weaving engine asks for a unit's tree through
//! [`LoaderContext::weave_class_node`], which hands back the tree after the WEAVE
//! services ran over it. In that phase the loader also reads raw bytes from its
//! parent's resources, which it never does during LOAD.
//!
//! # Logging
//!
//! Every step is reported through [`tracing`]. The crate never installs a
//! subscriber.

mod access ;
mod class_file ;
mod config ;
mod context ;
mod factory ;
mod loader ;
mod name ;
mod phase ;
mod service ;
mod source ;
mod transformer ;
mod utils ;
mod weave ;

pub use access::{
	compile_line, AccessDefinition, AccessError, AccessOperation, AccessPatcher, AccessRegistry,
	ClassAccess, CompileError, Finality, MemberKey, Visibility,
};
pub use class_file::{ AccessFlags, Attribute, ClassFileError, ClassNode, Constant, ConstantPool, MemberNode };
pub use config::{ ConfigError, LoaderConfig, PluginServices };
pub use context::{ BootstrapError, ContextBuilder, LoaderContext };
pub use factory::{ FactoryError, ServiceFactories };
pub use loader::{
	DefineError, EmptyParent, LoadError, LoadedUnit, Package, PackageError, PackageRegistry, ParentLoader,
	Provider, SourceParent, TransformationFilter, UnitDefiner, UnitLoader, UnitState, VerifyingDefiner,
	BUILTIN_EXCLUSIONS,
};
pub use name::{ InvalidName, UnitName };
pub use phase::{ TransformPhase, UnknownPhase };
pub use service::{ BoxError, TransformError, TransformationService };
pub use source::{
	ArchiveSource, DirectorySource, Manifest, ManifestError, MemorySource, Origin, PackageAttributes,
	Resource, ResourceSource, SourceError, SourceRegistry, MANIFEST_PATH,
};
pub use transformer::{ ClassTransformer, PipelineError, RegistryError, TransformOutcome, UnitFilter };
pub use utils::PartialSuccess ;
pub use weave::{ WeaveEngine, WeaveEngineFactory, WeaveError, WeavingService };
