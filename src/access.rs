//! Declarative visibility and finality patching.
//!
//! Rules are plain text, one per line:
//!
//! ```text
//! public-f com.example.Foo                  # the class
//! protected com.example.Foo counter         # a field
//! public com.example.Foo$Inner run(I)V      # a method
//! ```
//!
//! The visibility is one of `public`, `protected`, `default` or `private`, and
//! may be followed by `+f` (make final) or `-f` (remove final). Rules are
//! collected in an [`AccessRegistry`], resolved once by [`AccessRegistry::lock`]
//! and applied during LOAD by the [`AccessPatcher`] service.

mod patcher ;
mod registry ;
mod rule ;

pub use patcher::AccessPatcher ;
pub use registry::{ AccessRegistry, AccessError, ClassAccess };
pub use rule::{ compile_line, AccessDefinition, AccessOperation, CompileError, Finality, MemberKey, Visibility };
