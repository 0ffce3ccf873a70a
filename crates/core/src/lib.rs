//! specgen-core - Compiles annotated command declarations into factory code
//!
//! This crate provides functionality to:
//! - Extract command, option, mixin and arg-group declarations from a host symbol graph
//! - Resolve inheritance between command declarations
//! - Synthesize reflection-free factory procedures and render them as Rust
//! - Nest generated modules the way the declarations are nested and write them out
pub mod assemble;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod extract;
pub mod inherit;
pub mod model;
pub mod replay;
pub mod session;
pub mod source;
pub mod symbols;
pub mod synth;

// Re-export commonly used types and traits
pub use compiler::{Analysis, Compilation, CompileReport, Compiler};
pub use config::GeneratorConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Messager, Severity};
pub use emit::{ArtifactSink, DirectorySink, MemorySink};
pub use error::{Error, Result};
pub use source::{DeclarationSource, ManifestSource};
