//! Code synthesis: declarations → procedure IR → Rust tokens

pub mod engine;
pub mod ir;
pub mod naming;
pub mod render;

pub use engine::{SynthesisEngine, synthesize};
pub use ir::{GeneratedModule, ModulePath, Procedure, ProcedureKind, Stmt};
pub use render::Renderer;
