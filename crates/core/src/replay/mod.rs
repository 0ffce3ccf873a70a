//! Reference interpreter for generated factory code
//!
//! Executes the same IR the renderer emits, so a compiled declaration set can
//! be checked end to end without building the generated crate.

pub mod interpreter;
pub mod runtime;

pub use interpreter::Replayer;
pub use runtime::{ArgBinding, ArgSpec, CommandSpec, GroupSpec, Object, ObjectRef, Slot};
