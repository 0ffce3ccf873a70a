pub mod formatter;

pub use formatter::{print_declaration, print_diagnostics, severity_icon};
