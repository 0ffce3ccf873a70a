//! Configuration management for specgen

mod settings;

// Re-export main types
pub use settings::{CONFIG_FILE_NAME, GeneratorConfig};
