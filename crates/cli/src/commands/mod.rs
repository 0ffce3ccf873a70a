pub mod generate;
pub mod inspect;
pub mod replay;

pub use generate::generate_command;
pub use inspect::inspect_command;
pub use replay::replay_command;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use specgen_core::{GeneratorConfig, ManifestSource};

pub(crate) fn load_manifest(path: &Path) -> Result<ManifestSource> {
    if !path.exists() {
        return Err(anyhow::anyhow!("Manifest not found: {}", path.display()));
    }
    ManifestSource::from_path(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))
}

/// Explicit config file, else the nearest `.specgen.json` above the manifest
pub(crate) fn load_config(manifest: &Path, explicit: Option<&Path>) -> Result<GeneratorConfig> {
    if let Some(path) = explicit {
        debug!("Using config file {}", path.display());
        return GeneratorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let start = manifest
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    GeneratorConfig::discover(start).context("Failed to load configuration")
}
