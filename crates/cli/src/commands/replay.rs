use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use specgen_core::Compiler;
use specgen_core::replay::{Object, Replayer};
use specgen_core::symbols::SymbolId;
use specgen_core::synth::ProcedureKind;

use super::{load_config, load_manifest};

pub fn replay_command(manifest: &Path, element: &str, config_path: Option<&Path>) -> Result<()> {
    debug!("Replaying {} from {}", element, manifest.display());

    let source = load_manifest(manifest)?;
    let config = load_config(manifest, config_path)?;
    let compilation = Compiler::new(config).build(&source);
    for diagnostic in compilation.diagnostics.entries() {
        eprintln!("{diagnostic}");
    }

    let element = SymbolId::new(element);
    let (module, factory) = compilation
        .factory(&element)
        .with_context(|| format!("No command factory generated for {element}"))?;

    // Method-rooted factories run against a fresh owner instance
    let owner = match factory.kind {
        ProcedureKind::CreateSpec {
            method_rooted: true,
        } => Some(Object::new_ref(&module.instance_type)),
        _ => None,
    };

    let modules = compilation.modules();
    let spec = Replayer::new(&modules)
        .create_spec(&module.path, &factory.name, owner)
        .with_context(|| format!("Failed to replay {element}"))?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}
