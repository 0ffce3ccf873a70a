use anyhow::Result;
use std::path::Path;
use tracing::debug;

use specgen_core::Compiler;

use super::{load_config, load_manifest};
use crate::display::{print_declaration, print_diagnostics};

pub fn inspect_command(manifest: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    debug!("Inspecting manifest: {}", manifest.display());

    let source = load_manifest(manifest)?;
    let config = load_config(manifest, config_path)?;
    let analysis = Compiler::new(config).analyze(&source);

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("🔍 Inspecting: {}", manifest.display());
    println!("{}", "=".repeat(80));
    if analysis.declarations.is_empty() {
        println!("\n❌ No declarations found.");
    } else {
        println!("\n✅ Found {} declaration(s):\n", analysis.declarations.len());
        for (i, declaration) in analysis.declarations.iter().enumerate() {
            print_declaration(i + 1, declaration);
        }
    }
    print_diagnostics(&analysis.diagnostics);
    println!("\n{}", "=".repeat(80));
    Ok(())
}
