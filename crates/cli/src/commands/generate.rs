use anyhow::Result;
use std::path::Path;
use tracing::{debug, info};

use specgen_core::{CompileReport, Compiler, DirectorySink, MemorySink, Severity};

use super::{load_config, load_manifest};
use crate::display::print_diagnostics;

pub fn generate_command(
    manifest: &Path,
    output: &Path,
    config_path: Option<&Path>,
    dry_run: bool,
    rustfmt: bool,
) -> Result<()> {
    debug!("Generating from manifest: {}", manifest.display());

    let source = load_manifest(manifest)?;
    let mut config = load_config(manifest, config_path)?;
    if rustfmt {
        config.rustfmt = true;
    }
    let compiler = Compiler::new(config);

    let report = if dry_run {
        let mut sink = MemorySink::new();
        let report = compiler.compile(&source, &mut sink)?;
        for (path, contents) in sink.files() {
            println!("📄 {}", output.join(path).display());
            println!("{}", "=".repeat(80));
            println!("{contents}");
        }
        report
    } else {
        let mut sink = DirectorySink::new(output);
        let report = compiler.compile(&source, &mut sink)?;
        for path in &report.emit.written {
            println!("✅ Wrote {}", output.join(path).display());
        }
        for path in &report.emit.failed {
            println!("❌ Failed {}", output.join(path).display());
        }
        info!("Generated modules under {}", output.display());
        report
    };

    finish(&report)
}

fn finish(report: &CompileReport) -> Result<()> {
    print_diagnostics(&report.diagnostics);
    if report.emit.written.is_empty() && report.emit.failed.is_empty() {
        println!("ℹ️  No command declarations found; nothing generated.");
    }
    if report.has_errors() {
        return Err(anyhow::anyhow!(
            "Generation finished with {} error(s)",
            report.diagnostics.count(Severity::Error)
        ));
    }
    Ok(())
}
