//! Artifact emission: rendering output units and writing them out

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::assemble::OutputUnit;
use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostic, Messager};
use crate::error::{Error, Result};
use crate::synth::Renderer;

const HEADER: &str = "// @generated by specgen. Do not edit.\n\n";

/// Destination for rendered artifacts
pub trait ArtifactSink {
    fn write(&mut self, relative: &Path, contents: &str) -> io::Result<()>;
}

/// Writes artifacts below a root directory
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for DirectorySink {
    fn write(&mut self, relative: &Path, contents: &str) -> io::Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Writing {}", path.display());
        fs::write(path, contents)
    }
}

/// Keeps artifacts in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, relative: impl AsRef<Path>) -> Option<&str> {
        self.files.get(relative.as_ref()).map(String::as_str)
    }

    pub fn files(&self) -> &BTreeMap<PathBuf, String> {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, relative: &Path, contents: &str) -> io::Result<()> {
        self.files.insert(relative.to_path_buf(), contents.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct EmitReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub struct Emitter<'c> {
    config: &'c GeneratorConfig,
    renderer: Renderer,
}

impl<'c> Emitter<'c> {
    pub fn new(config: &'c GeneratorConfig) -> Result<Self> {
        Ok(Self {
            config,
            renderer: Renderer::new(config)?,
        })
    }

    pub fn render_unit(&self, unit: &OutputUnit) -> Result<String> {
        let tokens = self.renderer.render_file(&unit.module)?;
        let mut source = tokens.to_string();
        if self.config.rustfmt {
            match rustfmt(&source) {
                Ok(formatted) => source = formatted,
                Err(e) => warn!("rustfmt failed for {}: {}", unit.module.name, e),
            }
        }
        if self.config.emit_header {
            source.insert_str(0, HEADER);
        }
        if !source.ends_with('\n') {
            source.push('\n');
        }
        Ok(source)
    }

    /// Write every unit; a failed artifact is reported and the rest still go out
    pub fn emit(
        &self,
        units: &[OutputUnit],
        sink: &mut dyn ArtifactSink,
        messager: &mut dyn Messager,
    ) -> EmitReport {
        let mut report = EmitReport::default();
        for unit in units {
            let path = unit.relative_path();
            let written = self.render_unit(unit).and_then(|source| {
                sink.write(&path, &source)
                    .map_err(|err| Error::ArtifactWrite {
                        element: unit.element().clone(),
                        source: err,
                    })
            });
            match written {
                Ok(()) => report.written.push(path),
                Err(e) => {
                    messager.print_message(Diagnostic::error(e.to_string()).at(unit.element()));
                    report.failed.push(path);
                }
            }
        }
        report
    }
}

fn rustfmt(source: &str) -> io::Result<String> {
    let mut child = Command::new("rustfmt")
        .args(["--edition", "2024", "--emit", "stdout"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(source.as_bytes())?;
    }
    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(io::Error::other(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    String::from_utf8(output.stdout).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::model::Visibility;
    use crate::synth::{GeneratedModule, ModulePath};

    fn unit(name: &str) -> OutputUnit {
        OutputUnit {
            module: GeneratedModule {
                declaration: name.into(),
                name: format!("{name}_cli_cfg"),
                path: ModulePath(vec!["demo".to_string(), format!("{name}_cli_cfg")]),
                visibility: Visibility::Public,
                instance_type: format!("crate::demo::{name}"),
                abstract_container: true,
                procedures: Vec::new(),
                children: Vec::new(),
            },
            package: Some("demo".to_string()),
        }
    }

    struct FailingSink;

    impl ArtifactSink for FailingSink {
        fn write(&mut self, relative: &Path, _contents: &str) -> io::Result<()> {
            if relative.ends_with("broken_cli_cfg.rs") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_render_unit_has_header() {
        let config = GeneratorConfig::default();
        let emitter = Emitter::new(&config).expect("emitter");
        let source = emitter.render_unit(&unit("app")).expect("render");
        assert!(source.starts_with("// @generated"));
        assert!(source.contains("cmdspec_runtime"));
    }

    #[test]
    fn test_failed_write_does_not_stop_others() {
        let config = GeneratorConfig::default();
        let emitter = Emitter::new(&config).expect("emitter");
        let mut diagnostics = Diagnostics::new();

        let report = emitter.emit(
            &[unit("broken"), unit("fine")],
            &mut FailingSink,
            &mut diagnostics,
        );

        assert_eq!(report.written, vec![PathBuf::from("demo/fine_cli_cfg.rs")]);
        assert_eq!(report.failed.len(), 1);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_directory_sink_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sink = DirectorySink::new(dir.path());
        sink.write(Path::new("a/b/c.rs"), "// x\n").expect("write");
        assert_eq!(
            fs::read_to_string(dir.path().join("a/b/c.rs")).expect("read"),
            "// x\n"
        );
    }
}
