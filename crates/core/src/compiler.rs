//! Single-pass orchestration: extract → resolve → synthesize → assemble → emit

use serde::Serialize;
use tracing::{debug, info};

use crate::assemble::{OutputUnit, assemble};
use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostics;
use crate::emit::{ArtifactSink, EmitReport, Emitter};
use crate::error::Result;
use crate::extract::extract;
use crate::inherit::resolve_super_commands;
use crate::model::Declaration;
use crate::session::CompilationSession;
use crate::source::DeclarationSource;
use crate::symbols::SymbolId;
use crate::synth::{GeneratedModule, Procedure, ProcedureKind, synthesize};

/// Declarations after extraction and inheritance resolution
#[derive(Debug, Serialize)]
pub struct Analysis {
    pub declarations: Vec<AnalyzedDeclaration>,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Serialize)]
pub struct AnalyzedDeclaration {
    pub depth: usize,
    #[serde(flatten)]
    pub declaration: Declaration,
}

/// Output units of a pass, before anything is written
#[derive(Debug)]
pub struct Compilation {
    pub units: Vec<OutputUnit>,
    pub diagnostics: Diagnostics,
}

impl Compilation {
    /// Every generated module, for replay
    pub fn modules(&self) -> Vec<GeneratedModule> {
        self.units.iter().map(|unit| unit.module.clone()).collect()
    }

    /// Module and `create_cmd_spec` procedure generated for a command element
    pub fn factory(&self, element: &SymbolId) -> Option<(&GeneratedModule, &Procedure)> {
        self.units
            .iter()
            .flat_map(|unit| unit.module.walk())
            .find_map(|module| {
                module
                    .procedures
                    .iter()
                    .find(|procedure| {
                        &procedure.element == element
                            && matches!(procedure.kind, ProcedureKind::CreateSpec { .. })
                    })
                    .map(|procedure| (module, procedure))
            })
    }
}

#[derive(Debug)]
pub struct CompileReport {
    pub diagnostics: Diagnostics,
    pub emit: EmitReport,
}

impl CompileReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

pub struct Compiler {
    config: GeneratorConfig,
}

impl Compiler {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn analyze(&self, source: &dyn DeclarationSource) -> Analysis {
        let mut session = CompilationSession::new(source.symbols(), &self.config);
        extract(&mut session, source);
        resolve_super_commands(&mut session);

        let declarations = session
            .iter()
            .map(|declaration| AnalyzedDeclaration {
                depth: session.depth(declaration.id()),
                declaration: declaration.clone(),
            })
            .collect();
        Analysis {
            declarations,
            diagnostics: session.take_diagnostics(),
        }
    }

    pub fn build(&self, source: &dyn DeclarationSource) -> Compilation {
        let mut session = CompilationSession::new(source.symbols(), &self.config);
        extract(&mut session, source);
        resolve_super_commands(&mut session);

        if !session.commands().any(|decl| decl.is_command()) {
            debug!("No command declarations; nothing to generate");
            return Compilation {
                units: Vec::new(),
                diagnostics: session.take_diagnostics(),
            };
        }

        let modules = synthesize(&mut session);
        let units = assemble(&mut session, modules);
        info!("Assembled {} output units", units.len());
        Compilation {
            units,
            diagnostics: session.take_diagnostics(),
        }
    }

    /// Build and write every artifact through `sink`
    pub fn compile(
        &self,
        source: &dyn DeclarationSource,
        sink: &mut dyn ArtifactSink,
    ) -> Result<CompileReport> {
        let Compilation {
            units,
            mut diagnostics,
        } = self.build(source);
        let emitter = Emitter::new(&self.config)?;
        let emit = emitter.emit(&units, sink, &mut diagnostics);
        info!(
            "Wrote {} artifacts ({} failed)",
            emit.written.len(),
            emit.failed.len()
        );
        Ok(CompileReport { diagnostics, emit })
    }
}
