//! Nesting assembly: flat generated modules → one tree per output artifact

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::diagnostics::Diagnostic;
use crate::model::OwningScope;
use crate::session::CompilationSession;
use crate::symbols::SymbolId;
use crate::synth::GeneratedModule;

/// A root-owned module tree and where its artifact goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputUnit {
    pub module: GeneratedModule,
    pub package: Option<String>,
}

impl OutputUnit {
    /// `<package dirs>/<module>.rs`
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.module.path.segments()
            [..self.module.path.segments().len().saturating_sub(1)]
            .iter()
            .collect();
        path.push(format!("{}.rs", self.module.name));
        path
    }

    pub fn element(&self) -> &SymbolId {
        &self.module.declaration
    }
}

pub struct NestingAssembler<'s, 'a> {
    session: &'s mut CompilationSession<'a>,
}

impl<'s, 'a> NestingAssembler<'s, 'a> {
    pub fn new(session: &'s mut CompilationSession<'a>) -> Self {
        Self { session }
    }

    /// Attach every module to its owner's module, deepest first, and return
    /// the root-owned trees. Trees without any procedure produce no output.
    pub fn run(self, modules: Vec<GeneratedModule>) -> Vec<OutputUnit> {
        let mut order: Vec<(usize, usize, SymbolId)> = modules
            .iter()
            .enumerate()
            .map(|(i, module)| {
                let depth = self.session.depth(&module.declaration);
                (depth, i, module.declaration.clone())
            })
            .collect();
        // Deepest first; discovery order within a depth
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut pending: HashMap<SymbolId, GeneratedModule> = modules
            .into_iter()
            .map(|module| (module.declaration.clone(), module))
            .collect();
        let mut roots = Vec::new();

        for (_, index, id) in order {
            let Some(module) = pending.remove(&id) else {
                continue;
            };
            let Some(declaration) = self.session.get(&id) else {
                continue;
            };
            match declaration.owner().clone() {
                OwningScope::Declaration { id: owner } => match pending.get_mut(&owner) {
                    Some(parent) => {
                        debug!("Nesting {} into {}", module.name, parent.name);
                        parent.children.push(module);
                    }
                    None => self.session.report(
                        Diagnostic::error(format!("Owner {owner} has no generated module"))
                            .at(&id),
                    ),
                },
                OwningScope::Root { package } => roots.push((index, package, module)),
            }
        }

        // Children were attached deepest first; restore discovery order
        roots.sort_by_key(|(index, _, _)| *index);
        let session = &*self.session;
        roots
            .into_iter()
            .map(|(_, package, mut module)| {
                sort_children(&mut module, session);
                OutputUnit { module, package }
            })
            .filter(|unit| has_procedures(&unit.module))
            .collect()
    }
}

fn sort_children(module: &mut GeneratedModule, session: &CompilationSession<'_>) {
    let position = |id: &SymbolId| session.ids().iter().position(|known| known == id);
    module.children.sort_by_key(|child| position(&child.declaration));
    for child in &mut module.children {
        sort_children(child, session);
    }
}

fn has_procedures(module: &GeneratedModule) -> bool {
    module.walk().iter().any(|m| !m.procedures.is_empty())
}

/// Assemble flat modules into output units
pub fn assemble(
    session: &mut CompilationSession<'_>,
    modules: Vec<GeneratedModule>,
) -> Vec<OutputUnit> {
    NestingAssembler::new(session).run(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::model::{Declaration, SyntheticContainer, Visibility};
    use crate::symbols::SymbolTable;
    use crate::synth::{ModulePath, Procedure, ProcedureKind};

    fn container(id: &str, owner: Option<&str>) -> Declaration {
        Declaration::SyntheticContainer(SyntheticContainer {
            id: SymbolId::new(id),
            owner: match owner {
                Some(owner) => OwningScope::Declaration {
                    id: SymbolId::new(owner),
                },
                None => OwningScope::Root {
                    package: Some("com.example".to_string()),
                },
            },
            simple_name: id.to_string(),
            type_path: format!("crate::{id}"),
            visibility: Visibility::Public,
        })
    }

    fn module(id: &str, with_procedure: bool) -> GeneratedModule {
        GeneratedModule {
            declaration: SymbolId::new(id),
            name: format!("{}_cli_cfg", id.to_lowercase()),
            path: ModulePath(vec![
                "com".to_string(),
                "example".to_string(),
                format!("{}_cli_cfg", id.to_lowercase()),
            ]),
            visibility: Visibility::Public,
            instance_type: format!("crate::{id}"),
            abstract_container: !with_procedure,
            procedures: if with_procedure {
                vec![Procedure {
                    element: SymbolId::new(id),
                    name: "configure_all".to_string(),
                    kind: ProcedureKind::ConfigureAll,
                    instance_type: format!("crate::{id}"),
                    body: Vec::new(),
                }]
            } else {
                Vec::new()
            },
            children: Vec::new(),
        }
    }

    #[test]
    fn test_nested_modules_collapse_into_one_unit() {
        let symbols = SymbolTable::new();
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(&symbols, &config);
        session.insert(container("A", None));
        session.insert(container("B", Some("A")));
        session.insert(container("C", Some("B")));

        let units = assemble(
            &mut session,
            vec![module("A", false), module("B", false), module("C", true)],
        );

        assert_eq!(units.len(), 1);
        let a = &units[0].module;
        let b = a.child("b_cli_cfg").expect("B nested in A");
        assert!(b.child("c_cli_cfg").is_some());
        assert_eq!(
            units[0].relative_path(),
            PathBuf::from("com/example/a_cli_cfg.rs")
        );
    }

    #[test]
    fn test_trees_without_procedures_are_not_emitted() {
        let symbols = SymbolTable::new();
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(&symbols, &config);
        session.insert(container("A", None));

        let units = assemble(&mut session, vec![module("A", false)]);
        assert!(units.is_empty());
    }
}
