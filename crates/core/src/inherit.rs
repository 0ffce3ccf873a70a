//! Inheritance resolution across class-rooted declarations

use std::collections::HashSet;

use tracing::debug;

use crate::diagnostics::Diagnostic;
use crate::model::DeclarationKind;
use crate::session::CompilationSession;
use crate::symbols::SymbolId;

/// Nearest ancestor of `class` that is itself a command declaration.
/// Non-command ancestors are skipped; `None` at the root of the hierarchy.
pub fn super_command(session: &CompilationSession<'_>, class: &SymbolId) -> Option<SymbolId> {
    let symbols = session.symbols();
    let mut visited = HashSet::from([class.clone()]);
    let mut current = symbols.superclass(class);

    while let Some(ancestor) = current {
        if !visited.insert(ancestor.clone()) {
            return None;
        }
        if session.command(ancestor).is_some() {
            return Some(ancestor.clone());
        }
        current = symbols.superclass(ancestor);
    }
    None
}

/// Annotate every class-rooted declaration with its superCommand link
pub fn resolve_super_commands(session: &mut CompilationSession<'_>) {
    let class_rooted: Vec<SymbolId> = session
        .commands()
        .filter(|decl| decl.kind == DeclarationKind::ClassRooted)
        .map(|decl| decl.id.clone())
        .collect();

    for id in class_rooted {
        let resolved = super_command(session, &id);
        if resolved.is_none() && has_superclass_cycle(session, &id) {
            session.report(
                Diagnostic::warning("Superclass chain contains a cycle; inheritance ignored")
                    .at(&id),
            );
        }
        if let Some(parent) = &resolved {
            debug!("{} inherits configuration from {}", id, parent);
        }
        if let Some(decl) = session.command_mut(&id) {
            decl.super_command = resolved;
        }
    }
}

fn has_superclass_cycle(session: &CompilationSession<'_>, class: &SymbolId) -> bool {
    let symbols = session.symbols();
    let mut visited = HashSet::from([class.clone()]);
    let mut current = symbols.superclass(class);
    while let Some(ancestor) = current {
        if !visited.insert(ancestor.clone()) {
            return true;
        }
        current = symbols.superclass(ancestor);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::extract::extract;
    use crate::source::{DeclarationSource, ManifestSource};
    use serde_json::json;

    fn hierarchy(commands: &[&str], cycle: bool) -> ManifestSource {
        let root_super = if cycle { json!("demo.C") } else { json!(null) };
        let elements: Vec<_> = commands
            .iter()
            .map(|id| json!({ "element": id, "command": { "name": id.to_lowercase() } }))
            .collect();
        ManifestSource::from_value(json!({
            "symbols": [
                { "id": "demo", "name": "demo", "kind": "package" },
                { "id": "demo.A", "name": "A", "owner": "demo", "kind": "class", "superclass": root_super },
                { "id": "demo.B", "name": "B", "owner": "demo", "kind": "class", "superclass": "demo.A" },
                { "id": "demo.C", "name": "C", "owner": "demo", "kind": "class", "superclass": "demo.B" }
            ],
            "elements": elements
        }))
        .unwrap()
    }

    #[test]
    fn test_non_command_ancestors_are_skipped() {
        let source = hierarchy(&["demo.A", "demo.C"], false);
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(source.symbols(), &config);
        extract(&mut session, &source);
        resolve_super_commands(&mut session);

        let c = session.command(&SymbolId::new("demo.C")).unwrap();
        assert_eq!(c.super_command, Some(SymbolId::new("demo.A")));
        let a = session.command(&SymbolId::new("demo.A")).unwrap();
        assert_eq!(a.super_command, None);
    }

    #[test]
    fn test_superclass_cycle_is_reported() {
        let source = hierarchy(&["demo.C"], true);
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(source.symbols(), &config);
        extract(&mut session, &source);
        resolve_super_commands(&mut session);

        assert_eq!(session.command(&SymbolId::new("demo.C")).unwrap().super_command, None);
        assert_eq!(session.diagnostics().count(crate::Severity::Warning), 1);
    }
}
