//! Symbol graph extraction: annotated elements → declaration model

use tracing::debug;

use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::model::{
    ArgDeclaration, ArgGroupDeclaration, ArgKind, Binding, CommandDeclaration, Declaration,
    DeclarationKind, InjectionPoint, OwningScope, SyntheticContainer, TypeInfo, UnmatchedBinding,
    Visibility,
};
use crate::session::CompilationSession;
use crate::source::{ArgCategory, ArgGroupInput, ArgInput, CommandInput, DeclarationSource};
use crate::symbols::{Symbol, SymbolId, SymbolKind, erasure};
use crate::synth::naming;

// Owner chains longer than this are treated as malformed
const MAX_NESTING: usize = 64;

/// Builds declarations for every element of a source into the session
pub struct Extractor<'s, 'a> {
    session: &'s mut CompilationSession<'a>,
    pending_groups: Vec<(SymbolId, ArgGroupInput)>,
}

impl<'s, 'a> Extractor<'s, 'a> {
    pub fn new(session: &'s mut CompilationSession<'a>) -> Self {
        Self {
            session,
            pending_groups: Vec::new(),
        }
    }

    pub fn run(mut self, source: &dyn DeclarationSource) {
        for input in source.elements() {
            if let Err(e) = self.extract_element(input) {
                self.session
                    .report(Diagnostic::error(e.to_string()).at(&input.element));
            }
        }
        self.materialize_group_holders();
        debug!("Extracted {} declarations", self.session.len());
    }

    fn extract_element(&mut self, input: &CommandInput) -> Result<()> {
        let symbols = self.session.symbols();
        let symbol = symbols.require(&input.element)?;

        if self.session.command(&input.element).is_some() {
            self.session.report(
                Diagnostic::warning("Element declared more than once; keeping the first")
                    .at(&input.element),
            );
            return Ok(());
        }

        let declaration = match &symbol.kind {
            SymbolKind::Class { .. } => {
                let owner = self.enclosing_scope(symbol.owner.as_ref(), 0);
                self.declaration(symbol, input, DeclarationKind::ClassRooted, owner)
            }
            SymbolKind::Method { params } => {
                let class = symbol
                    .owner
                    .as_ref()
                    .and_then(|owner| symbols.get(owner))
                    .filter(|owner| owner.is_class())
                    .ok_or_else(|| Error::UnsupportedElement {
                        element: symbol.id.clone(),
                        kind: "method outside a class".to_string(),
                    })?;
                self.ensure_container(class, 0);
                let kind = DeclarationKind::MethodRooted {
                    class: class.id.clone(),
                    method: symbol.name.clone(),
                    params: params.iter().map(|p| erasure(p)).collect(),
                };
                let owner = OwningScope::Declaration {
                    id: class.id.clone(),
                };
                self.declaration(symbol, input, kind, owner)
            }
            other => {
                return Err(Error::UnsupportedElement {
                    element: symbol.id.clone(),
                    kind: other.describe().to_string(),
                });
            }
        };

        debug!("Declared {} ({:?})", declaration.id, declaration.kind);
        self.session.insert(Declaration::Command(declaration));
        Ok(())
    }

    fn declaration(
        &mut self,
        symbol: &Symbol,
        input: &CommandInput,
        kind: DeclarationKind,
        owner: OwningScope,
    ) -> CommandDeclaration {
        let symbols = self.session.symbols();
        let class_id = match &kind {
            DeclarationKind::ClassRooted => symbol.id.clone(),
            DeclarationKind::MethodRooted { class, .. } => class.clone(),
        };
        let class_symbol = symbols.get(&class_id).unwrap_or(symbol);

        let options = self.args(&input.options, ArgCategory::Option);
        let positionals = self.args(&input.positionals, ArgCategory::Positional);

        let arg_groups = match kind {
            DeclarationKind::ClassRooted => self.arg_groups(&symbol.id, &input.arg_groups),
            DeclarationKind::MethodRooted { .. } => {
                if !input.arg_groups.is_empty() {
                    self.session.report(
                        Diagnostic::error("Arg groups on method-rooted commands are not supported")
                            .at(&symbol.id),
                    );
                }
                Vec::new()
            }
        };

        let mixins = input
            .mixins
            .iter()
            .filter(|mixin| self.check_identifier(&mixin.name, &symbol.id))
            .map(|mixin| (mixin.name.clone(), mixin.element.clone()))
            .collect();

        CommandDeclaration {
            id: symbol.id.clone(),
            command: input.command.clone(),
            owner,
            simple_name: symbol.name.clone(),
            type_path: naming::type_path(symbols, &class_id),
            visibility: if class_symbol.is_public() {
                Visibility::Public
            } else {
                Visibility::Crate
            },
            super_command: None,
            subcommands: input
                .subcommands
                .iter()
                .map(|sub| (sub.name.clone(), sub.element.clone()))
                .collect(),
            mixins,
            options,
            positionals,
            arg_groups,
            spec_injections: self.injections(&input.spec_elements, &symbol.id),
            parent_injections: self.injections(&input.parent_command_elements, &symbol.id),
            unmatched: input
                .unmatched
                .iter()
                .filter(|field| self.check_identifier(field, &symbol.id))
                .map(|field| UnmatchedBinding {
                    field: field.clone(),
                })
                .collect(),
            kind,
        }
    }

    fn args(&mut self, inputs: &[ArgInput], expected: ArgCategory) -> Vec<ArgDeclaration> {
        let mut args = Vec::with_capacity(inputs.len());
        for input in inputs {
            match self.arg(input, expected) {
                Ok(arg) => args.push(arg),
                Err(e) => self
                    .session
                    .report(Diagnostic::error(e.to_string()).at(&input.element)),
            }
        }
        args
    }

    fn arg(&self, input: &ArgInput, expected: ArgCategory) -> Result<ArgDeclaration> {
        if input.category != expected {
            return Err(Error::UnsupportedArgSpec {
                element: input.element.clone(),
                category: format!("{:?}", input.category).to_lowercase(),
            });
        }

        let symbol = self.session.symbols().require(&input.element)?;
        let owner = symbol
            .owner
            .clone()
            .ok_or_else(|| Error::UnknownSymbol(input.element.clone()))?;

        let binding = match &symbol.kind {
            SymbolKind::Field { ty, .. } => Binding::Field {
                name: symbol.name.clone(),
                ty: ty.clone(),
            },
            // A zero-arg annotated method is the getter, otherwise the setter
            SymbolKind::Method { params } if params.is_empty() => Binding::Accessor {
                method: symbol.name.clone(),
                getter: input.getter.clone().or_else(|| Some(symbol.name.clone())),
                setter: input.setter.clone(),
            },
            SymbolKind::Method { .. } => Binding::Accessor {
                method: symbol.name.clone(),
                getter: input.getter.clone(),
                setter: input.setter.clone().or_else(|| Some(symbol.name.clone())),
            },
            SymbolKind::Parameter { ty } => Binding::Parameter {
                name: symbol.name.clone(),
                ty: ty.clone(),
            },
            other => {
                return Err(Error::UnsupportedElement {
                    element: symbol.id.clone(),
                    kind: other.describe().to_string(),
                });
            }
        };

        let mut members = vec![binding.member_name()];
        if let Binding::Accessor { getter, setter, .. } = &binding {
            members.extend(getter.as_deref());
            members.extend(setter.as_deref());
        }
        if let Some(bad) = members.into_iter().find(|m| !naming::is_identifier(m)) {
            return Err(Error::InvalidIdentifier(bad.to_string()));
        }

        let kind = match expected {
            ArgCategory::Option => {
                if input.names.is_empty() {
                    return Err(Error::UnsupportedArgSpec {
                        element: input.element.clone(),
                        category: "option without names".to_string(),
                    });
                }
                ArgKind::Option {
                    names: input.names.clone(),
                    fallback_value: input.fallback_value.clone(),
                    negatable: input.negatable,
                    usage_help: input.usage_help,
                }
            }
            _ => ArgKind::Positional {
                index: input.index.clone().unwrap_or_else(|| "0..*".to_string()),
            },
        };

        Ok(ArgDeclaration {
            element: input.element.clone(),
            owner,
            binding,
            kind,
            arity: input.arity.clone(),
            description: input.description.clone(),
            type_info: TypeInfo {
                name: input.type_name.clone(),
                aux: input.aux_types.clone(),
            },
            default_value: input.default_value.clone(),
            has_initial_value: input.has_initial_value,
            hidden: input.hidden,
            scope: input.scope,
            map_fallback_value: input.map_fallback_value.clone(),
            preprocessor: input.preprocessor.clone(),
            parameter_consumer: input.parameter_consumer.clone(),
            inherited: input.inherited,
        })
    }

    /// Associate each group with the arg-group fields of the command class
    /// whose declared type is the group's value type
    fn arg_groups(
        &mut self,
        class: &SymbolId,
        groups: &[ArgGroupInput],
    ) -> Vec<ArgGroupDeclaration> {
        let symbols = self.session.symbols();
        let mut declarations = Vec::new();

        for group in groups {
            let Some(first) = group.args.first() else {
                self.session
                    .report(Diagnostic::warning("Skipping arg group without args").at(class));
                continue;
            };
            let Some(group_type) = symbols.get(&first.element).and_then(|s| s.owner.clone())
            else {
                self.session.report(
                    Diagnostic::error(format!(
                        "Cannot determine the value type of the arg group containing {}",
                        first.element
                    ))
                    .at(class),
                );
                continue;
            };

            let fields: Vec<&Symbol> = symbols
                .fields_of(class)
                .into_iter()
                .filter(|field| {
                    matches!(&field.kind, SymbolKind::Field { ty, arg_group: true }
                        if erasure(ty) == group_type.as_str())
                })
                .collect();
            if fields.is_empty() {
                self.session.report(
                    Diagnostic::warning(format!("No arg-group field of type {group_type}"))
                        .at(class),
                );
                continue;
            }

            for field in fields {
                declarations.push(ArgGroupDeclaration {
                    field: field.name.clone(),
                    group_type: group_type.clone(),
                    exclusive: group.exclusive,
                    multiplicity: group.multiplicity.clone(),
                    heading: group.heading.clone(),
                });
            }
            self.pending_groups.push((group_type, group.clone()));
        }

        declarations
    }

    /// Group value types need configurators of their own; declare the ones
    /// the source did not list as elements
    fn materialize_group_holders(&mut self) {
        for (group_type, group) in std::mem::take(&mut self.pending_groups) {
            if self.session.command(&group_type).is_some() {
                continue;
            }
            let (options, positionals): (Vec<ArgInput>, Vec<ArgInput>) = group
                .args
                .iter()
                .cloned()
                .partition(|arg| arg.category == ArgCategory::Option);
            let input = CommandInput {
                element: group_type.clone(),
                options,
                positionals,
                ..Default::default()
            };
            debug!("Declaring arg group holder {}", group_type);
            if let Err(e) = self.extract_element(&input) {
                self.session
                    .report(Diagnostic::error(e.to_string()).at(&group_type));
            }
        }
    }

    fn injections(&mut self, fields: &[String], element: &SymbolId) -> Vec<InjectionPoint> {
        fields
            .iter()
            .filter(|field| self.check_identifier(field, element))
            .map(|field| InjectionPoint {
                field: field.clone(),
            })
            .collect()
    }

    fn check_identifier(&mut self, name: &str, element: &SymbolId) -> bool {
        let valid = naming::is_identifier(name);
        if !valid {
            let message = Error::InvalidIdentifier(name.to_string()).to_string();
            self.session.report(Diagnostic::error(message).at(element));
        }
        valid
    }

    fn enclosing_scope(&mut self, owner: Option<&SymbolId>, depth: usize) -> OwningScope {
        let symbols = self.session.symbols();
        let Some(owner) = owner.and_then(|id| symbols.get(id)) else {
            return OwningScope::Root { package: None };
        };
        if depth > MAX_NESTING {
            return OwningScope::Root { package: None };
        }
        match &owner.kind {
            SymbolKind::Package => OwningScope::Root {
                package: Some(owner.id.as_str().to_string()),
            },
            SymbolKind::Class { .. } => {
                self.ensure_container(owner, depth + 1);
                OwningScope::Declaration {
                    id: owner.id.clone(),
                }
            }
            // Local classes hang off the nearest enclosing class or package
            _ => self.enclosing_scope(owner.owner.as_ref(), depth + 1),
        }
    }

    fn ensure_container(&mut self, class: &Symbol, depth: usize) {
        if self.session.contains(&class.id) {
            return;
        }
        let owner = self.enclosing_scope(class.owner.as_ref(), depth);
        let type_path = naming::type_path(self.session.symbols(), &class.id);
        debug!("Creating synthetic container for {}", class.id);
        self.session
            .insert(Declaration::SyntheticContainer(SyntheticContainer {
                id: class.id.clone(),
                owner,
                simple_name: class.name.clone(),
                type_path,
                visibility: if class.is_public() {
                    Visibility::Public
                } else {
                    Visibility::Crate
                },
            }));
    }
}

/// Extract every element of `source` into `session`
pub fn extract(session: &mut CompilationSession<'_>, source: &dyn DeclarationSource) {
    Extractor::new(session).run(source);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::diagnostics::Severity;
    use crate::source::ManifestSource;
    use serde_json::{Value, json};

    fn source(elements: Value) -> ManifestSource {
        ManifestSource::from_value(json!({
            "symbols": [
                { "id": "demo", "name": "demo", "kind": "package" },
                { "id": "demo.Tool", "name": "Tool", "owner": "demo", "modifiers": ["public"], "kind": "class" },
                { "id": "demo.Tool.level", "name": "level", "owner": "demo.Tool", "kind": "field", "ty": "int" },
                { "id": "demo.Tool.run", "name": "run", "owner": "demo.Tool", "kind": "method", "params": ["java.util.List<String>"] }
            ],
            "elements": elements
        }))
        .unwrap()
    }

    fn extracted(source: &ManifestSource, config: &GeneratorConfig) -> (Vec<SymbolId>, Vec<Severity>) {
        let mut session = CompilationSession::new(source.symbols(), config);
        extract(&mut session, source);
        let severities = session
            .diagnostics()
            .entries()
            .iter()
            .map(|d| d.severity)
            .collect();
        (session.ids().to_vec(), severities)
    }

    #[test]
    fn test_unsupported_element_is_skipped() {
        let source = source(json!([
            { "element": "demo.Tool.level", "command": { "name": "level" } },
            { "element": "demo.Tool", "command": { "name": "tool" } }
        ]));
        let config = GeneratorConfig::default();
        let (ids, severities) = extracted(&source, &config);

        assert_eq!(ids, vec![SymbolId::new("demo.Tool")]);
        assert_eq!(severities, vec![Severity::Error]);
    }

    #[test]
    fn test_duplicate_element_keeps_first() {
        let source = source(json!([
            { "element": "demo.Tool", "command": { "name": "tool" } },
            { "element": "demo.Tool", "command": { "name": "other" } }
        ]));
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(source.symbols(), &config);
        extract(&mut session, &source);

        let tool = session.command(&SymbolId::new("demo.Tool")).unwrap();
        assert_eq!(tool.command.as_ref().unwrap().name, "tool");
        assert_eq!(session.diagnostics().count(Severity::Warning), 1);
    }

    #[test]
    fn test_method_command_creates_container() {
        let source = source(json!([
            { "element": "demo.Tool.run", "command": { "name": "run" } }
        ]));
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(source.symbols(), &config);
        extract(&mut session, &source);

        let container = session.get(&SymbolId::new("demo.Tool")).unwrap();
        assert!(matches!(container, Declaration::SyntheticContainer(_)));

        let run = session.command(&SymbolId::new("demo.Tool.run")).unwrap();
        assert_eq!(
            run.owner,
            OwningScope::Declaration {
                id: SymbolId::new("demo.Tool")
            }
        );
        match &run.kind {
            DeclarationKind::MethodRooted { params, .. } => {
                assert_eq!(params, &vec!["java.util.List".to_string()])
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_wrong_arg_category_is_reported() {
        let source = source(json!([{
            "element": "demo.Tool",
            "command": { "name": "tool" },
            "options": [
                { "element": "demo.Tool.level", "category": "positional", "type_name": "int" }
            ]
        }]));
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(source.symbols(), &config);
        extract(&mut session, &source);

        let tool = session.command(&SymbolId::new("demo.Tool")).unwrap();
        assert!(tool.options.is_empty());
        assert_eq!(session.diagnostics().count(Severity::Error), 1);
    }
}
