//! Builds the procedure IR for every declaration in a session

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::ir::{
    Accessor, ArgBuild, ArgSeed, BuilderCall, FnRef, GeneratedModule, GroupBuild, GroupCall,
    InstanceArg, ModulePath, Procedure, ProcedureKind, SpecArg, Stmt, SubcommandOwner,
    WrapSource,
};
use super::naming;
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::model::{
    ArgDeclaration, ArgKind, Binding, CommandDeclaration, Declaration, DeclarationKind,
    OwningScope,
};
use crate::session::CompilationSession;
use crate::symbols::SymbolId;

/// Code synthesis over a resolved session
pub struct SynthesisEngine<'s, 'a> {
    session: &'s mut CompilationSession<'a>,
    failed: HashSet<SymbolId>,
    // Procedure-name suffix of each method-rooted declaration
    suffixes: HashMap<SymbolId, String>,
}

impl<'s, 'a> SynthesisEngine<'s, 'a> {
    pub fn new(session: &'s mut CompilationSession<'a>) -> Self {
        Self {
            session,
            failed: HashSet::new(),
            suffixes: HashMap::new(),
        }
    }

    /// One module per class-shaped declaration, in discovery order. Modules
    /// are flat here; the nesting assembler links them into trees.
    pub fn run(mut self) -> Vec<GeneratedModule> {
        self.check_method_bindings();
        self.assign_method_suffixes();

        let mut modules: BTreeMap<SymbolId, GeneratedModule> = BTreeMap::new();
        let mut order = Vec::new();
        for declaration in self.session.iter().filter(|d| d.is_class_shaped()) {
            let module = GeneratedModule {
                declaration: declaration.id().clone(),
                name: naming::module_name(declaration.simple_name(), self.session.config()),
                path: self.module_path(declaration.id()),
                visibility: declaration.visibility(),
                instance_type: declaration.type_path().to_string(),
                abstract_container: matches!(declaration, Declaration::SyntheticContainer(_)),
                procedures: Vec::new(),
                children: Vec::new(),
            };
            order.push(module.declaration.clone());
            modules.insert(module.declaration.clone(), module);
        }

        let commands: Vec<CommandDeclaration> = self.session.commands().cloned().collect();
        for decl in &commands {
            if self.failed.contains(&decl.id) {
                continue;
            }
            let procedures = self.procedures(decl);
            match modules.get_mut(decl.class()) {
                Some(module) => module.procedures.extend(procedures),
                None => self.session.report(
                    Diagnostic::error(format!("No module for class {}", decl.class()))
                        .at(&decl.id),
                ),
            }
        }

        debug!("Synthesized {} modules", modules.len());
        order
            .into_iter()
            .filter_map(|id| modules.remove(&id))
            .collect()
    }

    /// Method-rooted commands bind one exact method; a failed lookup drops
    /// that declaration and nothing else
    fn check_method_bindings(&mut self) {
        let symbols = self.session.symbols();
        let mut failures = Vec::new();
        for decl in self.session.commands() {
            if let DeclarationKind::MethodRooted {
                class,
                method,
                params,
            } = &decl.kind
                && let Err(e) = symbols.resolve_method(class, method, params)
            {
                failures.push(Error::UnresolvableMethod {
                    element: decl.id.clone(),
                    source: Box::new(e),
                });
            }
        }
        for failure in failures {
            if let Error::UnresolvableMethod { element, .. } = &failure {
                self.failed.insert(element.clone());
                let diagnostic = Diagnostic::error(failure.to_string()).at(element);
                self.session.report(diagnostic);
            }
        }
    }

    /// Overloads of one method get their parameter types in the suffix; a
    /// suffix that still collides within the class drops the later declaration
    fn assign_method_suffixes(&mut self) {
        let mut overloads: HashMap<(&SymbolId, &str), usize> = HashMap::new();
        for decl in self.session.commands() {
            if let DeclarationKind::MethodRooted { class, method, .. } = &decl.kind {
                *overloads.entry((class, method.as_str())).or_default() += 1;
            }
        }

        let mut taken: HashMap<(SymbolId, String), SymbolId> = HashMap::new();
        let mut collisions = Vec::new();
        for decl in self.session.commands() {
            let DeclarationKind::MethodRooted {
                class,
                method,
                params,
            } = &decl.kind
            else {
                continue;
            };
            if self.failed.contains(&decl.id) {
                continue;
            }
            let overloaded = overloads.get(&(class, method.as_str())).copied().unwrap_or(0) > 1;
            let suffix = naming::method_suffix(method, params, overloaded);
            match taken.get(&(class.clone(), suffix.clone())) {
                Some(first) => collisions.push((decl.id.clone(), first.clone(), suffix)),
                None => {
                    taken.insert((class.clone(), suffix.clone()), decl.id.clone());
                    self.suffixes.insert(decl.id.clone(), suffix);
                }
            }
        }

        for (element, first, suffix) in collisions {
            self.failed.insert(element.clone());
            self.session.report(
                Diagnostic::error(format!(
                    "Generated procedures `*_{suffix}` collide with those of {first}"
                ))
                .at(&element),
            );
        }
    }

    fn procedures(&mut self, decl: &CommandDeclaration) -> Vec<Procedure> {
        let mut procedures = Vec::new();
        if decl.is_command() {
            let create = self.create_cmd_spec(decl);
            procedures.push(create);
        }
        procedures.push(self.configure_all(decl));
        procedures.push(self.procedure(decl, ProcedureKind::ConfigureMixins, self.mixins(decl)));
        procedures.push(self.procedure(
            decl,
            ProcedureKind::ConfigureOptions,
            args(decl.direct_options()),
        ));
        procedures.push(self.procedure(
            decl,
            ProcedureKind::ConfigureParameters,
            args(decl.direct_positionals()),
        ));
        let groups = self.arg_groups(decl);
        procedures.push(self.procedure(decl, ProcedureKind::ConfigureArgGroups, groups));
        procedures.push(self.procedure(
            decl,
            ProcedureKind::ConfigureSpecs,
            decl.spec_injections
                .iter()
                .map(|point| Stmt::BindSpec {
                    field: point.field.clone(),
                })
                .collect(),
        ));
        procedures.push(self.procedure(
            decl,
            ProcedureKind::ConfigureParentCommands,
            decl.parent_injections
                .iter()
                .map(|point| Stmt::BindParent {
                    field: point.field.clone(),
                })
                .collect(),
        ));
        for binding in &decl.unmatched {
            self.session.report(
                Diagnostic::warning(format!(
                    "Unmatched-argument binding `{}` is not generated",
                    binding.field
                ))
                .at(&decl.id),
            );
        }
        procedures.push(self.procedure(decl, ProcedureKind::ConfigureUnmatcheds, Vec::new()));
        procedures
    }

    fn procedure(
        &self,
        decl: &CommandDeclaration,
        kind: ProcedureKind,
        body: Vec<Stmt>,
    ) -> Procedure {
        Procedure {
            element: decl.id.clone(),
            name: self.procedure_name(decl, kind),
            kind,
            instance_type: decl.type_path.clone(),
            body,
        }
    }

    fn create_cmd_spec(&mut self, decl: &CommandDeclaration) -> Procedure {
        let mut body = Vec::new();
        let method_rooted = match &decl.kind {
            DeclarationKind::ClassRooted => {
                body.push(Stmt::NewInstance);
                body.push(Stmt::WrapSpec(WrapSource::Instance));
                false
            }
            DeclarationKind::MethodRooted { method, params, .. } => {
                body.push(Stmt::ResolveMethod {
                    name: method.clone(),
                    params: params.clone(),
                });
                body.push(Stmt::WrapSpec(WrapSource::Method));
                true
            }
        };

        body.push(Stmt::SetName(decl.display_name().to_string()));
        if let Some(meta) = &decl.command
            && !meta.description.is_empty()
        {
            body.push(Stmt::SetDescription(meta.description.clone()));
        }

        for (name, sub) in &decl.subcommands {
            match self.subcommand(decl, name, sub) {
                Ok(stmt) => body.push(stmt),
                Err(e) => self
                    .session
                    .report(Diagnostic::error(e.to_string()).at(&decl.id)),
            }
        }

        body.push(Stmt::Configure {
            target: self.fn_ref(decl, ProcedureKind::ConfigureAll),
            spec: SpecArg::Spec,
            instance: InstanceArg::This,
        });
        body.push(Stmt::ReturnSpec);

        self.procedure(decl, ProcedureKind::CreateSpec { method_rooted }, body)
    }

    fn subcommand(&self, decl: &CommandDeclaration, name: &str, sub: &SymbolId) -> Result<Stmt> {
        let target = self
            .session
            .command(sub)
            .filter(|target| target.is_command())
            .ok_or_else(|| Error::UnsupportedElement {
                element: sub.clone(),
                kind: format!("subcommand `{name}` is not a command declaration"),
            })?;
        if self.failed.contains(sub) {
            return Err(Error::UnsupportedElement {
                element: sub.clone(),
                kind: format!("subcommand `{name}` failed to synthesize"),
            });
        }

        let owner = match &target.kind {
            DeclarationKind::ClassRooted => SubcommandOwner::None,
            DeclarationKind::MethodRooted { class, .. } if class == decl.class() => {
                SubcommandOwner::This
            }
            DeclarationKind::MethodRooted { .. } => SubcommandOwner::New(target.type_path.clone()),
        };
        Ok(Stmt::AddSubcommand {
            name: name.to_string(),
            factory: self.fn_ref(
                target,
                ProcedureKind::CreateSpec {
                    method_rooted: target.is_method_rooted(),
                },
            ),
            owner,
        })
    }

    /// Base configuration first, then each member kind in a fixed order
    fn configure_all(&self, decl: &CommandDeclaration) -> Procedure {
        let mut body = Vec::new();
        if let Some(parent) = decl.super_command.as_ref().and_then(|id| self.session.command(id)) {
            body.push(Stmt::Configure {
                target: self.fn_ref(parent, ProcedureKind::ConfigureAll),
                spec: SpecArg::Spec,
                instance: InstanceArg::Upcast(parent.type_path.clone()),
            });
        }

        let steps = [
            (ProcedureKind::ConfigureMixins, SpecArg::Spec),
            (ProcedureKind::ConfigureOptions, SpecArg::OptionSink),
            (ProcedureKind::ConfigureParameters, SpecArg::PositionalSink),
            (ProcedureKind::ConfigureArgGroups, SpecArg::Spec),
            (ProcedureKind::ConfigureSpecs, SpecArg::Spec),
            (ProcedureKind::ConfigureParentCommands, SpecArg::Spec),
            (ProcedureKind::ConfigureUnmatcheds, SpecArg::Spec),
        ];
        for (kind, spec) in steps {
            body.push(Stmt::Configure {
                target: self.fn_ref(decl, kind),
                spec,
                instance: InstanceArg::This,
            });
        }

        self.procedure(decl, ProcedureKind::ConfigureAll, body)
    }

    fn mixins(&self, decl: &CommandDeclaration) -> Vec<Stmt> {
        let symbols = self.session.symbols();
        decl.mixins
            .iter()
            .map(|(name, mixin)| {
                let configure = self
                    .session
                    .command(mixin)
                    .filter(|target| !self.failed.contains(&target.id))
                    .map(|target| self.fn_ref(target, ProcedureKind::ConfigureAll));
                Stmt::AddMixin {
                    name: name.clone(),
                    mixin_type: naming::type_path(symbols, mixin),
                    configure,
                }
            })
            .collect()
    }

    fn arg_groups(&mut self, decl: &CommandDeclaration) -> Vec<Stmt> {
        let mut body = Vec::new();
        for (i, group) in decl.arg_groups.iter().enumerate() {
            let Some(holder) = self.session.command(&group.group_type) else {
                self.session.report(
                    Diagnostic::error(format!(
                        "Arg group type {} has no declaration",
                        group.group_type
                    ))
                    .at(&decl.id),
                );
                continue;
            };

            let mut calls = Vec::new();
            calls.push(GroupCall::Exclusive(group.exclusive));
            if let Some(multiplicity) = &group.multiplicity {
                calls.push(GroupCall::Multiplicity(multiplicity.clone()));
            }
            if let Some(heading) = &group.heading {
                calls.push(GroupCall::Heading(heading.clone()));
            }

            body.push(Stmt::AddArgGroup(GroupBuild {
                var: format!("group{i}"),
                instance: format!("value{i}"),
                field: group.field.clone(),
                group_type: holder.type_path.clone(),
                calls,
                options: self.fn_ref(holder, ProcedureKind::ConfigureOptions),
                parameters: self.fn_ref(holder, ProcedureKind::ConfigureParameters),
            }));
        }
        body
    }

    fn fn_ref(&self, decl: &CommandDeclaration, kind: ProcedureKind) -> FnRef {
        FnRef {
            module: self.module_path(decl.class()),
            name: self.procedure_name(decl, kind),
        }
    }

    fn procedure_name(&self, decl: &CommandDeclaration, kind: ProcedureKind) -> String {
        let suffix = self.suffixes.get(&decl.id).map(String::as_str);
        naming::procedure_name(kind.base_name(), suffix)
    }

    /// Package segments of the root plus the module chain down to `id`
    fn module_path(&self, id: &SymbolId) -> ModulePath {
        let config = self.session.config();
        let mut chain = Vec::new();
        let mut package = None;
        let mut current = self.session.get(id);

        while let Some(declaration) = current {
            if chain.len() > self.session.len() {
                break;
            }
            chain.push(naming::module_name(declaration.simple_name(), config));
            match declaration.owner() {
                OwningScope::Declaration { id } => current = self.session.get(id),
                OwningScope::Root { package: root } => {
                    package = root.as_deref();
                    break;
                }
            }
        }

        let mut segments = naming::package_segments(package);
        segments.extend(chain.into_iter().rev());
        ModulePath(segments)
    }
}

fn args<'d>(direct: impl Iterator<Item = &'d ArgDeclaration>) -> Vec<Stmt> {
    direct
        .enumerate()
        .map(|(i, arg)| Stmt::AddArg(arg_build(i, arg)))
        .collect()
}

fn arg_build(i: usize, arg: &ArgDeclaration) -> ArgBuild {
    let (var, seed) = match &arg.kind {
        ArgKind::Option { names, .. } => (format!("opt{i}"), ArgSeed::Names(names.clone())),
        ArgKind::Positional { index } => (format!("pos{i}"), ArgSeed::Index(index.clone())),
    };

    let mut calls = Vec::new();
    if let ArgKind::Option {
        fallback_value,
        negatable,
        usage_help,
        ..
    } = &arg.kind
    {
        calls.push(BuilderCall::FallbackValue(fallback_value.clone()));
        calls.push(BuilderCall::Negatable(*negatable));
        calls.push(BuilderCall::UsageHelp(*usage_help));
    }

    calls.push(BuilderCall::Arity(arg.arity.clone()));
    calls.push(BuilderCall::Description(arg.description.clone()));
    calls.push(BuilderCall::HasInitialValue(arg.has_initial_value));
    calls.push(BuilderCall::Hidden(arg.hidden));
    calls.push(BuilderCall::Scope(arg.scope));
    calls.push(BuilderCall::Type(arg.type_info.name.clone()));
    calls.push(BuilderCall::AuxiliaryTypes(arg.type_info.aux.clone()));
    if let Some(default) = &arg.default_value {
        calls.push(BuilderCall::DefaultValue(default.clone()));
    }
    if let Some(fallback) = &arg.map_fallback_value {
        calls.push(BuilderCall::MapFallbackValue(fallback.clone()));
    }
    if let Some(preprocessor) = &arg.preprocessor {
        calls.push(BuilderCall::Preprocessor(preprocessor.clone()));
    }
    if let Some(consumer) = &arg.parameter_consumer {
        calls.push(BuilderCall::ParameterConsumer(consumer.clone()));
    }

    match &arg.binding {
        Binding::Field { name, .. } => {
            let field = Accessor::Field { name: name.clone() };
            calls.push(BuilderCall::Getter(field.clone()));
            calls.push(BuilderCall::Setter {
                target: field.clone(),
                previous: Some(field),
            });
        }
        Binding::Accessor { getter, setter, .. } => {
            let getter = getter.as_ref().map(|name| Accessor::Method { name: name.clone() });
            if let Some(getter) = &getter {
                calls.push(BuilderCall::Getter(getter.clone()));
            }
            if let Some(setter) = setter {
                calls.push(BuilderCall::Setter {
                    target: Accessor::Method {
                        name: setter.clone(),
                    },
                    previous: getter,
                });
            }
        }
        // Bound when the runtime invokes the method
        Binding::Parameter { .. } => {}
    }

    ArgBuild { var, seed, calls }
}

/// Synthesize every declaration in `session`
pub fn synthesize(session: &mut CompilationSession<'_>) -> Vec<GeneratedModule> {
    SynthesisEngine::new(session).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::model::{ScopeType, TypeInfo, Visibility};
    use crate::symbols::SymbolTable;

    fn option(owner: &str, field: &str, names: &[&str]) -> ArgDeclaration {
        ArgDeclaration {
            element: SymbolId::new(format!("{owner}#{field}")),
            owner: SymbolId::new(owner),
            binding: Binding::Field {
                name: field.to_string(),
                ty: "int".to_string(),
            },
            kind: ArgKind::Option {
                names: names.iter().map(|n| n.to_string()).collect(),
                fallback_value: String::new(),
                negatable: false,
                usage_help: false,
            },
            arity: "1".to_string(),
            description: vec!["Count".to_string()],
            type_info: TypeInfo {
                name: "int".to_string(),
                aux: vec![],
            },
            default_value: Some("3".to_string()),
            has_initial_value: true,
            hidden: false,
            scope: ScopeType::Local,
            map_fallback_value: None,
            preprocessor: None,
            parameter_consumer: None,
            inherited: false,
        }
    }

    fn command(id: &str) -> CommandDeclaration {
        CommandDeclaration {
            id: SymbolId::new(id),
            kind: DeclarationKind::ClassRooted,
            command: Some(crate::source::CommandMeta {
                name: id.to_lowercase(),
                description: vec![],
            }),
            owner: OwningScope::Root { package: None },
            simple_name: id.to_string(),
            type_path: format!("crate::{id}"),
            visibility: Visibility::Public,
            super_command: None,
            subcommands: vec![],
            mixins: vec![],
            options: vec![],
            positionals: vec![],
            arg_groups: vec![],
            spec_injections: vec![],
            parent_injections: vec![],
            unmatched: vec![],
        }
    }

    #[test]
    fn test_field_binding_gets_getter_and_setter() {
        let build = arg_build(0, &option("App", "count", &["-c"]));
        assert_eq!(build.var, "opt0");
        assert_eq!(build.seed, ArgSeed::Names(vec!["-c".to_string()]));
        assert!(build.calls.contains(&BuilderCall::DefaultValue("3".to_string())));
        assert!(build.calls.contains(&BuilderCall::Getter(Accessor::Field {
            name: "count".to_string()
        })));
        assert!(build.calls.iter().any(|call| matches!(
            call,
            BuilderCall::Setter { previous: Some(_), .. }
        )));
    }

    #[test]
    fn test_inherited_options_are_not_generated() {
        let symbols = SymbolTable::new();
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(&symbols, &config);

        let mut app = command("App");
        let mut inherited = option("Base", "verbose", &["-v"]);
        inherited.inherited = true;
        app.options = vec![option("App", "count", &["-c"]), inherited];
        session.insert(Declaration::Command(app));

        let modules = synthesize(&mut session);
        assert_eq!(modules.len(), 1);
        let options = modules[0]
            .procedure("configure_options")
            .expect("configure_options");
        assert_eq!(options.body.len(), 1);
    }

    #[test]
    fn test_configure_all_delegates_to_super_first() {
        let symbols = SymbolTable::new();
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(&symbols, &config);

        session.insert(Declaration::Command(command("Base")));
        let mut derived = command("Derived");
        derived.super_command = Some(SymbolId::new("Base"));
        session.insert(Declaration::Command(derived));

        let modules = synthesize(&mut session);
        let all = modules[1].procedure("configure_all").expect("configure_all");
        match &all.body[0] {
            Stmt::Configure {
                target, instance, ..
            } => {
                assert_eq!(target.module.to_string(), "base_cli_cfg");
                assert_eq!(target.name, "configure_all");
                assert_eq!(instance, &InstanceArg::Upcast("crate::Base".to_string()));
            }
            other => panic!("unexpected first statement {other:?}"),
        }
        assert_eq!(all.body.len(), 8);
    }

    #[test]
    fn test_unmatched_bindings_warn() {
        let symbols = SymbolTable::new();
        let config = GeneratorConfig::default();
        let mut session = CompilationSession::new(&symbols, &config);

        let mut app = command("App");
        app.unmatched = vec![crate::model::UnmatchedBinding {
            field: "rest".to_string(),
        }];
        session.insert(Declaration::Command(app));

        let modules = synthesize(&mut session);
        let unmatched = modules[0]
            .procedure("configure_unmatcheds")
            .expect("configure_unmatcheds");
        assert!(unmatched.body.is_empty());
        assert_eq!(
            session
                .diagnostics()
                .count(crate::diagnostics::Severity::Warning),
            1
        );
    }
}
