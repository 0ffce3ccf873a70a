//! Executes generated procedures against the in-memory runtime

use std::collections::HashMap;

use tracing::trace;

use super::runtime::{ArgBinding, ArgSpec, CommandSpec, GroupSpec, Object, ObjectRef, Slot};
use crate::error::{Error, Result};
use crate::synth::ir::{
    ArgBuild, ArgSeed, BuilderCall, FnRef, GeneratedModule, GroupBuild, GroupCall, ModulePath,
    Procedure, SpecArg, Stmt, SubcommandOwner, WrapSource,
};

// Recursion guard for malformed IR
const MAX_CALL_DEPTH: usize = 256;

#[derive(Default)]
struct Frame {
    obj: Option<ObjectRef>,
    method: Option<String>,
    cs: Option<CommandSpec>,
    args: Vec<ArgSpec>,
}

impl Frame {
    fn obj(&self) -> Result<ObjectRef> {
        self.obj
            .clone()
            .ok_or_else(|| Error::ReplayError("no bound instance".to_string()))
    }

    fn spec(&mut self) -> Result<&mut CommandSpec> {
        self.cs
            .as_mut()
            .ok_or_else(|| Error::ReplayError("no command spec in scope".to_string()))
    }
}

/// Runs procedures of a set of generated modules
pub struct Replayer<'m> {
    procedures: HashMap<(ModulePath, String), &'m Procedure>,
}

impl<'m> Replayer<'m> {
    pub fn new(modules: &'m [GeneratedModule]) -> Self {
        let mut procedures = HashMap::new();
        for module in modules.iter().flat_map(GeneratedModule::walk) {
            for procedure in &module.procedures {
                procedures.insert((module.path.clone(), procedure.name.clone()), procedure);
            }
        }
        Self { procedures }
    }

    /// Build the spec a `create_cmd_spec` procedure returns. Method-rooted
    /// factories need the `owner` instance.
    pub fn create_spec(
        &self,
        module: &ModulePath,
        name: &str,
        owner: Option<ObjectRef>,
    ) -> Result<CommandSpec> {
        let target = FnRef {
            module: module.clone(),
            name: name.to_string(),
        };
        self.create(&target, owner, 0)
    }

    fn lookup(&self, target: &FnRef) -> Result<&'m Procedure> {
        self.procedures
            .get(&(target.module.clone(), target.name.clone()))
            .copied()
            .ok_or_else(|| {
                let name = format!("{}::{}", target.module, target.name);
                Error::ReplayError(format!("unknown procedure {name}"))
            })
    }

    fn create(
        &self,
        target: &FnRef,
        owner: Option<ObjectRef>,
        depth: usize,
    ) -> Result<CommandSpec> {
        let frame = Frame {
            obj: owner,
            ..Default::default()
        };
        let frame = self.run(target, frame, depth)?;
        frame
            .cs
            .ok_or_else(|| Error::ReplayError(format!("{} returned no spec", target.name)))
    }

    fn configure(
        &self,
        target: &FnRef,
        cs: CommandSpec,
        obj: ObjectRef,
        depth: usize,
    ) -> Result<CommandSpec> {
        let frame = Frame {
            obj: Some(obj),
            cs: Some(cs),
            ..Default::default()
        };
        let frame = self.run(target, frame, depth)?;
        frame
            .cs
            .ok_or_else(|| Error::ReplayError(format!("{} dropped its spec", target.name)))
    }

    /// Args a sink-taking configurator appends
    fn collect_args(&self, target: &FnRef, obj: ObjectRef, depth: usize) -> Result<Vec<ArgSpec>> {
        let frame = Frame {
            obj: Some(obj),
            ..Default::default()
        };
        Ok(self.run(target, frame, depth)?.args)
    }

    fn run(&self, target: &FnRef, mut frame: Frame, depth: usize) -> Result<Frame> {
        if depth > MAX_CALL_DEPTH {
            return Err(Error::ReplayError(format!(
                "call depth exceeded at {}",
                target.name
            )));
        }
        let procedure = self.lookup(target)?;
        trace!("Replaying {}::{}", target.module, procedure.name);

        for stmt in &procedure.body {
            match stmt {
                Stmt::NewInstance => {
                    frame.obj = Some(Object::new_ref(&procedure.instance_type));
                }
                Stmt::ResolveMethod { name, .. } => frame.method = Some(name.clone()),
                Stmt::WrapSpec(source) => {
                    let method = match source {
                        WrapSource::Instance => None,
                        WrapSource::Method => frame.method.clone(),
                    };
                    frame.cs = Some(CommandSpec::wrap(frame.obj()?, method));
                }
                Stmt::SetName(name) => frame.spec()?.name = name.clone(),
                Stmt::SetDescription(lines) => frame.spec()?.description = lines.clone(),
                Stmt::AddSubcommand {
                    name,
                    factory,
                    owner,
                } => {
                    let owner = match owner {
                        SubcommandOwner::None => None,
                        SubcommandOwner::This => Some(frame.obj()?),
                        SubcommandOwner::New(ty) => Some(Object::new_ref(ty)),
                    };
                    let sub = self.create(factory, owner, depth + 1)?;
                    frame.spec()?.add_subcommand(name.clone(), sub);
                }
                Stmt::Configure { target, spec, .. } => {
                    let obj = frame.obj()?;
                    match spec {
                        SpecArg::Spec => {
                            let cs = frame.cs.take().ok_or_else(|| {
                                Error::ReplayError("no command spec in scope".to_string())
                            })?;
                            frame.cs = Some(self.configure(target, cs, obj, depth + 1)?);
                        }
                        SpecArg::OptionSink => {
                            for arg in self.collect_args(target, obj, depth + 1)? {
                                frame.spec()?.add_option(arg);
                            }
                        }
                        SpecArg::PositionalSink => {
                            for arg in self.collect_args(target, obj, depth + 1)? {
                                frame.spec()?.add_positional(arg);
                            }
                        }
                    }
                }
                Stmt::AddMixin {
                    name,
                    mixin_type,
                    configure,
                } => {
                    let mixin = Object::new_ref(mixin_type);
                    frame
                        .obj()?
                        .borrow_mut()
                        .set_slot(name.clone(), Slot::Object(mixin.clone()));
                    let mut spec = CommandSpec::wrap(mixin.clone(), None);
                    spec.name = name.clone();
                    if let Some(target) = configure {
                        spec = self.configure(target, spec, mixin, depth + 1)?;
                    }
                    frame.spec()?.add_mixin(name.clone(), spec);
                }
                Stmt::AddArg(build) => {
                    let arg = build_arg(build, frame.obj()?);
                    frame.args.push(arg);
                }
                Stmt::AddArgGroup(group) => {
                    let spec = self.group(group, frame.obj()?, depth)?;
                    frame.spec()?.add_group(spec);
                }
                Stmt::BindSpec { field } => {
                    let name = frame.spec()?.name.clone();
                    frame
                        .obj()?
                        .borrow_mut()
                        .set_slot(field.clone(), Slot::Spec(name));
                }
                Stmt::BindParent { field } => {
                    let obj = frame.obj()?;
                    frame.spec()?.add_parent_injection(obj, field.clone());
                }
                Stmt::ReturnSpec => break,
            }
        }
        Ok(frame)
    }

    fn group(&self, group: &GroupBuild, owner: ObjectRef, depth: usize) -> Result<GroupSpec> {
        let value = Object::new_ref(&group.group_type);
        owner
            .borrow_mut()
            .set_slot(group.field.clone(), Slot::Object(value.clone()));

        let mut spec = GroupSpec::default();
        for call in &group.calls {
            match call {
                GroupCall::Exclusive(exclusive) => spec.exclusive = *exclusive,
                GroupCall::Multiplicity(multiplicity) => {
                    spec.multiplicity = Some(multiplicity.clone())
                }
                GroupCall::Heading(heading) => spec.heading = Some(heading.clone()),
            }
        }
        spec.args = self.collect_args(&group.options, value.clone(), depth + 1)?;
        spec.args
            .extend(self.collect_args(&group.parameters, value, depth + 1)?);
        Ok(spec)
    }
}

fn build_arg(build: &ArgBuild, obj: ObjectRef) -> ArgSpec {
    let mut arg = ArgSpec::default();
    match &build.seed {
        ArgSeed::Names(names) => arg.names = names.clone(),
        ArgSeed::Index(index) => arg.index = Some(index.clone()),
    }

    let mut getter = None;
    let mut setter = None;
    let mut previous = None;
    for call in &build.calls {
        match call {
            BuilderCall::FallbackValue(value) => arg.fallback_value = Some(value.clone()),
            BuilderCall::Negatable(negatable) => arg.negatable = *negatable,
            BuilderCall::UsageHelp(usage_help) => arg.usage_help = *usage_help,
            BuilderCall::Arity(arity) => arg.arity = arity.clone(),
            BuilderCall::Description(lines) => arg.description = lines.clone(),
            BuilderCall::HasInitialValue(value) => arg.has_initial_value = *value,
            BuilderCall::Hidden(hidden) => arg.hidden = *hidden,
            BuilderCall::Scope(scope) => arg.scope = *scope,
            BuilderCall::Type(ty) => arg.type_name = ty.clone(),
            BuilderCall::AuxiliaryTypes(types) => arg.auxiliary_types = types.clone(),
            BuilderCall::DefaultValue(value) => arg.default_value = Some(value.clone()),
            BuilderCall::MapFallbackValue(value) => arg.map_fallback_value = Some(value.clone()),
            BuilderCall::Preprocessor(ty) => arg.preprocessor = Some(ty.clone()),
            BuilderCall::ParameterConsumer(ty) => arg.parameter_consumer = Some(ty.clone()),
            BuilderCall::Getter(accessor) => getter = Some(accessor.clone()),
            BuilderCall::Setter {
                target,
                previous: read,
            } => {
                setter = Some(target.clone());
                previous = read.clone();
            }
        }
    }

    if getter.is_some() || setter.is_some() {
        arg.binding = Some(ArgBinding {
            object: obj,
            getter,
            setter,
            previous,
        });
    }
    arg
}
