//! Procedure IR: the generated factory code as data
//!
//! The renderer turns it into Rust tokens and the replay runtime executes it,
//! so both always agree on what the emitted code does.

use serde::Serialize;
use std::fmt;

use crate::model::{ScopeType, Visibility};
use crate::symbols::SymbolId;

/// Module path below the configured module root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModulePath(pub Vec<String>);

impl ModulePath {
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("::"))
    }
}

/// Reference to a generated procedure in some module
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FnRef {
    pub module: ModulePath,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    CreateSpec { method_rooted: bool },
    ConfigureAll,
    ConfigureMixins,
    ConfigureOptions,
    ConfigureParameters,
    ConfigureArgGroups,
    ConfigureSpecs,
    ConfigureParentCommands,
    ConfigureUnmatcheds,
}

impl ProcedureKind {
    pub fn base_name(&self) -> &'static str {
        match self {
            ProcedureKind::CreateSpec { .. } => "create_cmd_spec",
            ProcedureKind::ConfigureAll => "configure_all",
            ProcedureKind::ConfigureMixins => "configure_mixins",
            ProcedureKind::ConfigureOptions => "configure_options",
            ProcedureKind::ConfigureParameters => "configure_parameters",
            ProcedureKind::ConfigureArgGroups => "configure_arg_groups",
            ProcedureKind::ConfigureSpecs => "configure_specs",
            ProcedureKind::ConfigureParentCommands => "configure_parent_commands",
            ProcedureKind::ConfigureUnmatcheds => "configure_unmatcheds",
        }
    }

    /// Configurators that take an append-only sink instead of a spec
    pub fn takes_sink(&self) -> bool {
        matches!(
            self,
            ProcedureKind::ConfigureOptions | ProcedureKind::ConfigureParameters
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    /// Declaration the procedure was synthesized for
    pub element: SymbolId,
    pub name: String,
    pub kind: ProcedureKind,
    /// Rust path of the instance type the procedure binds against
    pub instance_type: String,
    pub body: Vec<Stmt>,
}

/// What a configurator call passes as its first argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecArg {
    /// The command spec itself
    Spec,
    /// A sink appending options to the command spec
    OptionSink,
    /// A sink appending positionals to the command spec
    PositionalSink,
}

/// What a call passes as the bound instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceArg {
    /// The procedure's own instance
    This,
    /// The procedure's instance viewed as the given superclass
    Upcast(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapSource {
    Instance,
    Method,
}

/// Instance a method-rooted subcommand factory is invoked on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubcommandOwner {
    /// Class-rooted factories build their own instance
    None,
    This,
    /// A fresh instance of the given type
    New(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgSeed {
    Names(Vec<String>),
    Index(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessor {
    Field { name: String },
    Method { name: String },
}

/// One setter call on an arg-spec builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderCall {
    FallbackValue(String),
    Negatable(bool),
    UsageHelp(bool),
    Arity(String),
    Description(Vec<String>),
    HasInitialValue(bool),
    Hidden(bool),
    Scope(ScopeType),
    Type(String),
    AuxiliaryTypes(Vec<String>),
    DefaultValue(String),
    MapFallbackValue(String),
    Preprocessor(String),
    ParameterConsumer(String),
    Getter(Accessor),
    /// Setter bound to `target`; `previous` reads the value being replaced
    Setter {
        target: Accessor,
        previous: Option<Accessor>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgBuild {
    pub var: String,
    pub seed: ArgSeed,
    pub calls: Vec<BuilderCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupCall {
    Exclusive(bool),
    Multiplicity(String),
    Heading(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBuild {
    pub var: String,
    pub instance: String,
    pub field: String,
    pub group_type: String,
    pub calls: Vec<GroupCall>,
    pub options: FnRef,
    pub parameters: FnRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// `let obj = Bound::new(T::default());`
    NewInstance,
    /// Look up the exact method to bind, once
    ResolveMethod { name: String, params: Vec<String> },
    WrapSpec(WrapSource),
    SetName(String),
    SetDescription(Vec<String>),
    AddSubcommand {
        name: String,
        factory: FnRef,
        owner: SubcommandOwner,
    },
    Configure {
        target: FnRef,
        spec: SpecArg,
        instance: InstanceArg,
    },
    AddMixin {
        name: String,
        mixin_type: String,
        configure: Option<FnRef>,
    },
    AddArg(ArgBuild),
    AddArgGroup(GroupBuild),
    BindSpec { field: String },
    BindParent { field: String },
    ReturnSpec,
}

/// Synthesis output for one class-shaped declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedModule {
    pub declaration: SymbolId,
    pub name: String,
    pub path: ModulePath,
    pub visibility: Visibility,
    pub instance_type: String,
    /// Implicit container for a class without a declaration of its own
    pub abstract_container: bool,
    pub procedures: Vec<Procedure>,
    pub children: Vec<GeneratedModule>,
}

impl GeneratedModule {
    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&GeneratedModule> {
        self.children.iter().find(|c| c.name == name)
    }

    /// This module and every nested module, depth first
    pub fn walk(&self) -> Vec<&GeneratedModule> {
        let mut modules = vec![self];
        for child in &self.children {
            modules.extend(child.walk());
        }
        modules
    }
}
