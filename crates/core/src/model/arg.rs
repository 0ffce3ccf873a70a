use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    #[default]
    Local,
    Inherit,
}

/// How generated code reaches the value of an arg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "binding", rename_all = "snake_case")]
pub enum Binding {
    Field {
        name: String,
        ty: String,
    },
    Accessor {
        method: String,
        getter: Option<String>,
        setter: Option<String>,
    },
    /// Parameter of a method-rooted command; the runtime supplies it on invocation
    Parameter { name: String, ty: String },
}

impl Binding {
    pub fn member_name(&self) -> &str {
        match self {
            Binding::Field { name, .. } | Binding::Parameter { name, .. } => name,
            Binding::Accessor { method, .. } => method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ArgKind {
    Option {
        names: Vec<String>,
        fallback_value: String,
        negatable: bool,
        usage_help: bool,
    },
    Positional {
        index: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    pub aux: Vec<String>,
}

/// An option or positional parameter bound to a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDeclaration {
    pub element: SymbolId,
    /// Symbol that declares the binding (class, or method for parameters)
    pub owner: SymbolId,
    pub binding: Binding,
    pub kind: ArgKind,
    pub arity: String,
    pub description: Vec<String>,
    pub type_info: TypeInfo,
    pub default_value: Option<String>,
    pub has_initial_value: bool,
    pub hidden: bool,
    pub scope: ScopeType,
    pub map_fallback_value: Option<String>,
    pub preprocessor: Option<String>,
    pub parameter_consumer: Option<String>,
    pub inherited: bool,
}

impl ArgDeclaration {
    pub fn is_option(&self) -> bool {
        matches!(self.kind, ArgKind::Option { .. })
    }

    /// Declared directly on `declaration` rather than reached through inheritance
    pub fn is_direct_member_of(&self, declaration: &SymbolId) -> bool {
        !self.inherited && &self.owner == declaration
    }
}

/// A field whose value type is itself a bag of args
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgGroupDeclaration {
    pub field: String,
    pub group_type: SymbolId,
    pub exclusive: bool,
    pub multiplicity: Option<String>,
    pub heading: Option<String>,
}

/// Field receiving the live spec or the parent command's spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPoint {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedBinding {
    pub field: String,
}
