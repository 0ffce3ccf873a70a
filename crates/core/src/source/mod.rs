//! Declaration sources: what the host compiler knows about annotated elements
//!
//! A source exposes the symbol graph plus one statically-resolved
//! specification per annotated element. The shapes here mirror what a
//! front-end has already computed; the compiler only shape-checks them.

pub mod manifest;

use serde::{Deserialize, Serialize};

use crate::model::ScopeType;
use crate::symbols::{SymbolId, SymbolTable};

pub use manifest::ManifestSource;

/// Read-only access to the host's annotated elements
pub trait DeclarationSource {
    /// Symbol graph every element id resolves against
    fn symbols(&self) -> &SymbolTable;

    /// Annotated elements with their resolved specifications, in host order
    fn elements(&self) -> Box<dyn Iterator<Item = &CommandInput> + '_>;
}

/// Command annotation metadata; absent for mixin and group holders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMeta {
    pub name: String,
    #[serde(default)]
    pub description: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
    pub element: SymbolId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInput {
    pub element: SymbolId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandMeta>,
    #[serde(default)]
    pub subcommands: Vec<NamedRef>,
    #[serde(default)]
    pub mixins: Vec<NamedRef>,
    #[serde(default)]
    pub options: Vec<ArgInput>,
    #[serde(default)]
    pub positionals: Vec<ArgInput>,
    #[serde(default)]
    pub arg_groups: Vec<ArgGroupInput>,
    #[serde(default)]
    pub spec_elements: Vec<String>,
    #[serde(default)]
    pub parent_command_elements: Vec<String>,
    #[serde(default)]
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgCategory {
    Option,
    Positional,
    #[serde(other)]
    Unsupported,
}

/// One option or positional parameter as resolved by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgInput {
    /// Field, accessor method or method parameter carrying the annotation
    pub element: SymbolId,
    pub category: ArgCategory,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default = "default_arity")]
    pub arity: String,
    #[serde(default)]
    pub description: Vec<String>,
    pub type_name: String,
    #[serde(default)]
    pub aux_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub has_initial_value: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub scope: ScopeType,
    #[serde(default)]
    pub fallback_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_fallback_value: Option<String>,
    #[serde(default)]
    pub negatable: bool,
    #[serde(default)]
    pub usage_help: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_consumer: Option<String>,
    /// Getter method for accessor-backed args
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getter: Option<String>,
    /// Setter method for accessor-backed args; defaults to the annotated method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,
    #[serde(default)]
    pub inherited: bool,
}

fn default_arity() -> String {
    "1".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgGroupInput {
    #[serde(default)]
    pub args: Vec<ArgInput>,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
}
