use serde::{Deserialize, Serialize};

use super::arg::{
    ArgDeclaration, ArgGroupDeclaration, InjectionPoint, UnmatchedBinding,
};
use crate::source::CommandMeta;
use crate::symbols::SymbolId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclarationKind {
    ClassRooted,
    MethodRooted {
        class: SymbolId,
        method: String,
        params: Vec<String>,
    },
}

/// Where a declaration lives: inside another declaration or at the root namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum OwningScope {
    Root { package: Option<String> },
    Declaration { id: SymbolId },
}

impl OwningScope {
    pub fn declaration(&self) -> Option<&SymbolId> {
        match self {
            OwningScope::Declaration { id } => Some(id),
            OwningScope::Root { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Crate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDeclaration {
    pub id: SymbolId,
    pub kind: DeclarationKind,
    /// Present when the element is annotated as a command, not just a holder
    pub command: Option<CommandMeta>,
    pub owner: OwningScope,
    pub simple_name: String,
    pub type_path: String,
    pub visibility: Visibility,
    pub super_command: Option<SymbolId>,
    pub subcommands: Vec<(String, SymbolId)>,
    pub mixins: Vec<(String, SymbolId)>,
    pub options: Vec<ArgDeclaration>,
    pub positionals: Vec<ArgDeclaration>,
    pub arg_groups: Vec<ArgGroupDeclaration>,
    pub spec_injections: Vec<InjectionPoint>,
    pub parent_injections: Vec<InjectionPoint>,
    pub unmatched: Vec<UnmatchedBinding>,
}

impl CommandDeclaration {
    pub fn is_command(&self) -> bool {
        self.command.is_some()
    }

    pub fn is_method_rooted(&self) -> bool {
        matches!(self.kind, DeclarationKind::MethodRooted { .. })
    }

    /// Class whose module receives this declaration's procedures
    pub fn class(&self) -> &SymbolId {
        match &self.kind {
            DeclarationKind::ClassRooted => &self.id,
            DeclarationKind::MethodRooted { class, .. } => class,
        }
    }

    pub fn display_name(&self) -> &str {
        self.command
            .as_ref()
            .map(|meta| meta.name.as_str())
            .unwrap_or(&self.simple_name)
    }

    pub fn direct_options(&self) -> impl Iterator<Item = &ArgDeclaration> {
        self.options
            .iter()
            .filter(move |arg| arg.is_direct_member_of(&self.id))
    }

    pub fn direct_positionals(&self) -> impl Iterator<Item = &ArgDeclaration> {
        self.positionals
            .iter()
            .filter(move |arg| arg.is_direct_member_of(&self.id))
    }
}

/// Implicit abstract anchor for a class that has no declaration of its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticContainer {
    pub id: SymbolId,
    pub owner: OwningScope,
    pub simple_name: String,
    pub type_path: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Declaration {
    Command(CommandDeclaration),
    SyntheticContainer(SyntheticContainer),
}

impl Declaration {
    pub fn id(&self) -> &SymbolId {
        match self {
            Declaration::Command(decl) => &decl.id,
            Declaration::SyntheticContainer(container) => &container.id,
        }
    }

    pub fn owner(&self) -> &OwningScope {
        match self {
            Declaration::Command(decl) => &decl.owner,
            Declaration::SyntheticContainer(container) => &container.owner,
        }
    }

    pub fn as_command(&self) -> Option<&CommandDeclaration> {
        match self {
            Declaration::Command(decl) => Some(decl),
            Declaration::SyntheticContainer(_) => None,
        }
    }

    /// Class-shaped declarations each get a generated module
    pub fn is_class_shaped(&self) -> bool {
        match self {
            Declaration::Command(decl) => !decl.is_method_rooted(),
            Declaration::SyntheticContainer(_) => true,
        }
    }

    pub fn simple_name(&self) -> &str {
        match self {
            Declaration::Command(decl) => &decl.simple_name,
            Declaration::SyntheticContainer(container) => &container.simple_name,
        }
    }

    pub fn type_path(&self) -> &str {
        match self {
            Declaration::Command(decl) => &decl.type_path,
            Declaration::SyntheticContainer(container) => &container.type_path,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Declaration::Command(decl) => decl.visibility,
            Declaration::SyntheticContainer(container) => container.visibility,
        }
    }
}
