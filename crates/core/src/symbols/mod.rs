//! Host symbol graph: the program elements the declaration source refers to

pub mod table;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use table::SymbolTable;

/// Stable identity of a program element, e.g. `com.example.Hello` or
/// `com.example.Hello#run`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
}

/// Shape of a symbol as reported by the host front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolKind {
    Package,
    Class {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        superclass: Option<SymbolId>,
        /// Rust path of the bound type; derived from the id when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_path: Option<String>,
        /// Authoritative member list when the host enumerates it
        #[serde(default, skip_serializing_if = "Option::is_none")]
        members: Option<Vec<SymbolId>>,
    },
    Method {
        #[serde(default)]
        params: Vec<String>,
    },
    Field {
        ty: String,
        #[serde(default)]
        arg_group: bool,
    },
    Parameter {
        ty: String,
    },
}

impl SymbolKind {
    pub fn describe(&self) -> &'static str {
        match self {
            SymbolKind::Package => "package",
            SymbolKind::Class { .. } => "class",
            SymbolKind::Method { .. } => "method",
            SymbolKind::Field { .. } => "field",
            SymbolKind::Parameter { .. } => "parameter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<SymbolId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(flatten)]
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn is_class(&self) -> bool {
        matches!(self.kind, SymbolKind::Class { .. })
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, SymbolKind::Method { .. })
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(&Modifier::Public)
    }
}

/// Strip generic arguments from a declared type, keeping array suffixes
pub fn erasure(ty: &str) -> String {
    let mut erased = String::with_capacity(ty.len());
    let mut depth = 0usize;
    for ch in ty.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => erased.push(c),
            _ => {}
        }
    }
    erased
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erasure_strips_generics() {
        assert_eq!(erasure("java.util.List<java.lang.String>"), "java.util.List");
        assert_eq!(erasure("Map<String, List<Integer>>[]"), "Map[]");
        assert_eq!(erasure("int"), "int");
    }

    #[test]
    fn test_symbol_deserializes_flattened_kind() {
        let symbol: Symbol = serde_json::from_value(serde_json::json!({
            "id": "demo.Hello",
            "name": "Hello",
            "owner": "demo",
            "modifiers": ["public"],
            "kind": "class",
            "superclass": "demo.Base"
        }))
        .unwrap();

        assert!(symbol.is_class());
        assert!(symbol.is_public());
        assert_eq!(
            symbol.kind,
            SymbolKind::Class {
                superclass: Some(SymbolId::new("demo.Base")),
                type_path: None,
                members: None,
            }
        );
    }
}
