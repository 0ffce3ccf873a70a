use std::collections::BTreeMap;

use super::{Symbol, SymbolId, SymbolKind, erasure};
use crate::error::{Error, Result};

/// Read-only view over every symbol the host reported
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<SymbolId, Symbol>,
    // Report order, so member scans stay deterministic and source-like
    order: Vec<SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol) {
        if !self.symbols.contains_key(&symbol.id) {
            self.order.push(symbol.id.clone());
        }
        self.symbols.insert(symbol.id.clone(), symbol);
    }

    pub fn get(&self, id: &SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn require(&self, id: &SymbolId) -> Result<&Symbol> {
        self.get(id).ok_or_else(|| Error::UnknownSymbol(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().filter_map(|id| self.symbols.get(id))
    }

    pub fn owner(&self, id: &SymbolId) -> Option<&Symbol> {
        self.get(id)
            .and_then(|symbol| symbol.owner.as_ref())
            .and_then(|owner| self.get(owner))
    }

    pub fn superclass(&self, id: &SymbolId) -> Option<&SymbolId> {
        match &self.get(id)?.kind {
            SymbolKind::Class { superclass, .. } => superclass.as_ref(),
            _ => None,
        }
    }

    /// Package that ultimately contains `id`, if any
    pub fn package_of(&self, id: &SymbolId) -> Option<&Symbol> {
        let mut current = self.owner(id);
        while let Some(symbol) = current {
            if matches!(symbol.kind, SymbolKind::Package) {
                return Some(symbol);
            }
            current = self.owner(&symbol.id);
        }
        None
    }

    /// Members declared by a class: the explicit member list when the host
    /// provided one, otherwise every symbol owned by the class
    pub fn members_of(&self, class: &SymbolId) -> Vec<&Symbol> {
        if let Some(Symbol {
            kind:
                SymbolKind::Class {
                    members: Some(members),
                    ..
                },
            ..
        }) = self.get(class)
        {
            return members.iter().filter_map(|id| self.get(id)).collect();
        }

        self.iter()
            .filter(|symbol| symbol.owner.as_ref() == Some(class))
            .collect()
    }

    pub fn declared_methods(&self, class: &SymbolId) -> Vec<&Symbol> {
        self.members_of(class)
            .into_iter()
            .filter(|symbol| symbol.is_method())
            .collect()
    }

    pub fn fields_of(&self, class: &SymbolId) -> Vec<&Symbol> {
        self.members_of(class)
            .into_iter()
            .filter(|symbol| matches!(symbol.kind, SymbolKind::Field { .. }))
            .collect()
    }

    /// Find the method declared on `class` with exactly the given erased
    /// parameter types
    pub fn resolve_method(
        &self,
        class: &SymbolId,
        name: &str,
        params: &[String],
    ) -> Result<&Symbol> {
        let wanted: Vec<String> = params.iter().map(|p| erasure(p)).collect();
        self.declared_methods(class)
            .into_iter()
            .find(|method| {
                method.name == name
                    && match &method.kind {
                        SymbolKind::Method { params } => {
                            params.iter().map(|p| erasure(p)).collect::<Vec<_>>() == wanted
                        }
                        _ => false,
                    }
            })
            .ok_or_else(|| Error::MethodNotFound {
                owner: class.clone(),
                name: name.to_string(),
                params: wanted.join(", "),
            })
    }
}

impl FromIterator<Symbol> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut table = SymbolTable::new();
        for symbol in iter {
            table.insert(symbol);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Modifier;

    fn class(id: &str, owner: &str, superclass: Option<&str>) -> Symbol {
        Symbol {
            id: SymbolId::new(id),
            name: id.rsplit('.').next().unwrap().to_string(),
            owner: Some(SymbolId::new(owner)),
            modifiers: vec![Modifier::Public],
            kind: SymbolKind::Class {
                superclass: superclass.map(SymbolId::new),
                type_path: None,
                members: None,
            },
        }
    }

    fn method(id: &str, owner: &str, name: &str, params: &[&str]) -> Symbol {
        Symbol {
            id: SymbolId::new(id),
            name: name.to_string(),
            owner: Some(SymbolId::new(owner)),
            modifiers: vec![],
            kind: SymbolKind::Method {
                params: params.iter().map(|p| p.to_string()).collect(),
            },
        }
    }

    #[test]
    fn test_resolve_method_matches_erased_signature() {
        let table: SymbolTable = vec![
            class("demo.Tool", "demo", None),
            method("demo.Tool#run(String)", "demo.Tool", "run", &["String"]),
            method(
                "demo.Tool#run(List)",
                "demo.Tool",
                "run",
                &["java.util.List<String>"],
            ),
        ]
        .into_iter()
        .collect();

        let found = table
            .resolve_method(
                &SymbolId::new("demo.Tool"),
                "run",
                &["java.util.List<Integer>".to_string()],
            )
            .unwrap();
        assert_eq!(found.id.as_str(), "demo.Tool#run(List)");

        let missing = table.resolve_method(&SymbolId::new("demo.Tool"), "run", &["int".to_string()]);
        assert!(matches!(missing, Err(Error::MethodNotFound { .. })));
    }

    #[test]
    fn test_explicit_member_list_is_authoritative() {
        let mut tool = class("demo.Tool", "demo", None);
        tool.kind = SymbolKind::Class {
            superclass: None,
            type_path: None,
            members: Some(vec![]),
        };
        let table: SymbolTable = vec![
            tool,
            method("demo.Tool#run()", "demo.Tool", "run", &[]),
        ]
        .into_iter()
        .collect();

        assert!(table.declared_methods(&SymbolId::new("demo.Tool")).is_empty());
    }

    #[test]
    fn test_package_of_walks_nested_owners() {
        let table: SymbolTable = vec![
            Symbol {
                id: SymbolId::new("demo"),
                name: "demo".to_string(),
                owner: None,
                modifiers: vec![],
                kind: SymbolKind::Package,
            },
            class("demo.Outer", "demo", None),
            class("demo.Outer.Inner", "demo.Outer", None),
        ]
        .into_iter()
        .collect();

        let package = table.package_of(&SymbolId::new("demo.Outer.Inner")).unwrap();
        assert_eq!(package.name, "demo");
    }
}
