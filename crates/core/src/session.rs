//! Compilation session: the registry threaded through one compiler pass

use std::collections::BTreeMap;

use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, Messager};
use crate::model::{CommandDeclaration, Declaration, OwningScope};
use crate::symbols::{SymbolId, SymbolTable};

/// Declarations discovered in a single pass, plus the diagnostics raised so far
pub struct CompilationSession<'a> {
    symbols: &'a SymbolTable,
    config: &'a GeneratorConfig,
    declarations: BTreeMap<SymbolId, Declaration>,
    order: Vec<SymbolId>,
    diagnostics: Diagnostics,
}

impl<'a> CompilationSession<'a> {
    pub fn new(symbols: &'a SymbolTable, config: &'a GeneratorConfig) -> Self {
        Self {
            symbols,
            config,
            declarations: BTreeMap::new(),
            order: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn symbols(&self) -> &'a SymbolTable {
        self.symbols
    }

    pub fn config(&self) -> &'a GeneratorConfig {
        self.config
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.declarations.contains_key(id)
    }

    pub fn get(&self, id: &SymbolId) -> Option<&Declaration> {
        self.declarations.get(id)
    }

    pub fn command(&self, id: &SymbolId) -> Option<&CommandDeclaration> {
        self.get(id).and_then(Declaration::as_command)
    }

    pub fn command_mut(&mut self, id: &SymbolId) -> Option<&mut CommandDeclaration> {
        match self.declarations.get_mut(id) {
            Some(Declaration::Command(decl)) => Some(decl),
            _ => None,
        }
    }

    /// Register a declaration. Returns false when an explicit declaration
    /// already exists for the id; a synthetic container is replaced by an
    /// explicit declaration for the same class.
    pub fn insert(&mut self, declaration: Declaration) -> bool {
        let id = declaration.id().clone();
        match self.declarations.get(&id) {
            None => {
                self.order.push(id.clone());
                self.declarations.insert(id, declaration);
                true
            }
            Some(Declaration::SyntheticContainer(_))
                if matches!(declaration, Declaration::Command(_)) =>
            {
                tracing::debug!("Replacing synthetic container for {}", id);
                self.declarations.insert(id, declaration);
                true
            }
            Some(_) => false,
        }
    }

    /// Declarations in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.order.iter().filter_map(|id| self.declarations.get(id))
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandDeclaration> {
        self.iter().filter_map(Declaration::as_command)
    }

    pub fn ids(&self) -> &[SymbolId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Length of the owning-scope chain back to the root namespace
    pub fn depth(&self, id: &SymbolId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id);
        while let Some(declaration) = current {
            match declaration.owner() {
                OwningScope::Declaration { id } if depth <= self.order.len() => {
                    depth += 1;
                    current = self.get(id);
                }
                _ => break,
            }
        }
        depth
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.print_message(diagnostic);
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }
}
