//! JSON manifest declaration source
//!
//! ```json
//! {
//!   "symbols": [{ "id": "demo", "name": "demo", "kind": "package" }, ...],
//!   "elements": [{ "element": "demo.Hello", "command": { "name": "hello" } }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CommandInput, DeclarationSource};
use crate::error::Result;
use crate::symbols::{Symbol, SymbolTable};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    symbols: Vec<Symbol>,
    #[serde(default)]
    elements: Vec<CommandInput>,
}

/// Declaration source backed by a serialized manifest
#[derive(Debug, Clone, Default)]
pub struct ManifestSource {
    symbols: SymbolTable,
    elements: Vec<CommandInput>,
}

impl ManifestSource {
    pub fn new(symbols: SymbolTable, elements: Vec<CommandInput>) -> Self {
        Self { symbols, elements }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self> {
        let file: ManifestFile = serde_json::from_str(contents)?;
        Ok(Self::from_file(file))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let file: ManifestFile = serde_json::from_value(value)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ManifestFile) -> Self {
        tracing::debug!(
            "Loaded manifest with {} symbols and {} elements",
            file.symbols.len(),
            file.elements.len()
        );
        Self {
            symbols: file.symbols.into_iter().collect(),
            elements: file.elements,
        }
    }
}

impl DeclarationSource for ManifestSource {
    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn elements(&self) -> Box<dyn Iterator<Item = &CommandInput> + '_> {
        Box::new(self.elements.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ArgCategory;

    #[test]
    fn test_manifest_defaults() {
        let source = ManifestSource::from_value(serde_json::json!({
            "symbols": [
                { "id": "demo", "name": "demo", "kind": "package" },
                { "id": "demo.Hello", "name": "Hello", "owner": "demo", "kind": "class" },
                { "id": "demo.Hello.count", "name": "count", "owner": "demo.Hello", "kind": "field", "ty": "int" }
            ],
            "elements": [{
                "element": "demo.Hello",
                "command": { "name": "hello" },
                "options": [{
                    "element": "demo.Hello.count",
                    "category": "option",
                    "names": ["-c", "--count"],
                    "type_name": "int"
                }]
            }]
        }))
        .unwrap();

        assert_eq!(source.symbols().len(), 3);
        let element = source.elements().next().unwrap();
        let option = &element.options[0];
        assert_eq!(option.arity, "1");
        assert_eq!(option.category, ArgCategory::Option);
        assert!(!option.inherited);
        assert!(element.command.as_ref().unwrap().description.is_empty());
    }

    #[test]
    fn test_unknown_arg_category_is_kept_for_diagnostics() {
        let source = ManifestSource::from_str(
            r#"{
                "elements": [{
                    "element": "demo.Hello",
                    "options": [{ "element": "demo.Hello.x", "category": "flag", "type_name": "int" }]
                }]
            }"#,
        )
        .unwrap();

        let element = source.elements().next().unwrap();
        assert_eq!(element.options[0].category, ArgCategory::Unsupported);
    }

    #[test]
    fn test_malformed_manifest_is_an_error() {
        assert!(ManifestSource::from_str("{ \"symbols\": 3 }").is_err());
    }
}
