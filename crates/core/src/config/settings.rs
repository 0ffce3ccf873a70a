use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const CONFIG_FILE_NAME: &str = ".specgen.json";

static SUFFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]*$").expect("valid suffix pattern"));

/// Generator settings, loaded from `.specgen.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct GeneratorConfig {
    /// Appended to the snake-cased class name to form each module name
    pub module_suffix: String,
    /// Path under which generated modules are mounted in the user crate
    pub module_root: String,
    /// Path of the runtime crate providing the spec primitives
    pub runtime_crate: String,
    /// Prefix every artifact with an `@generated` banner
    pub emit_header: bool,
    /// Pipe rendered artifacts through `rustfmt`
    pub rustfmt: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module_suffix: "_cli_cfg".to_string(),
            module_root: "crate::cli_cfg".to_string(),
            runtime_crate: "::cmdspec_runtime".to_string(),
            emit_header: true,
            rustfmt: false,
        }
    }
}

impl GeneratorConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Walk up from `start_path` looking for `.specgen.json`, stopping at
    /// `PROJECT_ROOT` or the home directory
    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let project_root = std::env::var("PROJECT_ROOT").ok().map(PathBuf::from);
        let home_dir = std::env::var("HOME").ok().map(PathBuf::from);

        let mut current = if start_path.is_file() {
            start_path.parent()?
        } else {
            start_path
        };

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            if project_root.as_deref() == Some(current) || home_dir.as_deref() == Some(current) {
                tracing::debug!("Stopping config search at {:?}", current);
                return None;
            }

            current = current.parent()?;
        }
    }

    /// Load the nearest config file, or the defaults when there is none
    pub fn discover(start_path: &Path) -> Result<Self> {
        match Self::find_config_file(start_path) {
            Some(path) => {
                tracing::debug!("Using generator config from {:?}", path);
                Self::load_from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !SUFFIX_PATTERN.is_match(&self.module_suffix) {
            return Err(Error::ConfigError(format!(
                "module_suffix `{}` must only contain letters, digits and underscores",
                self.module_suffix
            )));
        }
        for (key, path) in [
            ("module_root", &self.module_root),
            ("runtime_crate", &self.runtime_crate),
        ] {
            syn::parse_str::<syn::Path>(path).map_err(|e| {
                Error::ConfigError(format!("{key} `{path}` is not a valid Rust path: {e}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "module_suffix": "_factory" }"#).unwrap();

        assert_eq!(config.module_suffix, "_factory");
        assert_eq!(config.runtime_crate, "::cmdspec_runtime");
        assert!(config.emit_header);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_paths() {
        let config = GeneratorConfig {
            module_root: "crate::not a path".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = GeneratorConfig {
            module_suffix: "-cfg".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = GeneratorConfig {
            module_root: "crate::generated".to_string(),
            ..Default::default()
        };
        config
            .save_to_file(&temp_dir.path().join(CONFIG_FILE_NAME))
            .unwrap();

        let found = GeneratorConfig::find_config_file(&nested).unwrap();
        assert_eq!(found, temp_dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(
            GeneratorConfig::discover(&nested).unwrap().module_root,
            "crate::generated"
        );
    }
}
