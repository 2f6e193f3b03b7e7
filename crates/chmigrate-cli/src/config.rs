//! Project configuration (§6 "Input — project config", §10.4): the YAML
//! document listing environments, and the default [`ProjectLoader`] that
//! resolves an environment's entrypoint file.

use std::path::{Path, PathBuf};

use chmigrate_core::interfaces::{resolve_imports, ProjectLoader};
use chmigrate_core::{DiffError, Result};
use serde::Deserialize;

/// One environment entry in the project file: a name, an entrypoint DDL
/// file, a migrations directory, and an optional connection URL (the
/// `SchemaDriver` boundary this crate does not implement).
#[derive(Debug, Clone, Deserialize)]
pub struct Environment {
    pub name: String,
    pub entrypoint: PathBuf,
    pub migrations_dir: PathBuf,
    #[serde(default)]
    pub url: Option<String>,
}

/// The top-level project file: an array of named environments.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub environments: Vec<Environment>,
}

impl ProjectConfig {
    /// Reads and deserializes a YAML project file from `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)?;
        Ok(config)
    }

    /// Looks up an environment by name.
    #[must_use]
    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.name == name)
    }
}

/// The default [`ProjectLoader`]: reads an environment's entrypoint file
/// relative to `root` and resolves `-- housekeeper:import <path>`
/// directives relative to each importing file, nesting as needed.
pub struct FileProjectLoader<'a> {
    pub config: &'a ProjectConfig,
    pub root: PathBuf,
}

impl ProjectLoader for FileProjectLoader<'_> {
    fn load_entrypoint(&self, environment: &str) -> Result<String> {
        let env = self.config.environment(environment).ok_or_else(|| {
            DiffError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unknown environment {environment:?}"),
            ))
        })?;
        let path = self.root.join(&env.entrypoint);
        let text = std::fs::read_to_string(&path)?;
        let base_dir = path.parent().unwrap_or(&self.root);
        Ok(resolve_imports(&text, base_dir, &|p: &Path| std::fs::read_to_string(p))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_project_file() {
        let yaml = r"
environments:
  - name: dev
    entrypoint: schema.sql
    migrations_dir: migrations
  - name: prod
    entrypoint: schema.sql
    migrations_dir: migrations
    url: clickhouse://prod.internal:9000
";
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.environments.len(), 2);
        assert_eq!(config.environment("prod").unwrap().url.as_deref(), Some("clickhouse://prod.internal:9000"));
        assert!(config.environment("staging").is_none());
    }

    #[test]
    fn loader_resolves_imports_relative_to_the_entrypoint() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("schema.sql"), "-- housekeeper:import tables.sql\n").unwrap();
        std::fs::write(dir.path().join("tables.sql"), "CREATE DATABASE analytics ENGINE = Atomic;\n").unwrap();

        let config = ProjectConfig {
            environments: vec![Environment {
                name: "dev".to_string(),
                entrypoint: PathBuf::from("schema.sql"),
                migrations_dir: PathBuf::from("migrations"),
                url: None,
            }],
        };
        let loader = FileProjectLoader { config: &config, root: dir.path().to_path_buf() };
        let resolved = loader.load_entrypoint("dev").unwrap();
        assert!(resolved.contains("CREATE DATABASE analytics"));
    }
}
