//! View configuration.
//!
//! [`ViewConfig`] describes where templates live and which view class and
//! layout are used by default. It can be built in code or loaded from YAML:
//!
//! ```rust
//! use fragments_render::ViewConfig;
//!
//! let config = ViewConfig::from_yaml(r#"
//! paths:
//!   - ./templates
//! plugins:
//!   Taxonomy: ./plugins/taxonomy/templates
//! themes:
//!   Dark: ./themes/dark
//! layout: default
//! "#).unwrap();
//!
//! assert_eq!(config.paths.len(), 1);
//! assert_eq!(config.view_class, "App");
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::registry::TEMPLATE_EXTENSIONS;

/// Name of the view class used when none is requested.
pub const DEFAULT_VIEW_CLASS: &str = "App";

fn default_view_class() -> String {
    DEFAULT_VIEW_CLASS.to_string()
}

fn default_extensions() -> Vec<String> {
    TEMPLATE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// Template locations and view defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    /// Application template roots, in search order.
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Plugin name → plugin template root.
    #[serde(default)]
    pub plugins: BTreeMap<String, PathBuf>,

    /// Theme name → theme template root.
    #[serde(default)]
    pub themes: BTreeMap<String, PathBuf>,

    /// Template extensions, in priority order.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// View class used when a builder names none.
    #[serde(default = "default_view_class")]
    pub view_class: String,

    /// Layout applied by views that do not disable it.
    #[serde(default)]
    pub layout: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            plugins: BTreeMap::new(),
            themes: BTreeMap::new(),
            extensions: default_extensions(),
            view_class: default_view_class(),
            layout: None,
        }
    }
}

impl ViewConfig {
    /// Parses a configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a configuration file.
    ///
    /// Relative template roots are resolved against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RenderError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Adds an application template root.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Adds a plugin template root.
    pub fn plugin(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.plugins.insert(name.into(), path.into());
        self
    }

    /// Adds a theme template root.
    pub fn theme(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.themes.insert(name.into(), path.into());
        self
    }

    /// Sets the default layout.
    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.paths.iter_mut().for_each(join);
        self.plugins.values_mut().for_each(join);
        self.themes.values_mut().for_each(join);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ViewConfig::default());
        assert_eq!(config.extensions[0], ".jinja");
        assert!(config.layout.is_none());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = ViewConfig::from_yaml("pathz: []").unwrap_err();
        assert!(matches!(err, RenderError::ConfigError(_)));
    }

    #[test]
    fn test_from_file_rebases_relative_paths() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("views.yaml");
        std::fs::write(
            &file,
            "paths: [templates, /abs/templates]\nplugins:\n  Taxonomy: plugins/taxonomy\n",
        )
        .unwrap();

        let config = ViewConfig::from_file(&file).unwrap();
        assert_eq!(config.paths[0], tmp.path().join("templates"));
        assert_eq!(config.paths[1], PathBuf::from("/abs/templates"));
        assert_eq!(config.plugins["Taxonomy"], tmp.path().join("plugins/taxonomy"));
    }

    #[test]
    fn test_builder_methods() {
        let config = ViewConfig::default()
            .path("a")
            .plugin("P", "p")
            .theme("T", "t")
            .layout("default");
        assert_eq!(config.paths, vec![PathBuf::from("a")]);
        assert_eq!(config.layout.as_deref(), Some("default"));
        assert!(config.themes.contains_key("T"));
    }
}
