//! Template registry with layered search paths.
//!
//! [`TemplateRegistry`] resolves a template name to its content. Names are
//! relative paths without extension (`"Fragment/TagCloud/display"`), looked up
//! across several kinds of roots.
//!
//! # Template Resolution
//!
//! Templates are resolved by name using these rules:
//!
//! 1. Inline templates (added via [`TemplateRegistry::add_inline`]) have highest
//!    priority. When a plugin is active, the plugin-qualified key
//!    (`"Taxonomy.Fragment/TagCloud/display"`) is tried before the plain name.
//! 2. The active theme's root, if a theme is set.
//! 3. When a plugin is active: each application root's `Plugin/<Plugin>/`
//!    override directory, then the plugin's own root.
//! 4. Application roots, in registration order (first directory wins).
//!
//! Within a root, each extension in [`TEMPLATE_EXTENSIONS`] is tried in order.
//!
//! # Example
//!
//! ```rust,ignore
//! use fragments_render::TemplateRegistry;
//!
//! let mut registry = TemplateRegistry::new();
//! registry.add_template_dir("./templates")?;
//! registry.add_plugin_dir("Taxonomy", "./plugins/taxonomy/templates")?;
//!
//! // ./plugins/taxonomy/templates/Fragment/TagCloud/display.jinja
//! let content = registry.get_content("Fragment/TagCloud/display", Some("Taxonomy"), None)?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Recognized template file extensions in priority order.
///
/// When multiple files exist with the same base name but different extensions,
/// the extension appearing earlier in this list takes precedence.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".jinja", ".jinja2", ".j2", ".txt"];

/// How a resolved template's content is stored or accessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTemplate {
    /// Template content stored directly in memory.
    Inline(String),

    /// Template read from the filesystem on demand.
    File(PathBuf),
}

/// Error type for template registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Template not found in any searched location.
    NotFound {
        /// The name that was requested
        name: String,
        /// Locations that were searched, in order
        searched: Vec<String>,
    },

    /// Failed to read template file from disk.
    ReadError {
        /// Path that failed to read
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A template root was registered that does not exist.
    DirectoryNotFound {
        /// The missing directory
        path: PathBuf,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound { name, .. } => {
                write!(f, "Template not found: \"{}\"", name)
            }
            RegistryError::ReadError { path, message } => {
                write!(
                    f,
                    "Failed to read template \"{}\": {}",
                    path.display(),
                    message
                )
            }
            RegistryError::DirectoryNotFound { path } => {
                write!(f, "Template directory not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Registry for template resolution across inline, theme, plugin and
/// application sources.
///
/// The registry holds no file contents; files are read on each lookup so
/// edits are picked up without restarting.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    /// Inline templates (highest priority).
    inline: HashMap<String, String>,

    /// Application template roots, in search order.
    app_dirs: Vec<PathBuf>,

    /// Plugin name → plugin template root.
    plugin_dirs: HashMap<String, PathBuf>,

    /// Theme name → theme template root.
    theme_dirs: HashMap<String, PathBuf>,

    /// Extensions tried for each candidate, in priority order.
    extensions: Vec<String>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Creates an empty template registry using [`TEMPLATE_EXTENSIONS`].
    pub fn new() -> Self {
        Self {
            inline: HashMap::new(),
            app_dirs: Vec::new(),
            plugin_dirs: HashMap::new(),
            theme_dirs: HashMap::new(),
            extensions: TEMPLATE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replaces the extension list. Extensions should include the leading dot.
    pub fn set_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
    }

    /// Returns the extensions tried for each candidate.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Adds an inline template with the given name.
    ///
    /// Inline templates shadow any file-based template with the same name.
    /// Use a `"Plugin.name"` key to scope an inline template to a plugin.
    ///
    /// ```rust
    /// use fragments_render::TemplateRegistry;
    ///
    /// let mut registry = TemplateRegistry::new();
    /// registry.add_inline("Fragment/Menu/display", "{{ items | length }} items");
    /// assert!(registry.get("Fragment/Menu/display", None, None).is_ok());
    /// ```
    pub fn add_inline(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.inline.insert(name.into(), content.into());
    }

    /// Adds an application template root.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DirectoryNotFound`] if the directory doesn't exist.
    pub fn add_template_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RegistryError> {
        let path = existing_dir(path.as_ref())?;
        self.app_dirs.push(path);
        Ok(())
    }

    /// Registers the template root of a plugin.
    pub fn add_plugin_dir<P: AsRef<Path>>(
        &mut self,
        plugin: impl Into<String>,
        path: P,
    ) -> Result<(), RegistryError> {
        let path = existing_dir(path.as_ref())?;
        self.plugin_dirs.insert(plugin.into(), path);
        Ok(())
    }

    /// Registers the template root of a theme.
    pub fn add_theme_dir<P: AsRef<Path>>(
        &mut self,
        theme: impl Into<String>,
        path: P,
    ) -> Result<(), RegistryError> {
        let path = existing_dir(path.as_ref())?;
        self.theme_dirs.insert(theme.into(), path);
        Ok(())
    }

    /// Returns the directories searched for the given plugin and theme, in order.
    pub fn search_paths(&self, plugin: Option<&str>, theme: Option<&str>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(dir) = theme.and_then(|t| self.theme_dirs.get(t)) {
            paths.push(dir.clone());
        }

        if let Some(plugin) = plugin {
            for app in &self.app_dirs {
                paths.push(app.join("Plugin").join(plugin));
            }
            if let Some(dir) = self.plugin_dirs.get(plugin) {
                paths.push(dir.clone());
            }
        }

        paths.extend(self.app_dirs.iter().cloned());
        paths
    }

    /// Looks up a template by name for the given plugin and theme.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] listing every searched location if
    /// nothing matches. Names with `..` segments are never resolved.
    pub fn get(
        &self,
        name: &str,
        plugin: Option<&str>,
        theme: Option<&str>,
    ) -> Result<ResolvedTemplate, RegistryError> {
        if let Some(plugin) = plugin {
            if let Some(content) = self.inline.get(&format!("{}.{}", plugin, name)) {
                return Ok(ResolvedTemplate::Inline(content.clone()));
            }
        }
        if let Some(content) = self.inline.get(name) {
            return Ok(ResolvedTemplate::Inline(content.clone()));
        }

        let mut searched = Vec::new();
        if name.split('/').any(|segment| segment == "..") {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
                searched,
            });
        }

        for dir in self.search_paths(plugin, theme) {
            for ext in &self.extensions {
                let candidate = dir.join(format!("{}{}", name, ext));
                if candidate.is_file() {
                    return Ok(ResolvedTemplate::File(candidate));
                }
                searched.push(candidate.display().to_string());
            }
        }

        Err(RegistryError::NotFound {
            name: name.to_string(),
            searched,
        })
    }

    /// Gets the content of a template, reading from disk if necessary.
    pub fn get_content(
        &self,
        name: &str,
        plugin: Option<&str>,
        theme: Option<&str>,
    ) -> Result<String, RegistryError> {
        match self.get(name, plugin, theme)? {
            ResolvedTemplate::Inline(content) => Ok(content),
            ResolvedTemplate::File(path) => {
                std::fs::read_to_string(&path).map_err(|e| RegistryError::ReadError {
                    path,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Returns true if the name resolves for the given plugin and theme.
    pub fn has(&self, name: &str, plugin: Option<&str>, theme: Option<&str>) -> bool {
        self.get(name, plugin, theme).is_ok()
    }

    /// Returns the number of inline templates.
    pub fn inline_len(&self) -> usize {
        self.inline.len()
    }

    /// Returns the registered application roots.
    pub fn template_dirs(&self) -> &[PathBuf] {
        &self.app_dirs
    }
}

fn existing_dir(path: &Path) -> Result<PathBuf, RegistryError> {
    if path.is_dir() {
        Ok(path.to_path_buf())
    } else {
        Err(RegistryError::DirectoryNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    // =========================================================================
    // Inline templates
    // =========================================================================

    #[test]
    fn test_registry_add_inline() {
        let mut registry = TemplateRegistry::new();
        registry.add_inline("header", "{{ title }}");

        assert_eq!(registry.inline_len(), 1);
        let content = registry.get_content("header", None, None).unwrap();
        assert_eq!(content, "{{ title }}");
    }

    #[test]
    fn test_registry_inline_plugin_key_wins() {
        let mut registry = TemplateRegistry::new();
        registry.add_inline("list", "app");
        registry.add_inline("Taxonomy.list", "plugin");

        assert_eq!(
            registry.get_content("list", Some("Taxonomy"), None).unwrap(),
            "plugin"
        );
        assert_eq!(registry.get_content("list", None, None).unwrap(), "app");
    }

    #[test]
    fn test_registry_not_found() {
        let registry = TemplateRegistry::new();
        let result = registry.get("nonexistent", None, None);

        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
    }

    // =========================================================================
    // Directory search
    // =========================================================================

    #[test]
    fn test_registry_missing_dir_rejected() {
        let mut registry = TemplateRegistry::new();
        let result = registry.add_template_dir("/definitely/not/here");
        assert!(matches!(result, Err(RegistryError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_registry_extension_priority() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "config.j2", "j2");
        write(tmp.path(), "config.jinja", "jinja");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(tmp.path()).unwrap();

        assert_eq!(registry.get_content("config", None, None).unwrap(), "jinja");
    }

    #[test]
    fn test_registry_first_app_dir_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(first.path(), "a.jinja", "first");
        write(second.path(), "a.jinja", "second");
        write(second.path(), "b.jinja", "only-second");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(first.path()).unwrap();
        registry.add_template_dir(second.path()).unwrap();

        assert_eq!(registry.get_content("a", None, None).unwrap(), "first");
        assert_eq!(registry.get_content("b", None, None).unwrap(), "only-second");
    }

    #[test]
    fn test_registry_search_order_theme_plugin_app() {
        let app = TempDir::new().unwrap();
        let plugin = TempDir::new().unwrap();
        let theme = TempDir::new().unwrap();
        write(app.path(), "Fragment/Tags/display.jinja", "app");
        write(plugin.path(), "Fragment/Tags/display.jinja", "plugin");
        write(theme.path(), "Fragment/Tags/display.jinja", "theme");

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(app.path()).unwrap();
        registry.add_plugin_dir("Taxonomy", plugin.path()).unwrap();
        registry.add_theme_dir("Dark", theme.path()).unwrap();

        let name = "Fragment/Tags/display";
        assert_eq!(registry.get_content(name, None, None).unwrap(), "app");
        assert_eq!(
            registry.get_content(name, Some("Taxonomy"), None).unwrap(),
            "plugin"
        );
        assert_eq!(
            registry
                .get_content(name, Some("Taxonomy"), Some("Dark"))
                .unwrap(),
            "theme"
        );
    }

    #[test]
    fn test_registry_app_overrides_plugin_template() {
        let app = TempDir::new().unwrap();
        let plugin = TempDir::new().unwrap();
        write(plugin.path(), "Fragment/Tags/display.jinja", "plugin");
        write(
            app.path(),
            "Plugin/Taxonomy/Fragment/Tags/display.jinja",
            "override",
        );

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(app.path()).unwrap();
        registry.add_plugin_dir("Taxonomy", plugin.path()).unwrap();

        assert_eq!(
            registry
                .get_content("Fragment/Tags/display", Some("Taxonomy"), None)
                .unwrap(),
            "override"
        );
    }

    #[test]
    fn test_registry_not_found_lists_candidates() {
        let tmp = TempDir::new().unwrap();
        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(tmp.path()).unwrap();

        match registry.get("Fragment/Tags/display", None, None) {
            Err(RegistryError::NotFound { searched, .. }) => {
                assert_eq!(searched.len(), TEMPLATE_EXTENSIONS.len());
                assert!(searched[0].ends_with("display.jinja"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_refuses_parent_segments() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "secret.jinja", "nope");
        let nested = tmp.path().join("templates");
        fs::create_dir_all(&nested).unwrap();

        let mut registry = TemplateRegistry::new();
        registry.add_template_dir(&nested).unwrap();

        assert!(registry.get("../secret", None, None).is_err());
    }
}
