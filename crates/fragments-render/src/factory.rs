//! View class registry.
//!
//! [`ViewFactory`] turns a [`ViewBuilder`] into a [`View`]. The builder's
//! class name selects a constructor; a builder without one gets the factory's
//! default class. Applications register extra classes to render through a
//! different engine or to post-process output.
//!
//! # Example
//!
//! ```rust
//! use fragments_render::{TemplateRegistry, ViewBuilder, ViewFactory};
//!
//! let mut templates = TemplateRegistry::new();
//! templates.add_inline("Fragment/Menu/display", "{{ items | join(', ') }}");
//!
//! let factory = ViewFactory::new(templates);
//! let vars = serde_json::json!({"items": ["home", "about"]});
//! let builder = ViewBuilder::new()
//!     .template_path("Fragment/Menu")
//!     .vars(vars.as_object().cloned().unwrap());
//!
//! let mut view = factory.build(builder).unwrap();
//! assert_eq!(view.render("display").unwrap(), "home, about");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{ViewConfig, DEFAULT_VIEW_CLASS};
use crate::error::RenderError;
use crate::helpers::HelperRegistry;
use crate::registry::TemplateRegistry;
use crate::view::{MiniJinjaView, View, ViewBuilder, ViewResources};

/// Constructs a view of one class.
pub type ViewConstructor =
    Arc<dyn Fn(ViewBuilder, &ViewResources) -> Result<Box<dyn View>, RenderError> + Send + Sync>;

/// Registry of view classes sharing one template registry and helper set.
#[derive(Clone)]
pub struct ViewFactory {
    resources: ViewResources,
    classes: HashMap<String, ViewConstructor>,
    default_class: String,
}

impl ViewFactory {
    /// Creates a factory with the built-in helpers and a MiniJinja view
    /// registered as the default class.
    pub fn new(templates: TemplateRegistry) -> Self {
        let mut factory = Self {
            resources: ViewResources {
                templates: Arc::new(templates),
                helpers: Arc::new(HelperRegistry::with_builtins()),
                default_layout: None,
            },
            classes: HashMap::new(),
            default_class: DEFAULT_VIEW_CLASS.to_string(),
        };
        factory.register_minijinja_class(DEFAULT_VIEW_CLASS);
        factory
    }

    /// Builds a factory from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ConfigError`] if a configured directory is missing.
    pub fn from_config(config: &ViewConfig) -> Result<Self, RenderError> {
        let mut templates = TemplateRegistry::new();
        templates.set_extensions(config.extensions.iter().cloned());
        for path in &config.paths {
            templates.add_template_dir(path)?;
        }
        for (plugin, path) in &config.plugins {
            templates.add_plugin_dir(plugin.clone(), path)?;
        }
        for (theme, path) in &config.themes {
            templates.add_theme_dir(theme.clone(), path)?;
        }

        let mut factory = Self::new(templates);
        factory.resources.default_layout = config.layout.clone();
        if config.view_class != DEFAULT_VIEW_CLASS {
            factory.register_minijinja_class(config.view_class.clone());
            factory.default_class = config.view_class.clone();
        }
        Ok(factory)
    }

    /// Replaces the helper registry.
    pub fn with_helpers(mut self, helpers: HelperRegistry) -> Self {
        self.resources.helpers = Arc::new(helpers);
        self
    }

    /// Sets the layout used by builders that keep the default.
    pub fn with_default_layout(mut self, layout: impl Into<String>) -> Self {
        self.resources.default_layout = Some(layout.into());
        self
    }

    /// Registers a view class.
    pub fn register_view_class<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(ViewBuilder, &ViewResources) -> Result<Box<dyn View>, RenderError>
            + Send
            + Sync
            + 'static,
    {
        self.classes.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Registers a MiniJinja view under another class name.
    pub fn register_minijinja_class(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let class_name = name.clone();
        self.register_view_class(name, move |builder, resources| {
            Ok(Box::new(MiniJinjaView::new(class_name.clone(), builder, resources)?) as Box<dyn View>)
        })
    }

    /// Returns true if the class is registered.
    pub fn has_view_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Returns the class used when a builder names none.
    pub fn default_class(&self) -> &str {
        &self.default_class
    }

    /// Returns the shared template registry.
    pub fn templates(&self) -> &TemplateRegistry {
        &self.resources.templates
    }

    /// Returns the shared helper registry.
    pub fn helpers(&self) -> &HelperRegistry {
        &self.resources.helpers
    }

    /// Builds a fresh view.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingViewClass`] for an unregistered class, or
    /// whatever the class constructor reports.
    pub fn build(&self, builder: ViewBuilder) -> Result<Box<dyn View>, RenderError> {
        let class = builder
            .get_class_name()
            .unwrap_or(&self.default_class)
            .to_string();
        let constructor = self
            .classes
            .get(&class)
            .ok_or_else(|| RenderError::MissingViewClass(class.clone()))?;

        tracing::debug!(view = %class, path = ?builder.get_template_path(), "building view");
        constructor(builder, &self.resources)
    }
}

impl fmt::Debug for ViewFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        classes.sort_unstable();
        f.debug_struct("ViewFactory")
            .field("classes", &classes)
            .field("default_class", &self.default_class)
            .field("resources", &self.resources)
            .finish()
    }
}
