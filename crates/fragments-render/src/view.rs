//! Views: one configured rendering of one template.
//!
//! A [`View`] is built from a [`ViewBuilder`] by a
//! [`ViewFactory`](crate::ViewFactory) and renders templates relative to its
//! template path. Views are cheap to build and are meant to be thrown away
//! after use; every setting that affects output lives on the builder.
//!
//! # Template Names
//!
//! | Name passed to `render` | File looked up |
//! |-------------------------|----------------|
//! | `"display"` | `<template_path>/display` |
//! | `"Shared/list"` | `Shared/list` (root-relative) |
//! | `"/Shared/list"` | `Shared/list` |
//!
//! # Layouts
//!
//! When a layout is active the template output is rendered again through
//! `layout/<name>`, which receives every view variable plus `content`.

use std::fmt;
use std::sync::Arc;

use minijinja::{Environment, ErrorKind, Value};
use serde::Serialize;
use serde_json::Map;

use crate::error::RenderError;
use crate::helpers::HelperRegistry;
use crate::registry::{RegistryError, TemplateRegistry};

/// Layout selection for a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Use the factory's configured default layout.
    #[default]
    Default,
    /// Render without a layout.
    Disabled,
    /// Use the named layout.
    Named(String),
}

/// Settings for building a [`View`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewBuilder {
    class_name: Option<String>,
    template_path: Option<String>,
    plugin: Option<String>,
    theme: Option<String>,
    layout: Layout,
    helpers: Vec<String>,
    vars: Map<String, serde_json::Value>,
}

impl ViewBuilder {
    /// Creates a builder with no settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the view class; `None` selects the factory default.
    pub fn class_name(mut self, class_name: Option<String>) -> Self {
        self.class_name = class_name;
        self
    }

    /// Sets the directory that plain template names are resolved in.
    pub fn template_path(mut self, path: impl Into<String>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Sets the plugin whose templates take part in lookup.
    pub fn plugin(mut self, plugin: Option<String>) -> Self {
        self.plugin = plugin;
        self
    }

    /// Sets the theme whose templates take part in lookup.
    pub fn theme(mut self, theme: Option<String>) -> Self {
        self.theme = theme;
        self
    }

    /// Uses the named layout.
    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Layout::Named(layout.into());
        self
    }

    /// Renders without any layout.
    pub fn disable_layout(mut self) -> Self {
        self.layout = Layout::Disabled;
        self
    }

    /// Sets the helpers installed into the view, in order.
    pub fn helpers<I, S>(mut self, helpers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.helpers = helpers.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the view variables.
    pub fn vars(mut self, vars: Map<String, serde_json::Value>) -> Self {
        self.vars = vars;
        self
    }

    /// Returns the requested view class, if any.
    pub fn get_class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Returns the template path, if any.
    pub fn get_template_path(&self) -> Option<&str> {
        self.template_path.as_deref()
    }

    /// Returns the plugin, if any.
    pub fn get_plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    /// Returns the theme, if any.
    pub fn get_theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    /// Returns the layout selection.
    pub fn get_layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the helper names.
    pub fn get_helpers(&self) -> &[String] {
        &self.helpers
    }

    /// Returns the view variables.
    pub fn get_vars(&self) -> &Map<String, serde_json::Value> {
        &self.vars
    }
}

/// Shared resources handed to view constructors.
#[derive(Debug, Clone)]
pub struct ViewResources {
    /// Template lookup.
    pub templates: Arc<TemplateRegistry>,
    /// Helper bundles.
    pub helpers: Arc<HelperRegistry>,
    /// Layout used when a builder asks for [`Layout::Default`].
    pub default_layout: Option<String>,
}

/// A built view, ready to render templates.
pub trait View {
    /// The view class this view was built as.
    fn class_name(&self) -> &str;

    /// The settings this view was built from.
    fn builder(&self) -> &ViewBuilder;

    /// Renders a template.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TemplateNotFound`] if the template file is
    /// absent; any other failure uses a different variant.
    fn render(&mut self, template: &str) -> Result<String, RenderError>;
}

impl fmt::Debug for dyn View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("class_name", &self.class_name())
            .field("builder", self.builder())
            .finish()
    }
}

/// MiniJinja-backed view.
///
/// Each view owns a fresh [`Environment`] with the builder's helpers
/// installed. `{% include %}` and `{% extends %}` resolve through the same
/// template registry, using the view's plugin and theme.
pub struct MiniJinjaView {
    class_name: String,
    builder: ViewBuilder,
    resources: ViewResources,
    env: Environment<'static>,
}

impl MiniJinjaView {
    /// Builds a view from its settings.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingHelper`] if the builder names an
    /// unknown helper.
    pub fn new(
        class_name: impl Into<String>,
        builder: ViewBuilder,
        resources: &ViewResources,
    ) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        resources.helpers.install(&mut env, &builder.helpers)?;

        let templates = Arc::clone(&resources.templates);
        let plugin = builder.plugin.clone();
        let theme = builder.theme.clone();
        env.set_loader(move |name| {
            match templates.get_content(name, plugin.as_deref(), theme.as_deref()) {
                Ok(content) => Ok(Some(content)),
                Err(RegistryError::NotFound { .. }) => Ok(None),
                Err(e) => Err(minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    e.to_string(),
                )),
            }
        });

        Ok(Self {
            class_name: class_name.into(),
            builder,
            resources: resources.clone(),
            env,
        })
    }

    /// Returns the registry path for a template name.
    pub fn template_file(&self, template: &str) -> String {
        if template.contains('/') {
            return template.trim_start_matches('/').to_string();
        }
        match self.builder.template_path.as_deref() {
            Some(dir) if !dir.is_empty() => format!("{}/{}", dir.trim_end_matches('/'), template),
            _ => template.to_string(),
        }
    }

    /// Returns the layout that will wrap output, if any.
    pub fn active_layout(&self) -> Option<&str> {
        match &self.builder.layout {
            Layout::Default => self.resources.default_layout.as_deref(),
            Layout::Disabled => None,
            Layout::Named(name) => Some(name.as_str()),
        }
    }

    fn source(&self, name: &str) -> Result<String, RegistryError> {
        self.resources.templates.get_content(
            name,
            self.builder.plugin.as_deref(),
            self.builder.theme.as_deref(),
        )
    }

    fn render_loaded(&self, name: &str, vars: &Map<String, serde_json::Value>) -> Result<String, RenderError> {
        let ctx = Value::from_serialize(vars);
        Ok(self.env.get_template(name)?.render(ctx)?)
    }
}

impl View for MiniJinjaView {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn builder(&self) -> &ViewBuilder {
        &self.builder
    }

    fn render(&mut self, template: &str) -> Result<String, RenderError> {
        let name = self.template_file(template);
        tracing::debug!(view = %self.class_name, template = %name, "rendering template");

        let source = self.source(&name)?;
        self.env.add_template_owned(name.clone(), source)?;
        let content = self.render_loaded(&name, &self.builder.vars)?;

        let layout = match self.active_layout() {
            Some(layout) => format!("layout/{}", layout),
            None => return Ok(content),
        };
        let source = self.source(&layout).map_err(|e| match e {
            RegistryError::NotFound { name, .. } => RenderError::LayoutNotFound(name),
            other => other.into(),
        })?;
        self.env.add_template_owned(layout.clone(), source)?;

        let mut vars = self.builder.vars.clone();
        vars.insert("content".to_string(), serde_json::Value::String(content));
        self.render_loaded(&layout, &vars)
    }
}

impl fmt::Debug for MiniJinjaView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniJinjaView")
            .field("class_name", &self.class_name)
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}
