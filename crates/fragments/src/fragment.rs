//! Fragments and their per-invocation state.
//!
//! A fragment is a struct that embeds a [`FragmentState`], derives
//! [`Fragment`], and declares its actions with `#[actions]`:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fragments::{actions, Fragment, FragmentState};
//! use fragments_render::{TemplateRegistry, ViewFactory};
//!
//! #[derive(Fragment)]
//! struct GreetingFragment {
//!     state: FragmentState,
//! }
//!
//! #[actions]
//! impl GreetingFragment {
//!     pub fn display(&mut self, name: String) -> anyhow::Result<()> {
//!         self.state.set("name", name)?;
//!         Ok(())
//!     }
//! }
//!
//! let mut templates = TemplateRegistry::new();
//! templates.add_inline("Fragment/Greeting/display", "Hello, {{ name }}!");
//! let views = Arc::new(ViewFactory::new(templates));
//!
//! let mut greeting = GreetingFragment { state: FragmentState::new(views) };
//! greeting.invoke("display", vec!["World".into()]).unwrap();
//! assert_eq!(greeting.render(None).unwrap(), "Hello, World!");
//! ```
//!
//! # Rendering
//!
//! `render` builds a fresh view every time, with layout disabled, and looks
//! the template up under `Fragment/<display name>/`. The display name is
//! the class name without its `Fragment` suffix. A missing template becomes
//! [`FragmentError::MissingFragmentView`]; other engine errors pass through.
//!
//! `render_or_empty` is for contexts that cannot handle an error: it logs a
//! warning and returns an empty string instead.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use fragments_render::{template_name, RenderError, View, ViewBuilder, ViewFactory};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::ActionError;
use crate::context::{Request, Response};
use crate::error::FragmentError;
use crate::events::EventManager;
use crate::model::{Models, TableLocator, TABLE_MODEL_TYPE};
use crate::reference::{CLASS_SUFFIX, DEFAULT_ACTION};

/// Returns a class name without its `Fragment` suffix.
///
/// # Errors
///
/// Returns [`FragmentError::InvalidFragmentClass`] if the name does not end
/// in `Fragment` or is nothing but the suffix.
pub fn display_name(class_name: &str) -> Result<&str, FragmentError> {
    match class_name.strip_suffix(CLASS_SUFFIX) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(FragmentError::InvalidFragmentClass {
            class_name: class_name.to_string(),
            reason: format!("class name must be <Name>{}", CLASS_SUFFIX),
        }),
    }
}

/// Snapshot of a fragment for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugInfo {
    pub plugin: Option<String>,
    pub template: String,
    pub view_class: Option<String>,
    pub request: Request,
    pub response: Response,
}

/// State shared by every fragment type.
pub struct FragmentState {
    template: String,
    plugin: Option<String>,
    theme: Option<String>,
    view_class: Option<String>,
    helpers: Vec<String>,
    request: Arc<Request>,
    response: Arc<Response>,
    events: EventManager,
    views: Arc<ViewFactory>,
    view: Option<Box<dyn View>>,
    vars: Map<String, Value>,
    models: Models,
}

impl FragmentState {
    /// Creates state that renders through `views`, with an empty request and
    /// response and no model factories.
    pub fn new(views: Arc<ViewFactory>) -> Self {
        Self {
            template: DEFAULT_ACTION.to_string(),
            plugin: None,
            theme: None,
            view_class: None,
            helpers: Vec::new(),
            request: Arc::new(Request::default()),
            response: Arc::new(Response::default()),
            events: EventManager::new(),
            views,
            view: None,
            vars: Map::new(),
            models: Models::new(),
        }
    }

    pub fn with_request(mut self, request: Arc<Request>) -> Self {
        self.request = request;
        self
    }

    pub fn with_response(mut self, response: Arc<Response>) -> Self {
        self.response = response;
        self
    }

    pub fn with_event_manager(mut self, events: EventManager) -> Self {
        self.events = events;
        self
    }

    /// Serves `"Table"` models from `locator`.
    pub fn with_table_locator(mut self, locator: Rc<dyn TableLocator>) -> Self {
        self.models.register_locator(locator);
        self
    }

    /// The template rendered when `render` gets no name.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Sets the template, underscoring names without a `/`.
    pub fn set_template(&mut self, template: &str) {
        self.template = template_name(template);
    }

    pub fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    pub fn set_plugin(&mut self, plugin: Option<String>) {
        self.plugin = plugin;
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    pub fn set_theme(&mut self, theme: Option<String>) {
        self.theme = theme;
    }

    /// The view class to render with; `None` uses the factory default.
    pub fn view_class(&self) -> Option<&str> {
        self.view_class.as_deref()
    }

    pub fn set_view_class(&mut self, view_class: Option<String>) {
        self.view_class = view_class;
    }

    pub fn helpers(&self) -> &[String] {
        &self.helpers
    }

    pub fn set_helpers(&mut self, helpers: Vec<String>) {
        self.helpers = helpers;
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn event_manager(&self) -> &EventManager {
        &self.events
    }

    pub fn views(&self) -> &ViewFactory {
        &self.views
    }

    /// The view built by the last render, if any.
    pub fn view(&self) -> Option<&dyn View> {
        self.view.as_deref()
    }

    /// Sets a view variable.
    pub fn set<V: Serialize>(&mut self, name: impl Into<String>, value: V) -> Result<(), FragmentError> {
        self.vars.insert(name.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Sets every entry of a map-like value as a view variable.
    pub fn set_many<V: Serialize>(&mut self, values: V) -> Result<(), FragmentError> {
        match serde_json::to_value(values)? {
            Value::Object(map) => {
                self.vars.extend(map);
                Ok(())
            }
            Value::Null => Ok(()),
            other => Err(FragmentError::Serialization(serde::ser::Error::custom(format!(
                "view variables must be a map, got {}",
                other
            )))),
        }
    }

    pub fn vars(&self) -> &Map<String, Value> {
        &self.vars
    }

    pub fn models(&self) -> &Models {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut Models {
        &mut self.models
    }

    /// Loads a table through the host's locator.
    pub fn load_model<T: 'static>(&mut self, alias: &str) -> Result<Rc<T>, FragmentError> {
        self.models.load(alias, TABLE_MODEL_TYPE)
    }

    /// Loads a model through the factory registered for `kind`.
    pub fn load_model_as<T: 'static>(&mut self, alias: &str, kind: &str) -> Result<Rc<T>, FragmentError> {
        self.models.load(alias, kind)
    }

    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            plugin: self.plugin.clone(),
            template: self.template.clone(),
            view_class: self.view_class.clone(),
            request: (*self.request).clone(),
            response: (*self.response).clone(),
        }
    }

    /// Renders `template` (or the current template) for the fragment whose
    /// display name is `name`.
    pub fn render_view(&mut self, name: &str, template: Option<&str>) -> Result<String, FragmentError> {
        if let Some(template) = template {
            self.set_template(template);
        }
        let file = self.template.clone();

        self.view = None;
        let builder = ViewBuilder::new()
            .class_name(self.view_class.clone())
            .template_path(format!("{}/{}", CLASS_SUFFIX, name))
            .plugin(self.plugin.clone())
            .theme(self.theme.clone())
            .helpers(self.helpers.iter().cloned())
            .vars(self.vars.clone())
            .disable_layout();

        tracing::debug!(fragment = %name, template = %file, "rendering fragment");
        let view = self.view.insert(self.views.build(builder)?);
        view.render(&file).map_err(|e| match e {
            RenderError::TemplateNotFound { searched, .. } => FragmentError::MissingFragmentView {
                file,
                name: name.to_string(),
                searched,
            },
            other => other.into(),
        })
    }
}

impl fmt::Debug for FragmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentState")
            .field("template", &self.template)
            .field("plugin", &self.plugin)
            .field("theme", &self.theme)
            .field("view_class", &self.view_class)
            .field("helpers", &self.helpers)
            .field("vars", &self.vars)
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

/// A renderable unit invoked by name and action.
///
/// Implemented by `#[derive(Fragment)]`; the provided methods hold the
/// render contract.
pub trait Fragment {
    fn state(&self) -> &FragmentState;

    fn state_mut(&mut self) -> &mut FragmentState;

    /// The type's class name, e.g. `"TagCloudFragment"`.
    fn class_name(&self) -> &'static str;

    /// Names accepted by [`invoke`](Fragment::invoke).
    fn action_names(&self) -> &'static [&'static str];

    /// Runs an action with positional arguments.
    fn invoke(&mut self, action: &str, args: Vec<Value>) -> Result<(), ActionError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The class name without its `Fragment` suffix.
    fn display_name(&self) -> Result<&'static str, FragmentError> {
        display_name(self.class_name())
    }

    /// Renders the fragment.
    ///
    /// `template` replaces the current template name first. Names without a
    /// `/` are underscored; names with one are used verbatim, relative to
    /// the template root.
    ///
    /// # Errors
    ///
    /// - [`FragmentError::InvalidFragmentClass`] if the class name has no
    ///   display name
    /// - [`FragmentError::MissingFragmentView`] if the template is absent
    /// - [`FragmentError::Render`] for any other engine failure
    fn render(&mut self, template: Option<&str>) -> Result<String, FragmentError> {
        let name = self.display_name()?;
        self.state_mut().render_view(name, template)
    }

    /// Renders the current template, or logs a warning and returns `""`.
    fn render_or_empty(&mut self) -> String {
        match self.render(None) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(fragment = self.class_name(), "could not render fragment - {}", e);
                String::new()
            }
        }
    }

    fn debug_info(&self) -> DebugInfo {
        self.state().debug_info()
    }
}

impl dyn Fragment {
    /// Returns the fragment as a concrete type.
    pub fn downcast_ref<T: Fragment + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Fragment + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Returns true if the fragment is a `T`.
    pub fn is<T: Fragment + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl fmt::Debug for dyn Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("class_name", &self.class_name())
            .field("state", self.state())
            .finish()
    }
}

/// Static class name of a fragment type. Implemented by `#[derive(Fragment)]`.
pub trait FragmentType {
    const CLASS_NAME: &'static str;
}

/// A fragment type that can be created by the dispatcher.
///
/// `Options` replaces an untyped option whitelist: the dispatcher
/// deserializes it from the options map, so keys it does not name are
/// ignored and a value of the wrong type is an error.
pub trait FragmentClass: Fragment + FragmentType + Sized + 'static {
    type Options: DeserializeOwned + Default;

    fn create(state: FragmentState, options: Self::Options) -> Result<Self, FragmentError>;
}

/// Options type for fragments that take none. Accepts and ignores any map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct NoOptions {}

/// Decodes an options map for `T`. An empty map gives the default options.
pub fn decode_options<T: FragmentClass>(options: &Map<String, Value>) -> Result<T::Options, FragmentError> {
    if options.is_empty() {
        return Ok(T::Options::default());
    }
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| FragmentError::InvalidOptions {
        class_name: T::CLASS_NAME.to_string(),
        message: e.to_string(),
    })
}
