//! Fragment dispatch for controllers and views.
//!
//! Any type that can hand out a [`HostContext`] can create fragments by
//! implementing [`FragmentHost`]:
//!
//! ```text
//! "Taxonomy.TagCloud::smallList"
//!   → FragmentReference::parse          (plugin, name, action)
//!   → FragmentRegistry::resolve         (class id, or MissingFragmentClass)
//!   → FragmentHost::create_fragment     (state from the host, options)
//!   → action lookup + invoke            (or UnknownFragmentAction)
//!   → Box<dyn Fragment>                 (not rendered yet)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fragments::{actions, Fragment, FragmentClass, FragmentError, FragmentHost,
//!                 FragmentRegistry, FragmentState, HostContext, NoOptions};
//! use fragments_render::{TemplateRegistry, ViewFactory};
//! use serde_json::json;
//!
//! #[derive(Fragment)]
//! struct CounterFragment {
//!     state: FragmentState,
//! }
//!
//! #[actions]
//! impl CounterFragment {
//!     pub fn display(&mut self, count: u32) -> Result<(), FragmentError> {
//!         self.state.set("count", count)
//!     }
//! }
//!
//! impl FragmentClass for CounterFragment {
//!     type Options = NoOptions;
//!
//!     fn create(state: FragmentState, _: NoOptions) -> Result<Self, FragmentError> {
//!         Ok(Self { state })
//!     }
//! }
//!
//! struct Page {
//!     ctx: HostContext,
//! }
//!
//! impl FragmentHost for Page {
//!     fn host_context(&self) -> &HostContext {
//!         &self.ctx
//!     }
//! }
//!
//! let mut templates = TemplateRegistry::new();
//! templates.add_inline("Fragment/Counter/display", "{{ count }} items");
//!
//! let registry = Arc::new(FragmentRegistry::new());
//! registry.register::<CounterFragment>().unwrap();
//!
//! let page = Page {
//!     ctx: HostContext::new(ViewFactory::new(templates)).with_registry(registry),
//! };
//! let mut counter = page.fragment("Counter", json!({"count": 3}), ()).unwrap();
//! assert_eq!(counter.render(None).unwrap(), "3 items");
//! ```

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use fragments_render::{underscore, ViewFactory};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::action::{positional_args, ActionError};
use crate::context::{Request, Response};
use crate::error::FragmentError;
use crate::events::EventManager;
use crate::fragment::{Fragment, FragmentState};
use crate::model::TableLocator;
use crate::reference::{FragmentReference, CLASS_SUFFIX};
use crate::registry::{FragmentConstructor, FragmentRegistry, FRAGMENT_NAMESPACE};

/// What a host shares with the fragments it creates.
#[derive(Clone)]
pub struct HostContext {
    pub request: Arc<Request>,
    pub response: Arc<Response>,
    pub events: EventManager,
    pub views: Arc<ViewFactory>,
    pub tables: Option<Rc<dyn TableLocator>>,
    pub registry: Arc<FragmentRegistry>,
    /// Theme whose templates override plugin and application templates.
    pub theme: Option<String>,
    /// Helpers copied onto every fragment.
    pub helpers: Vec<String>,
    /// View class fragments should render with.
    pub view_class: Option<String>,
    /// The host's own view class, set when the host is itself a view.
    pub host_view_class: Option<String>,
}

impl HostContext {
    /// Creates a context over a view factory, using the global registry.
    pub fn new(views: ViewFactory) -> Self {
        Self {
            request: Arc::new(Request::default()),
            response: Arc::new(Response::default()),
            events: EventManager::new(),
            views: Arc::new(views),
            tables: None,
            registry: FragmentRegistry::global(),
            theme: None,
            helpers: Vec::new(),
            view_class: None,
            host_view_class: None,
        }
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.request = Arc::new(request);
        self
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Arc::new(response);
        self
    }

    pub fn with_event_manager(mut self, events: EventManager) -> Self {
        self.events = events;
        self
    }

    pub fn with_tables(mut self, tables: impl TableLocator + 'static) -> Self {
        self.tables = Some(Rc::new(tables));
        self
    }

    pub fn with_registry(mut self, registry: Arc<FragmentRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn with_helpers<I, S>(mut self, helpers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.helpers = helpers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_view_class(mut self, view_class: impl Into<String>) -> Self {
        self.view_class = Some(view_class.into());
        self
    }

    /// Marks the host as a view of the given class.
    pub fn as_view(mut self, class_name: impl Into<String>) -> Self {
        self.host_view_class = Some(class_name.into());
        self
    }

    /// The view class created fragments inherit. A host view's own class
    /// wins over `view_class`.
    pub fn inherited_view_class(&self) -> Option<&str> {
        self.host_view_class
            .as_deref()
            .or(self.view_class.as_deref())
    }

    /// Base state for a new fragment: request, response, events, views and
    /// the `"Table"` model factory.
    pub fn fragment_state(&self) -> FragmentState {
        let state = FragmentState::new(Arc::clone(&self.views))
            .with_request(Arc::clone(&self.request))
            .with_response(Arc::clone(&self.response))
            .with_event_manager(self.events.clone());
        match &self.tables {
            Some(tables) => state.with_table_locator(Rc::clone(tables)),
            None => state,
        }
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("registry", &self.registry)
            .field("theme", &self.theme)
            .field("helpers", &self.helpers)
            .field("view_class", &self.view_class)
            .field("host_view_class", &self.host_view_class)
            .finish_non_exhaustive()
    }
}

/// Fragment creation for controller-like and view-like hosts.
pub trait FragmentHost {
    fn host_context(&self) -> &HostContext;

    /// Resolves `reference`, creates the fragment and runs its action.
    ///
    /// `args` become the action's positional arguments: an object's values
    /// in insertion order, an array's elements, or nothing for `()`.
    /// `options` must serialize to a map (or `()`); it is decoded into the
    /// class's options type. The returned fragment has not been rendered.
    ///
    /// # Errors
    ///
    /// - [`FragmentError::InvalidReference`] for a malformed reference
    /// - [`FragmentError::MissingFragmentClass`] if no class resolves
    /// - [`FragmentError::UnknownFragmentAction`] if the class has no such action
    /// - [`FragmentError::InvalidOptions`], [`FragmentError::InvalidArgument`]
    ///   and [`FragmentError::ActionFailed`] from construction and the action
    fn fragment<A, O>(&self, reference: &str, args: A, options: O) -> Result<Box<dyn Fragment>, FragmentError>
    where
        Self: Sized,
        A: Serialize,
        O: Serialize,
    {
        let args = serde_json::to_value(args)?;
        let options = serde_json::to_value(options)?;
        dispatch(self, reference, args, options)
    }

    /// Creates the fragment and applies the host's settings to it.
    ///
    /// Hosts override this to customize every fragment they create.
    fn create_fragment(
        &self,
        reference: &FragmentReference,
        constructor: &FragmentConstructor,
        options: &Map<String, Value>,
    ) -> Result<Box<dyn Fragment>, FragmentError> {
        let ctx = self.host_context();
        let mut fragment = constructor(ctx.fragment_state(), options)?;

        let state = fragment.state_mut();
        state.set_template(&reference.action);
        state.set_plugin(reference.plugin.clone());
        state.set_theme(ctx.theme.clone());
        state.set_helpers(ctx.helpers.clone());
        if let Some(view_class) = ctx.inherited_view_class() {
            state.set_view_class(Some(view_class.to_string()));
        }
        Ok(fragment)
    }
}

/// Runs the dispatch pipeline for `host`.
///
/// This is what [`FragmentHost::fragment`] calls after converting its
/// arguments; it is public for hosts that already hold JSON values.
pub fn dispatch<H: FragmentHost + ?Sized>(
    host: &H,
    reference: &str,
    args: Value,
    options: Value,
) -> Result<Box<dyn Fragment>, FragmentError> {
    let reference = FragmentReference::parse(reference)?;
    tracing::debug!(
        plugin = ?reference.plugin,
        name = %reference.name,
        action = %reference.action,
        "dispatching fragment"
    );

    let ctx = host.host_context();
    let missing = || FragmentError::MissingFragmentClass {
        class_name: reference.class_name(),
    };
    let class_id = ctx
        .registry
        .resolve(&reference.plugin_and_name(), FRAGMENT_NAMESPACE, CLASS_SUFFIX)
        .ok_or_else(missing)?;
    let constructor = ctx.registry.constructor(&class_id).ok_or_else(missing)?;

    let options = match options {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(FragmentError::InvalidOptions {
                class_name: class_id.short_name().to_string(),
                message: format!("options must be a map, got {}", other),
            })
        }
    };

    let mut fragment = host.create_fragment(&reference, &constructor, &options)?;
    tracing::debug!(class = %class_id, template = %fragment.state().template(), "created fragment");

    let class_name = fragment.class_name();
    let action = find_action(fragment.action_names(), &reference.action).ok_or_else(|| {
        FragmentError::UnknownFragmentAction {
            class_name: class_name.to_string(),
            action: reference.action.clone(),
        }
    })?;

    let args = positional_args(args);
    tracing::debug!(class = %class_name, action, args = args.len(), "invoking fragment action");
    fragment.invoke(action, args).map_err(|e| match e {
        ActionError::Unknown => FragmentError::UnknownFragmentAction {
            class_name: class_name.to_string(),
            action: reference.action.clone(),
        },
        ActionError::InvalidArgument { position, message } => FragmentError::InvalidArgument {
            class_name: class_name.to_string(),
            action: action.to_string(),
            position,
            message,
        },
        ActionError::Failed(source) => FragmentError::ActionFailed {
            class_name: class_name.to_string(),
            action: action.to_string(),
            source,
        },
    })?;

    Ok(fragment)
}

/// Finds a registered action by exact name, then by underscored name.
pub fn find_action(actions: &'static [&'static str], requested: &str) -> Option<&'static str> {
    if let Some(found) = actions.iter().find(|a| **a == requested) {
        return Some(*found);
    }
    let underscored = underscore(requested);
    actions.iter().find(|a| **a == underscored).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragments_render::TemplateRegistry;

    #[test]
    fn test_find_action() {
        const ACTIONS: &[&str] = &["display", "small_list"];
        assert_eq!(find_action(ACTIONS, "display"), Some("display"));
        assert_eq!(find_action(ACTIONS, "smallList"), Some("small_list"));
        assert_eq!(find_action(ACTIONS, "small_list"), Some("small_list"));
        assert_eq!(find_action(ACTIONS, "bigList"), None);
    }

    #[test]
    fn test_exact_match_wins() {
        const ACTIONS: &[&str] = &["smallList", "small_list"];
        assert_eq!(find_action(ACTIONS, "smallList"), Some("smallList"));
    }

    #[test]
    fn test_host_view_class_wins() {
        let ctx = HostContext::new(ViewFactory::new(TemplateRegistry::new())).with_view_class("Ajax");
        assert_eq!(ctx.inherited_view_class(), Some("Ajax"));

        let ctx = ctx.as_view("Admin");
        assert_eq!(ctx.inherited_view_class(), Some("Admin"));
    }

    #[test]
    fn test_fragment_state_shares_handles() {
        let ctx = HostContext::new(ViewFactory::new(TemplateRegistry::new()))
            .with_request(Request::new("GET", "/tags"));
        let state = ctx.fragment_state();

        assert_eq!(state.request().path, "/tags");
        assert!(state.event_manager().same_as(&ctx.events));
        assert!(!state.models().has_factory("Table"));
    }
}
