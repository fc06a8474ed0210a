//! # fragments-render - Template views for fragments
//!
//! This crate is the template side of `fragments`. It decides nothing about
//! *which* template a fragment wants; it only knows how to find a template by
//! name and render it with a set of variables.
//!
//! ## Core Concepts
//!
//! - [`TemplateRegistry`]: Resolves template names across inline templates,
//!   theme roots, plugin roots and application roots
//! - [`ViewBuilder`]: Settings for one view (class, template path, plugin,
//!   theme, helpers, variables, layout)
//! - [`View`]: A built view; [`MiniJinjaView`] is the default implementation
//! - [`ViewFactory`]: Registry of view classes that builds views
//! - [`HelperRegistry`]: Named bundles of template filters and functions
//! - [`ViewConfig`]: YAML-loadable template locations and defaults
//!
//! ## Quick Start
//!
//! ```rust
//! use fragments_render::{TemplateRegistry, ViewBuilder, ViewFactory};
//!
//! let mut templates = TemplateRegistry::new();
//! templates.add_inline("Fragment/Greeting/display", "Hello, {{ name }}!");
//!
//! let factory = ViewFactory::new(templates);
//! let vars = serde_json::json!({"name": "World"});
//! let mut view = factory
//!     .build(
//!         ViewBuilder::new()
//!             .template_path("Fragment/Greeting")
//!             .disable_layout()
//!             .vars(vars.as_object().cloned().unwrap()),
//!     )
//!     .unwrap();
//!
//! assert_eq!(view.render("display").unwrap(), "Hello, World!");
//! ```
//!
//! ## Missing Templates
//!
//! A template that cannot be found is always reported as
//! [`RenderError::TemplateNotFound`], carrying every location that was
//! searched. Callers that need to tell "this template is missing" apart from
//! other failures should match on that variant (or use
//! [`RenderError::is_template_not_found`]).

mod config;
mod error;
mod factory;
mod helpers;
mod inflect;
pub mod registry;
mod view;

pub use config::{ViewConfig, DEFAULT_VIEW_CLASS};
pub use error::RenderError;
pub use factory::{ViewConstructor, ViewFactory};
pub use helpers::{register_text_helper, HelperFn, HelperRegistry};
pub use inflect::{template_name, underscore};
pub use registry::{RegistryError, ResolvedTemplate, TemplateRegistry, TEMPLATE_EXTENSIONS};
pub use view::{Layout, MiniJinjaView, View, ViewBuilder, ViewResources};

// Re-exported so view classes and helpers can be written without a direct
// dependency.
pub use minijinja;
