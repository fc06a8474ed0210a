//! # fragments - Reusable view fragments
//!
//! A fragment is a small, self-contained piece of a page: a tag cloud, a
//! menu, a "latest comments" box. A host (a controller or a view) asks for
//! one by reference, the fragment's action gathers whatever it needs, and
//! the fragment renders its own template into a string the host embeds.
//!
//! ## Core Concepts
//!
//! - [`Fragment`]: The render contract, derived with `#[derive(Fragment)]`
//! - [`FragmentState`]: Per-invocation state every fragment embeds
//! - [`actions`]: Builds a fragment's action table from an impl block
//! - [`FragmentClass`]: Typed options and construction
//! - [`FragmentRegistry`]: Locates classes by name and plugin
//! - [`FragmentHost`]: Dispatch capability for controllers and views
//!
//! ## References
//!
//! | Reference | Class | Template |
//! |-----------|-------|----------|
//! | `"TagCloud"` | `TagCloudFragment` | `Fragment/TagCloud/display` |
//! | `"TagCloud::smallList"` | `TagCloudFragment` | `Fragment/TagCloud/small_list` |
//! | `"Taxonomy.TagCloud::smallList"` | `TagCloudFragment` in plugin `Taxonomy` | `Fragment/TagCloud/small_list`, plugin templates first |
//!
//! ## Rendering
//!
//! [`FragmentHost::fragment`] returns the fragment after its action ran but
//! before rendering. Call [`Fragment::render`] to get the output or an
//! error, or [`Fragment::render_or_empty`] where an error cannot be handled
//! (it logs a warning through `tracing` and returns `""`).
//!
//! Templates and views come from [`fragments_render`].

// Lets the derive and attribute macros refer to `::fragments` from inside
// this crate.
extern crate self as fragments;

mod action;
mod context;
mod dispatcher;
mod error;
mod events;
mod fragment;
mod model;
mod reference;
mod registry;

pub use action::{positional_args, ActionArgs, ActionError, FragmentActions};
pub use context::{Request, Response};
pub use dispatcher::{dispatch, find_action, FragmentHost, HostContext};
pub use error::FragmentError;
pub use events::{Event, EventError, EventManager, ListenerFn};
pub use fragment::{
    decode_options, display_name, DebugInfo, Fragment, FragmentClass, FragmentState,
    FragmentType, NoOptions,
};
pub use model::{Model, ModelFactory, Models, TableLocator, TableRegistry, TABLE_MODEL_TYPE};
pub use reference::{plugin_split, FragmentReference, CLASS_SUFFIX, DEFAULT_ACTION};
pub use registry::{
    ClassId, FragmentConstructor, FragmentRegistry, APP_NAMESPACE, FRAGMENT_NAMESPACE,
    FRAMEWORK_NAMESPACE,
};

pub use fragments_macros::{actions, Fragment};

/// Re-exported for the render crate's types in public signatures.
pub use fragments_render;

#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use serde_json;
}
