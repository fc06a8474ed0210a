//! Error types for fragment dispatch and rendering.

use fragments_render::RenderError;
use thiserror::Error;

/// Errors raised while dispatching or rendering a fragment.
///
/// Resolution errors ([`MissingFragmentClass`], [`UnknownFragmentAction`],
/// [`InvalidReference`]) come from [`FragmentHost::fragment`] and mean the
/// caller asked for something that does not exist. [`MissingFragmentView`]
/// comes from rendering and replaces the engine's "template not found" error.
/// Every other engine failure is passed through as [`Render`].
///
/// [`MissingFragmentClass`]: FragmentError::MissingFragmentClass
/// [`UnknownFragmentAction`]: FragmentError::UnknownFragmentAction
/// [`InvalidReference`]: FragmentError::InvalidReference
/// [`MissingFragmentView`]: FragmentError::MissingFragmentView
/// [`Render`]: FragmentError::Render
/// [`FragmentHost::fragment`]: crate::FragmentHost::fragment
#[derive(Debug, Error)]
pub enum FragmentError {
    /// No class is registered for the reference.
    #[error("fragment class {class_name} could not be found")]
    MissingFragmentClass { class_name: String },

    /// The class has no action with the requested name.
    #[error("Class {class_name} does not have a \"{action}\" method.")]
    UnknownFragmentAction { class_name: String, action: String },

    /// The action's template does not exist.
    #[error("template \"{file}\" for fragment {name} could not be found")]
    MissingFragmentView {
        file: String,
        name: String,
        /// Every location that was tried.
        searched: Vec<String>,
    },

    /// The class name does not follow the `<Name>Fragment` convention.
    #[error("invalid fragment class {class_name}: {reason}")]
    InvalidFragmentClass { class_name: String, reason: String },

    /// The reference string is malformed.
    #[error("invalid fragment reference \"{reference}\": {reason}")]
    InvalidReference { reference: String, reason: String },

    /// The options map does not fit the class's options type.
    #[error("invalid options for {class_name}: {message}")]
    InvalidOptions { class_name: String, message: String },

    /// An action argument is missing or has the wrong type.
    #[error("invalid argument {position} for {class_name}::{action}(): {message}")]
    InvalidArgument {
        class_name: String,
        action: String,
        position: usize,
        message: String,
    },

    /// The action ran and returned an error.
    #[error("{class_name}::{action}() failed: {source}")]
    ActionFailed {
        class_name: String,
        action: String,
        #[source]
        source: anyhow::Error,
    },

    /// No model factory is registered for the model type.
    #[error("no model factory registered for \"{kind}\"")]
    MissingModelFactory { kind: String },

    /// The model provider failed or returned an unexpected type.
    #[error("could not load model \"{alias}\": {message}")]
    ModelLoad { alias: String, message: String },

    /// A value could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other template engine failure.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl FragmentError {
    /// Returns true for errors raised while resolving a reference.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            FragmentError::MissingFragmentClass { .. }
                | FragmentError::UnknownFragmentAction { .. }
                | FragmentError::InvalidReference { .. }
        )
    }
}
