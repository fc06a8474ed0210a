//! Error types for view rendering.
//!
//! [`RenderError`] is the error type for every view operation. It abstracts
//! over MiniJinja's errors so callers can match on stable variants, most
//! importantly [`RenderError::TemplateNotFound`], which fragment rendering
//! translates into its own "missing view" error.

use std::fmt;

use crate::registry::RegistryError;

/// Error type for view rendering operations.
#[derive(Debug)]
pub enum RenderError {
    /// No template file or inline template matched the requested name.
    TemplateNotFound {
        /// The name that was requested (including the view's sub-directory).
        name: String,
        /// Every location that was searched, in search order.
        searched: Vec<String>,
    },

    /// The configured layout could not be found.
    LayoutNotFound(String),

    /// The requested view class is not registered with the factory.
    MissingViewClass(String),

    /// A helper named by the view is not registered.
    MissingHelper(String),

    /// Template syntax error or evaluation failure.
    TemplateError(String),

    /// View variables could not be serialized.
    SerializationError(String),

    /// Configuration could not be loaded or parsed.
    ConfigError(String),

    /// I/O error (e.g., reading a template from disk).
    IoError(std::io::Error),
}

impl RenderError {
    /// Returns true if this error reports a missing template file.
    pub fn is_template_not_found(&self) -> bool {
        matches!(self, RenderError::TemplateNotFound { .. })
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TemplateNotFound { name, searched } => {
                write!(f, "template not found: {}", name)?;
                if !searched.is_empty() {
                    write!(f, " (searched: {})", searched.join(", "))?;
                }
                Ok(())
            }
            RenderError::LayoutNotFound(name) => write!(f, "layout not found: {}", name),
            RenderError::MissingViewClass(name) => write!(f, "view class not found: {}", name),
            RenderError::MissingHelper(name) => write!(f, "helper not found: {}", name),
            RenderError::TemplateError(msg) => write!(f, "template error: {}", msg),
            RenderError::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            RenderError::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            RenderError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::IoError(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::ConfigError(err.to_string())
    }
}

impl From<RegistryError> for RenderError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { name, searched } => {
                RenderError::TemplateNotFound { name, searched }
            }
            RegistryError::ReadError { path, message } => RenderError::IoError(
                std::io::Error::other(format!("{}: {}", path.display(), message)),
            ),
            RegistryError::DirectoryNotFound { path } => RenderError::ConfigError(format!(
                "template directory not found: {}",
                path.display()
            )),
        }
    }
}

// Includes that fail to resolve inside a template body surface through
// MiniJinja; they are reported as template errors, not as a missing view.
impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::BadSerialization => RenderError::SerializationError(err.to_string()),
            _ => RenderError::TemplateError(err.to_string()),
        }
    }
}
