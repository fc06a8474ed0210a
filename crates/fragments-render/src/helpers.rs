//! Named helper bundles installed into views.
//!
//! A helper is a function that registers filters, functions or globals on a
//! MiniJinja [`Environment`]. Views list the helpers they want by name; the
//! view installs each one when it is built.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minijinja::{Environment, Value};

use crate::error::RenderError;
use crate::inflect::underscore;

/// Installs a helper's filters and functions on an environment.
pub type HelperFn = Arc<dyn Fn(&mut Environment<'static>) + Send + Sync>;

/// Registry of helper bundles by name.
#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: HashMap<String, HelperFn>,
}

impl HelperRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in helpers (`Text`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("Text", register_text_helper);
        registry
    }

    /// Registers (or replaces) a helper.
    pub fn register<F>(&mut self, name: impl Into<String>, install: F) -> &mut Self
    where
        F: Fn(&mut Environment<'static>) + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(install));
        self
    }

    /// Returns true if a helper with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Installs the named helpers, in order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingHelper`] for the first unknown name;
    /// helpers before it are already installed.
    pub fn install(&self, env: &mut Environment<'static>, names: &[String]) -> Result<(), RenderError> {
        for name in names {
            let helper = self
                .helpers
                .get(name)
                .ok_or_else(|| RenderError::MissingHelper(name.clone()))?;
            helper(env);
        }
        Ok(())
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HelperRegistry").field("helpers", &names).finish()
    }
}

/// The `Text` helper: `nl` and `underscore` filters.
pub fn register_text_helper(env: &mut Environment<'static>) {
    env.add_filter("nl", |value: Value| -> String { format!("{}\n", value) });
    env.add_filter("underscore", |value: String| -> String { underscore(&value) });
}
