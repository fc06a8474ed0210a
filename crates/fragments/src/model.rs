//! On-demand model loading for fragments.
//!
//! Hosts supply a [`TableLocator`]; the fragment registers it as the factory
//! for the `"Table"` model type when it is created. Fragment actions then
//! call [`FragmentState::load_model`](crate::FragmentState::load_model) and
//! get back a shared, typed handle. The core itself never loads models.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::FragmentError;

/// Model type served by the host's [`TableLocator`].
pub const TABLE_MODEL_TYPE: &str = "Table";

/// A loaded model, type-erased.
pub type Model = Rc<dyn Any>;

/// Loads a model by alias.
pub type ModelFactory = Rc<dyn Fn(&str) -> anyhow::Result<Model>>;

/// Host-side provider of table objects.
pub trait TableLocator {
    /// Returns the table registered under `alias`.
    fn get(&self, alias: &str) -> anyhow::Result<Model>;
}

/// A [`TableLocator`] over a fixed set of tables.
#[derive(Default)]
pub struct TableRegistry {
    tables: HashMap<String, Model>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table under an alias, replacing any previous one.
    pub fn insert<T: 'static>(&mut self, alias: impl Into<String>, table: T) -> &mut Self {
        self.tables.insert(alias.into(), Rc::new(table));
        self
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.tables.contains_key(alias)
    }
}

impl TableLocator for TableRegistry {
    fn get(&self, alias: &str) -> anyhow::Result<Model> {
        self.tables
            .get(alias)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("table \"{}\" is not registered", alias))
    }
}

impl fmt::Debug for TableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut aliases: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        f.debug_struct("TableRegistry").field("tables", &aliases).finish()
    }
}

/// Per-fragment model factories and loaded models.
#[derive(Clone, Default)]
pub struct Models {
    factories: HashMap<String, ModelFactory>,
    loaded: HashMap<String, Model>,
}

impl Models {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory for a model type.
    pub fn register_factory<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> anyhow::Result<Model> + 'static,
    {
        self.factories.insert(kind.into(), Rc::new(factory));
    }

    /// Routes the `"Table"` model type through a locator.
    pub fn register_locator(&mut self, locator: Rc<dyn TableLocator>) {
        self.register_factory(TABLE_MODEL_TYPE, move |alias| locator.get(alias));
    }

    pub fn has_factory(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Returns true if `alias` has been loaded.
    pub fn is_loaded(&self, alias: &str) -> bool {
        self.loaded.contains_key(alias)
    }

    /// Loads a model, reusing an earlier load of the same alias.
    ///
    /// # Errors
    ///
    /// - [`FragmentError::MissingModelFactory`] if no factory serves `kind`
    /// - [`FragmentError::ModelLoad`] if the factory fails or the model is
    ///   not a `T`
    pub fn load<T: 'static>(&mut self, alias: &str, kind: &str) -> Result<Rc<T>, FragmentError> {
        let model = match self.loaded.get(alias) {
            Some(model) => Rc::clone(model),
            None => {
                let factory = self
                    .factories
                    .get(kind)
                    .ok_or_else(|| FragmentError::MissingModelFactory {
                        kind: kind.to_string(),
                    })?;
                tracing::debug!(alias, kind, "loading model");
                let model = factory(alias).map_err(|e| FragmentError::ModelLoad {
                    alias: alias.to_string(),
                    message: format!("{:#}", e),
                })?;
                self.loaded.insert(alias.to_string(), Rc::clone(&model));
                model
            }
        };

        model.downcast::<T>().map_err(|_| FragmentError::ModelLoad {
            alias: alias.to_string(),
            message: format!("model is not a {}", type_name::<T>()),
        })
    }
}

impl fmt::Debug for Models {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        let mut loaded: Vec<&str> = self.loaded.keys().map(String::as_str).collect();
        loaded.sort_unstable();
        f.debug_struct("Models")
            .field("factories", &kinds)
            .field("loaded", &loaded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    struct TagsTable {
        rows: Vec<&'static str>,
    }

    fn tables() -> Rc<dyn TableLocator> {
        let mut registry = TableRegistry::new();
        registry.insert("Tags", TagsTable { rows: vec!["rust", "web"] });
        Rc::new(registry)
    }

    #[test]
    fn test_load_through_locator() {
        let mut models = Models::new();
        models.register_locator(tables());

        let tags = models.load::<TagsTable>("Tags", TABLE_MODEL_TYPE).unwrap();
        assert_eq!(tags.rows, vec!["rust", "web"]);
        assert!(models.is_loaded("Tags"));
    }

    #[test]
    fn test_loads_are_cached_per_alias() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut models = Models::new();
        models.register_factory("Table", move |_| {
            counter.set(counter.get() + 1);
            Ok(Rc::new(7u32) as Model)
        });

        let a = models.load::<u32>("Counts", "Table").unwrap();
        let b = models.load::<u32>("Counts", "Table").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_missing_factory() {
        let err = Models::new().load::<u32>("Tags", "Table").unwrap_err();
        assert!(matches!(err, FragmentError::MissingModelFactory { ref kind } if kind == "Table"));
    }

    #[test]
    fn test_unknown_alias() {
        let mut models = Models::new();
        models.register_locator(tables());

        let err = models.load::<TagsTable>("Users", "Table").unwrap_err();
        match err {
            FragmentError::ModelLoad { alias, message } => {
                assert_eq!(alias, "Users");
                assert!(message.contains("not registered"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type() {
        let mut models = Models::new();
        models.register_locator(tables());

        let err = models.load::<String>("Tags", "Table").unwrap_err();
        assert!(matches!(err, FragmentError::ModelLoad { .. }));
    }
}
