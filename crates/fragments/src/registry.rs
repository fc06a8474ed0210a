//! Fragment class registry and locator.
//!
//! Classes are registered under a namespace base and looked up by the short
//! name a reference uses. A registered class is identified as
//! `<Base>/View/Fragment/<Name>Fragment`:
//!
//! | Registration | Class id |
//! |--------------|----------|
//! | `register::<TagCloudFragment>()` | `App/View/Fragment/TagCloudFragment` |
//! | `register_plugin::<TagCloudFragment>("Taxonomy")` | `Taxonomy/View/Fragment/TagCloudFragment` |
//! | `register_in::<MenuFragment>("Fragments")` | `Fragments/View/Fragment/MenuFragment` |
//!
//! # Resolution Order
//!
//! A plugin-qualified name (`"Taxonomy.TagCloud"`) is looked up only in the
//! plugin's namespace. An unqualified name is looked up in the application
//! namespace, then in the framework namespace ([`FRAMEWORK_NAMESPACE`]).
//!
//! Results, including misses, are memoized per name, namespace and suffix.
//! Registering a class clears the memo.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::error::FragmentError;
use crate::fragment::{decode_options, display_name, Fragment, FragmentClass, FragmentState};
use crate::reference::plugin_split;

/// Default application namespace.
pub const APP_NAMESPACE: &str = "App";

/// Namespace searched after the application for unqualified names.
pub const FRAMEWORK_NAMESPACE: &str = "Fragments";

/// Sub-namespace fragment classes live in.
pub const FRAGMENT_NAMESPACE: &str = "View/Fragment";

/// Builds a fragment from its base state and the caller's options.
pub type FragmentConstructor = Arc<
    dyn Fn(FragmentState, &Map<String, Value>) -> Result<Box<dyn Fragment>, FragmentError>
        + Send
        + Sync,
>;

/// Identifier of a registered class, e.g. `App/View/Fragment/TagCloudFragment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(base: &str, namespace: &str, class_name: &str) -> Self {
        Self(format!("{}/{}/{}", base, namespace, class_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace base (`App`, a plugin name, ...).
    pub fn base(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// The class name without namespaces.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type CacheKey = (String, String, String);

/// Registry of fragment classes.
pub struct FragmentRegistry {
    app_namespace: String,
    classes: RwLock<HashMap<ClassId, FragmentConstructor>>,
    cache: RwLock<HashMap<CacheKey, Option<ClassId>>>,
}

static GLOBAL: Lazy<Arc<FragmentRegistry>> = Lazy::new(|| Arc::new(FragmentRegistry::new()));

impl Default for FragmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentRegistry {
    /// Creates an empty registry with the default application namespace.
    pub fn new() -> Self {
        Self::with_app_namespace(APP_NAMESPACE)
    }

    pub fn with_app_namespace(namespace: impl Into<String>) -> Self {
        Self {
            app_namespace: namespace.into(),
            classes: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry used by hosts that do not supply their own.
    pub fn global() -> Arc<FragmentRegistry> {
        Arc::clone(&GLOBAL)
    }

    pub fn app_namespace(&self) -> &str {
        &self.app_namespace
    }

    /// Registers `T` in the application namespace.
    pub fn register<T: FragmentClass>(&self) -> Result<ClassId, FragmentError> {
        let base = self.app_namespace.clone();
        self.register_in::<T>(&base)
    }

    /// Registers `T` in a plugin's namespace.
    pub fn register_plugin<T: FragmentClass>(&self, plugin: &str) -> Result<ClassId, FragmentError> {
        self.register_in::<T>(plugin)
    }

    /// Registers `T` under an arbitrary namespace base.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::InvalidFragmentClass`] if `T`'s name does not
    /// follow the `<Name>Fragment` convention.
    pub fn register_in<T: FragmentClass>(&self, base: &str) -> Result<ClassId, FragmentError> {
        display_name(T::CLASS_NAME)?;
        let id = ClassId::new(base, FRAGMENT_NAMESPACE, T::CLASS_NAME);
        self.register_constructor(
            id.clone(),
            Arc::new(|state: FragmentState, options: &Map<String, Value>| {
                let options = decode_options::<T>(options)?;
                Ok(Box::new(T::create(state, options)?) as Box<dyn Fragment>)
            }),
        );
        Ok(id)
    }

    /// Registers a constructor under an explicit class id.
    pub fn register_constructor(&self, id: ClassId, constructor: FragmentConstructor) {
        tracing::debug!(class = %id, "registering fragment class");
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, constructor);
        self.clear_cache();
    }

    /// Removes every class.
    pub fn clear(&self) {
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.clear_cache();
    }

    fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn contains(&self, id: &ClassId) -> bool {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Returns every registered class id, sorted.
    pub fn class_ids(&self) -> Vec<ClassId> {
        let mut ids: Vec<ClassId> = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Returns the constructor for a class id.
    pub fn constructor(&self, id: &ClassId) -> Option<FragmentConstructor> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Resolves `"Name"` or `"Plugin.Name"` to a class id.
    ///
    /// `suffix` is appended to the short name and `namespace` sits between
    /// the base and the class name.
    pub fn resolve(&self, name: &str, namespace: &str, suffix: &str) -> Option<ClassId> {
        let key = (name.to_string(), namespace.to_string(), suffix.to_string());
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            tracing::debug!(name, namespace, class = ?hit, "class resolution cache hit");
            return hit.clone();
        }

        let (plugin, short) = plugin_split(name);
        let class_name = format!("{}{}", short, suffix);
        let bases: Vec<&str> = match plugin {
            Some(plugin) => vec![plugin],
            None => vec![self.app_namespace.as_str(), FRAMEWORK_NAMESPACE],
        };

        let found = {
            let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
            bases
                .into_iter()
                .map(|base| ClassId::new(base, namespace, &class_name))
                .find(|id| classes.contains_key(id))
        };
        tracing::debug!(name, namespace, class = ?found, "resolved fragment class");

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, found.clone());
        found
    }
}

impl fmt::Debug for FragmentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentRegistry")
            .field("app_namespace", &self.app_namespace)
            .field("classes", &self.class_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::CLASS_SUFFIX;

    fn constructor() -> FragmentConstructor {
        Arc::new(|_: FragmentState, _: &Map<String, Value>| {
            Err(FragmentError::InvalidOptions {
                class_name: "unused".into(),
                message: "unused".into(),
            })
        })
    }

    fn registry_with(ids: &[&str]) -> FragmentRegistry {
        let registry = FragmentRegistry::new();
        for id in ids {
            let mut parts = id.splitn(2, '/');
            let base = parts.next().unwrap();
            let class = parts.next().unwrap();
            registry.register_constructor(ClassId::new(base, FRAGMENT_NAMESPACE, class), constructor());
        }
        registry
    }

    #[test]
    fn test_class_id_parts() {
        let id = ClassId::new("Taxonomy", FRAGMENT_NAMESPACE, "TagCloudFragment");
        assert_eq!(id.as_str(), "Taxonomy/View/Fragment/TagCloudFragment");
        assert_eq!(id.base(), "Taxonomy");
        assert_eq!(id.short_name(), "TagCloudFragment");
    }

    #[test]
    fn test_app_before_framework() {
        let registry = registry_with(&["App/MenuFragment", "Fragments/MenuFragment"]);
        let id = registry.resolve("Menu", FRAGMENT_NAMESPACE, CLASS_SUFFIX).unwrap();
        assert_eq!(id.base(), "App");
    }

    #[test]
    fn test_framework_fallback() {
        let registry = registry_with(&["Fragments/MenuFragment"]);
        let id = registry.resolve("Menu", FRAGMENT_NAMESPACE, CLASS_SUFFIX).unwrap();
        assert_eq!(id.as_str(), "Fragments/View/Fragment/MenuFragment");
    }

    #[test]
    fn test_plugin_lookup_is_exclusive() {
        let registry = registry_with(&["App/TagCloudFragment"]);
        assert!(registry
            .resolve("Taxonomy.TagCloud", FRAGMENT_NAMESPACE, CLASS_SUFFIX)
            .is_none());

        let registry = registry_with(&["App/TagCloudFragment", "Taxonomy/TagCloudFragment"]);
        let id = registry
            .resolve("Taxonomy.TagCloud", FRAGMENT_NAMESPACE, CLASS_SUFFIX)
            .unwrap();
        assert_eq!(id.base(), "Taxonomy");
    }

    #[test]
    fn test_misses_are_cached_until_registration() {
        let registry = FragmentRegistry::new();
        assert!(registry.resolve("Menu", FRAGMENT_NAMESPACE, CLASS_SUFFIX).is_none());

        registry.register_constructor(
            ClassId::new("App", FRAGMENT_NAMESPACE, "MenuFragment"),
            constructor(),
        );
        assert!(registry.resolve("Menu", FRAGMENT_NAMESPACE, CLASS_SUFFIX).is_some());
    }

    #[test]
    fn test_custom_app_namespace() {
        let registry = FragmentRegistry::with_app_namespace("Blog");
        registry.register_constructor(
            ClassId::new("Blog", FRAGMENT_NAMESPACE, "MenuFragment"),
            constructor(),
        );
        let id = registry.resolve("Menu", FRAGMENT_NAMESPACE, CLASS_SUFFIX).unwrap();
        assert_eq!(id.base(), "Blog");
    }

    #[derive(crate::Fragment)]
    struct Widget {
        state: FragmentState,
    }

    #[crate::actions]
    impl Widget {}

    impl FragmentClass for Widget {
        type Options = crate::NoOptions;

        fn create(state: FragmentState, _: crate::NoOptions) -> Result<Self, FragmentError> {
            Ok(Self { state })
        }
    }

    #[test]
    fn test_register_rejects_unconventional_names() {
        let registry = FragmentRegistry::new();
        let err = registry.register::<Widget>().unwrap_err();
        assert!(matches!(err, FragmentError::InvalidFragmentClass { .. }));
        assert!(registry.class_ids().is_empty());
    }

    #[test]
    fn test_clear() {
        let registry = registry_with(&["App/MenuFragment"]);
        assert_eq!(registry.class_ids().len(), 1);
        registry.clear();
        assert!(registry.class_ids().is_empty());
        assert!(registry.resolve("Menu", FRAGMENT_NAMESPACE, CLASS_SUFFIX).is_none());
    }
}
