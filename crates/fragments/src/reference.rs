//! Fragment reference parsing.
//!
//! A reference names a fragment and the action to run on it:
//!
//! | Reference | Plugin | Name | Action |
//! |-----------|--------|------|--------|
//! | `"TagCloud"` | - | `TagCloud` | `display` |
//! | `"TagCloud::smallList"` | - | `TagCloud` | `smallList` |
//! | `"Taxonomy.TagCloud::smallList"` | `Taxonomy` | `TagCloud` | `smallList` |
//!
//! The action is kept exactly as written. Underscoring happens later, when
//! the dispatcher assigns the fragment's template name.

use std::fmt;
use std::str::FromStr;

use crate::error::FragmentError;

/// Action used when a reference has no `::action` part.
pub const DEFAULT_ACTION: &str = "display";

/// Suffix shared by every fragment class name.
pub const CLASS_SUFFIX: &str = "Fragment";

const ACTION_SEPARATOR: &str = "::";

/// Splits `"Plugin.Name"` into its plugin and name.
///
/// Only the first `.` separates; a name without one has no plugin.
pub fn plugin_split(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((plugin, rest)) => (Some(plugin), rest),
        None => (None, name),
    }
}

/// A parsed `"Plugin.Name::action"` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentReference {
    pub plugin: Option<String>,
    pub name: String,
    pub action: String,
}

impl FragmentReference {
    /// Parses a reference string.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::InvalidReference`] for an empty name, plugin
    /// or action, and for more than one `::` separator.
    pub fn parse(reference: &str) -> Result<Self, FragmentError> {
        let invalid = |reason: &str| FragmentError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = reference.split(ACTION_SEPARATOR);
        let qualified = parts.next().unwrap_or_default();
        let action = parts.next();
        if parts.next().is_some() {
            return Err(invalid("more than one `::` separator"));
        }

        let action = match action {
            Some("") => return Err(invalid("empty action")),
            Some(action) => action,
            None => DEFAULT_ACTION,
        };

        let (plugin, name) = plugin_split(qualified);
        if plugin == Some("") {
            return Err(invalid("empty plugin name"));
        }
        if name.is_empty() {
            return Err(invalid("empty fragment name"));
        }

        Ok(Self {
            plugin: plugin.map(String::from),
            name: name.to_string(),
            action: action.to_string(),
        })
    }

    /// Returns `"Plugin.Name"`, or just the name.
    pub fn plugin_and_name(&self) -> String {
        match &self.plugin {
            Some(plugin) => format!("{}.{}", plugin, self.name),
            None => self.name.clone(),
        }
    }

    /// Returns the class name the reference asks for, e.g.
    /// `"Taxonomy.TagCloudFragment"`.
    pub fn class_name(&self) -> String {
        format!("{}{}", self.plugin_and_name(), CLASS_SUFFIX)
    }
}

impl FromStr for FragmentReference {
    type Err = FragmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FragmentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.plugin_and_name(), ACTION_SEPARATOR, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_name_only_defaults_action() {
        let r = FragmentReference::parse("TagCloud").unwrap();
        assert_eq!(r.plugin, None);
        assert_eq!(r.name, "TagCloud");
        assert_eq!(r.action, "display");
    }

    #[test]
    fn test_action_kept_verbatim() {
        let r: FragmentReference = "TagCloud::smallList".parse().unwrap();
        assert_eq!(r.action, "smallList");
        assert_eq!(r.class_name(), "TagCloudFragment");
    }

    #[test]
    fn test_plugin_prefix() {
        let r = FragmentReference::parse("Taxonomy.TagCloud::smallList").unwrap();
        assert_eq!(r.plugin.as_deref(), Some("Taxonomy"));
        assert_eq!(r.name, "TagCloud");
        assert_eq!(r.plugin_and_name(), "Taxonomy.TagCloud");
        assert_eq!(r.class_name(), "Taxonomy.TagCloudFragment");
        assert_eq!(r.to_string(), "Taxonomy.TagCloud::smallList");
    }

    #[test]
    fn test_plugin_split_first_dot_only() {
        assert_eq!(plugin_split("A.B.C"), (Some("A"), "B.C"));
        assert_eq!(plugin_split("Menu"), (None, "Menu"));
    }

    #[test]
    fn test_invalid_references() {
        for bad in ["", "::display", "TagCloud::", "A::b::c", ".TagCloud", "Taxonomy."] {
            let err = FragmentReference::parse(bad).unwrap_err();
            assert!(
                matches!(err, FragmentError::InvalidReference { ref reference, .. } if reference == bad),
                "expected InvalidReference for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    proptest! {
        #[test]
        fn prop_missing_action_defaults_to_display(
            plugin in proptest::option::of("[A-Z][a-zA-Z]{0,8}"),
            name in "[A-Z][a-zA-Z0-9]{0,12}",
        ) {
            let text = match &plugin {
                Some(p) => format!("{}.{}", p, name),
                None => name.clone(),
            };
            let r = FragmentReference::parse(&text).unwrap();
            prop_assert_eq!(r.action.as_str(), DEFAULT_ACTION);
            prop_assert_eq!(r.plugin, plugin);
            prop_assert_eq!(r.name, name);
        }

        #[test]
        fn prop_display_round_trips(
            plugin in proptest::option::of("[A-Z][a-zA-Z]{0,8}"),
            name in "[A-Z][a-zA-Z0-9]{0,12}",
            action in "[a-z][a-zA-Z_]{0,12}",
        ) {
            let r = FragmentReference { plugin, name, action };
            let parsed = FragmentReference::parse(&r.to_string()).unwrap();
            prop_assert_eq!(parsed, r);
        }
    }
}
