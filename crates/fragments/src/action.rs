//! Action tables and positional argument decoding.
//!
//! [`FragmentActions`] is implemented by the `#[actions]` macro. The
//! generated `invoke_action` decodes each parameter from an [`ActionArgs`]
//! and calls the method; callers never reach a method that is not in
//! [`FragmentActions::ACTIONS`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Failure of one action call, before the dispatcher adds class context.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action is not in the table.
    #[error("unknown action")]
    Unknown,

    /// A positional argument is missing or has the wrong type.
    #[error("argument {position}: {message}")]
    InvalidArgument { position: usize, message: String },

    /// The action body returned an error.
    #[error(transparent)]
    Failed(anyhow::Error),
}

/// Compile-time action table of a fragment type.
pub trait FragmentActions {
    /// Registered action names, in declaration order.
    const ACTIONS: &'static [&'static str];

    /// Calls the action named `action` with positional arguments.
    fn invoke_action(&mut self, action: &str, args: Vec<Value>) -> Result<(), ActionError>;
}

/// Positional arguments for one action call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionArgs {
    values: Vec<Value>,
}

impl ActionArgs {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decodes the argument at `position`, which must be present.
    pub fn required<T: DeserializeOwned>(&self, position: usize) -> Result<T, ActionError> {
        let value = self
            .values
            .get(position)
            .ok_or_else(|| ActionError::InvalidArgument {
                position,
                message: "missing required argument".to_string(),
            })?;
        decode(value, position)
    }

    /// Decodes the argument at `position`; a missing or null value is `None`.
    pub fn optional<T: DeserializeOwned>(&self, position: usize) -> Result<Option<T>, ActionError> {
        match self.values.get(position) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(value, position).map(Some),
        }
    }
}

fn decode<T: DeserializeOwned>(value: &Value, position: usize) -> Result<T, ActionError> {
    T::deserialize(value).map_err(|e| ActionError::InvalidArgument {
        position,
        message: e.to_string(),
    })
}

/// Flattens dispatch arguments into positional values.
///
/// An object contributes its values in insertion order, an array its
/// elements, `null` nothing, and any other value is a single argument.
pub fn positional_args(args: Value) -> Vec<Value> {
    match args {
        Value::Null => Vec::new(),
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Array(values) => values,
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_values_keep_insertion_order() {
        let args = positional_args(json!({"limit": 10, "sort": "name", "again": true}));
        assert_eq!(args, vec![json!(10), json!("name"), json!(true)]);
    }

    #[test]
    fn test_other_shapes() {
        assert!(positional_args(Value::Null).is_empty());
        assert_eq!(positional_args(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(positional_args(json!("solo")), vec![json!("solo")]);
    }

    #[test]
    fn test_required() {
        let args = ActionArgs::new(vec![json!(10)]);
        assert_eq!(args.required::<usize>(0).unwrap(), 10);

        let err = args.required::<usize>(1).unwrap_err();
        assert!(matches!(err, ActionError::InvalidArgument { position: 1, .. }));

        let err = args.required::<String>(0).unwrap_err();
        assert!(matches!(err, ActionError::InvalidArgument { position: 0, .. }));
    }

    #[test]
    fn test_optional() {
        let args = ActionArgs::new(vec![json!(null), json!("x")]);
        assert_eq!(args.optional::<String>(0).unwrap(), None);
        assert_eq!(args.optional::<String>(1).unwrap(), Some("x".to_string()));
        assert_eq!(args.optional::<String>(2).unwrap(), None);
        assert!(args.optional::<u8>(1).is_err());
    }
}
