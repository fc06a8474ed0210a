//! Event manager handle shared between hosts and fragments.
//!
//! A host hands its [`EventManager`] to every fragment it creates. The
//! fragment core never dispatches events itself; the handle is there so
//! fragment actions can notify listeners the host registered.
//!
//! Cloning an `EventManager` yields another handle to the same listeners.
//!
//! ```rust
//! use fragments::{Event, EventManager};
//! use serde_json::json;
//!
//! let events = EventManager::new();
//! events.on("Fragment.tagsLoaded", |event| {
//!     event.set_result(json!("seen"));
//!     Ok(())
//! });
//!
//! let event = events.dispatch(Event::new("Fragment.tagsLoaded")).unwrap();
//! assert_eq!(event.result(), Some(&json!("seen")));
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

/// An event passed to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    data: Value,
    result: Option<Value>,
    stopped: bool,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Value::Null,
            result: None,
            stopped: false,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: Value) {
        self.result = Some(result);
    }

    /// Stops later listeners from seeing this event.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Error returned by a listener.
#[derive(Debug, Error)]
#[error("listener for {event} failed: {message}")]
pub struct EventError {
    pub event: String,
    pub message: String,
}

impl EventError {
    pub fn new(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            message: message.into(),
        }
    }
}

/// Type alias for listener functions.
pub type ListenerFn = Rc<dyn Fn(&mut Event) -> Result<(), EventError>>;

/// Shared handle to named event listeners.
#[derive(Clone, Default)]
pub struct EventManager {
    listeners: Rc<RefCell<BTreeMap<String, Vec<ListenerFn>>>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener for an event name.
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> &Self
    where
        F: Fn(&mut Event) -> Result<(), EventError> + 'static,
    {
        self.listeners
            .borrow_mut()
            .entry(name.into())
            .or_default()
            .push(Rc::new(listener));
        self
    }

    /// Returns the number of listeners for an event name.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.borrow().get(name).map_or(0, Vec::len)
    }

    /// Returns true if both handles share the same listeners.
    pub fn same_as(&self, other: &EventManager) -> bool {
        Rc::ptr_eq(&self.listeners, &other.listeners)
    }

    /// Runs the listeners for `event` in registration order.
    ///
    /// Stops early when a listener stops propagation or fails.
    pub fn dispatch(&self, mut event: Event) -> Result<Event, EventError> {
        // Listeners may register more listeners, so run from a snapshot.
        let listeners: Vec<ListenerFn> = self
            .listeners
            .borrow()
            .get(event.name())
            .cloned()
            .unwrap_or_default();

        tracing::debug!(event = %event.name(), listeners = listeners.len(), "dispatching event");
        for listener in listeners {
            listener(&mut event)?;
            if event.is_stopped() {
                break;
            }
        }
        Ok(event)
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        let counts: BTreeMap<&str, usize> =
            listeners.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventManager")
            .field("listeners", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listeners_run_in_order() {
        let events = EventManager::new();
        events
            .on("render", |e| {
                e.set_result(json!(["first"]));
                Ok(())
            })
            .on("render", |e| {
                let mut seen = e.result().cloned().unwrap_or(json!([]));
                if let Some(list) = seen.as_array_mut() {
                    list.push(json!("second"));
                }
                e.set_result(seen);
                Ok(())
            });

        let event = events.dispatch(Event::new("render")).unwrap();
        assert_eq!(event.result(), Some(&json!(["first", "second"])));
    }

    #[test]
    fn test_stop_propagation() {
        let events = EventManager::new();
        events
            .on("render", |e| {
                e.stop_propagation();
                Ok(())
            })
            .on("render", |e| {
                e.set_result(json!("unreachable"));
                Ok(())
            });

        let event = events.dispatch(Event::new("render")).unwrap();
        assert!(event.is_stopped());
        assert_eq!(event.result(), None);
    }

    #[test]
    fn test_listener_error_aborts() {
        let events = EventManager::new();
        events.on("save", |e| Err(EventError::new(e.name(), "denied")));

        let err = events.dispatch(Event::new("save")).unwrap_err();
        assert_eq!(err.to_string(), "listener for save failed: denied");
    }

    #[test]
    fn test_clones_share_listeners() {
        let events = EventManager::new();
        let handle = events.clone();
        handle.on("x", |_| Ok(()));

        assert_eq!(events.listener_count("x"), 1);
        assert!(events.same_as(&handle));
        assert!(!events.same_as(&EventManager::new()));
    }

    #[test]
    fn test_no_listeners_is_ok() {
        let event = EventManager::new()
            .dispatch(Event::new("nothing").with_data(json!(1)))
            .unwrap();
        assert_eq!(event.data(), &json!(1));
    }
}
