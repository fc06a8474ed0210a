//! Tests for `#[derive(Fragment)]` and `#[actions]`.

use std::sync::Arc;

use fragments::{actions, ActionError, Fragment, FragmentActions, FragmentState, FragmentType};
use fragments_render::{TemplateRegistry, ViewFactory};
use serde::Deserialize;
use serde_json::json;

fn state() -> FragmentState {
    FragmentState::new(Arc::new(ViewFactory::new(TemplateRegistry::new())))
}

#[derive(Debug, Deserialize, PartialEq)]
struct Range {
    from: u32,
    to: u32,
}

#[derive(Fragment)]
struct ArchiveFragment {
    #[fragment(state)]
    base: FragmentState,
    log: Vec<String>,
}

#[actions]
impl ArchiveFragment {
    /// Unit return.
    pub fn display(&mut self) {
        self.log.push("display".into());
    }

    pub fn by_year(&mut self, year: u32, month: Option<u8>) -> anyhow::Result<()> {
        self.log.push(format!("by_year({}, {:?})", year, month));
        Ok(())
    }

    pub fn between(&mut self, range: Range, tags: Vec<String>) {
        self.log.push(format!("between({}-{}, {})", range.from, range.to, tags.join("+")));
    }

    #[action(name = "topRated")]
    pub fn top(&mut self) -> Result<(), std::io::Error> {
        Err(std::io::Error::other("ratings offline"))
    }

    pub fn count(&self) -> Result<usize, std::fmt::Error> {
        Ok(self.log.len())
    }

    #[action(skip)]
    pub fn reset(&mut self) {
        self.log.clear();
    }

    fn private_helper(&self) -> usize {
        self.log.len()
    }

    pub fn new_empty() -> Self {
        Self {
            base: state(),
            log: Vec::new(),
        }
    }
}

#[test]
fn test_action_table() {
    assert_eq!(
        ArchiveFragment::ACTIONS,
        &["display", "by_year", "between", "topRated", "count"]
    );
    let archive = ArchiveFragment::new_empty();
    assert_eq!(archive.action_names(), ArchiveFragment::ACTIONS);
    assert_eq!(archive.private_helper(), 0);
}

#[test]
fn test_class_name_and_state_field() {
    let mut archive = ArchiveFragment::new_empty();
    assert_eq!(ArchiveFragment::CLASS_NAME, "ArchiveFragment");
    assert_eq!(archive.class_name(), "ArchiveFragment");
    assert_eq!(archive.display_name().unwrap(), "Archive");

    archive.state_mut().set_template("byYear");
    assert_eq!(archive.base.template(), "by_year");
}

#[test]
fn test_unit_action() {
    let mut archive = ArchiveFragment::new_empty();
    archive.invoke("display", vec![]).unwrap();
    assert_eq!(archive.log, vec!["display"]);
}

#[test]
fn test_optional_parameter() {
    let mut archive = ArchiveFragment::new_empty();
    archive.invoke("by_year", vec![json!(2024)]).unwrap();
    archive.invoke("by_year", vec![json!(2024), json!(3)]).unwrap();
    assert_eq!(archive.log, vec!["by_year(2024, None)", "by_year(2024, Some(3))"]);
}

#[test]
fn test_structured_parameters() {
    let mut archive = ArchiveFragment::new_empty();
    archive
        .invoke("between", vec![json!({"from": 1, "to": 5}), json!(["a", "b"])])
        .unwrap();
    assert_eq!(archive.log, vec!["between(1-5, a+b)"]);
}

#[test]
fn test_missing_required_parameter() {
    let mut archive = ArchiveFragment::new_empty();
    let err = archive.invoke("by_year", vec![]).unwrap_err();
    assert!(matches!(err, ActionError::InvalidArgument { position: 0, .. }));
    assert!(archive.log.is_empty());
}

#[test]
fn test_wrong_parameter_type() {
    let mut archive = ArchiveFragment::new_empty();
    let err = archive
        .invoke("by_year", vec![json!(2024), json!("March")])
        .unwrap_err();
    assert!(matches!(err, ActionError::InvalidArgument { position: 1, .. }));
}

#[test]
fn test_renamed_action_error() {
    let mut archive = ArchiveFragment::new_empty();
    match archive.invoke("topRated", vec![]).unwrap_err() {
        ActionError::Failed(e) => assert_eq!(e.to_string(), "ratings offline"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(archive.invoke("top", vec![]), Err(ActionError::Unknown)));
}

#[test]
fn test_non_unit_ok_value_is_discarded() {
    let mut archive = ArchiveFragment::new_empty();
    archive.invoke("count", vec![]).unwrap();
}

#[test]
fn test_skipped_method_is_not_an_action() {
    let mut archive = ArchiveFragment::new_empty();
    archive.invoke("display", vec![]).unwrap();
    assert!(matches!(archive.invoke("reset", vec![]), Err(ActionError::Unknown)));
    assert_eq!(archive.log.len(), 1);

    archive.reset();
    assert!(archive.log.is_empty());
}

#[derive(Fragment)]
struct EmptyFragment {
    state: FragmentState,
}

#[actions]
impl EmptyFragment {}

#[test]
fn test_empty_action_table() {
    let mut empty = EmptyFragment { state: state() };
    assert!(EmptyFragment::ACTIONS.is_empty());
    assert!(matches!(empty.invoke("display", vec![]), Err(ActionError::Unknown)));
}
