mod common;

use case_lookup_core::model::NoticeLevel;
use case_lookup_core::{Event, Step};
use common::*;

#[test]
fn failed_state_load_shows_notice_and_can_be_retried() {
    let mut h = Harness::new();
    let mut states = h.send_one(Event::AppStarted);
    h.respond(&mut states, connection_refused());

    assert!(h.model.reference.states.is_empty());
    let notice = h.model.notice.clone().expect("notice shown");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Failed to load states");
    let view = h.view();
    assert!(!view.state_select.enabled);
    assert!(view.retry.visible);

    let mut retry = h.send_one(Event::RetryPressed);
    h.respond(&mut retry, ok(states_body()));
    assert_eq!(h.model.reference.states, ["Delhi", "Goa"]);
    assert!(!h.view().retry.visible);
}

#[test]
fn rejected_district_load_keeps_previous_options_and_step() {
    let mut h = Harness::started();
    h.send(Event::StateSelected("Delhi".into()));
    let mut districts = h.send_one(Event::NextPressed);
    h.respond(&mut districts, ok(districts_body()));
    h.send(Event::BackPressed);
    assert_eq!(h.model.step, Step::SelectState);

    let before = h.model.reference.clone();
    let mut again = h.send_one(Event::NextPressed);
    h.respond(&mut again, rejected("Portal busy"));

    assert_eq!(h.model.step, Step::SelectState);
    assert_eq!(h.model.reference, before);
    assert_eq!(
        h.model.notice.as_ref().map(|n| n.message.as_str()),
        Some("Failed to load districts")
    );
}

#[test]
fn malformed_district_payload_is_a_transport_failure() {
    let mut h = Harness::started();
    h.send(Event::StateSelected("Goa".into()));
    let mut districts = h.send_one(Event::NextPressed);
    h.respond(&mut districts, ok(serde_json::json!({ "success": true, "districts": 7 })));

    assert_eq!(h.model.step, Step::SelectState);
    assert!(h.model.reference.districts.is_empty());
    assert!(h.model.notice.is_some());
}

#[test]
fn failed_court_complex_load_leaves_options_unchanged() {
    let mut h = Harness::at_case_type_step();
    let before = h.model.reference.court_complexes.clone();
    h.send(Event::BackPressed);

    // Court complexes are present, so there is nothing to retry.
    assert!(h.send(Event::RetryPressed).is_empty());

    h.model.reference.court_complexes = Default::default();
    let mut reload = h.send_one(Event::RetryPressed);
    h.respond(&mut reload, status(502));
    assert!(h.model.reference.court_complexes.is_empty());
    assert_eq!(
        h.model.notice.as_ref().map(|n| n.message.as_str()),
        Some("Error loading court complexes. Please try again.")
    );

    let mut reload = h.send_one(Event::RetryPressed);
    h.respond(&mut reload, court_complexes_reply());
    assert_eq!(h.model.reference.court_complexes, before);
}

#[test]
fn rejected_case_types_keep_user_on_court_complex_step() {
    let mut h = Harness::at_case_type_step();
    h.send(Event::BackPressed);
    h.send(Event::CourtComplexSelected("2".into()));
    assert!(h.model.reference.case_types.is_empty(), "new complex drops old case types");

    let mut case_types = h.send_one(Event::NextPressed);
    h.respond(&mut case_types, rejected("No case types"));

    assert_eq!(h.model.step, Step::SelectCourtComplex);
    assert_eq!(
        h.model.notice.as_ref().map(|n| n.message.as_str()),
        Some("Failed to load case types: No case types")
    );
}

#[test]
fn unknown_codes_are_ignored() {
    let mut h = Harness::at_case_type_step();
    h.send(Event::CaseTypeSelected("99".into()));
    assert_eq!(h.model.selections.case_type, None);

    let mut h = Harness::started();
    h.send(Event::StateSelected("Atlantis".into()));
    assert_eq!(h.model.selections.state, None);
}

#[test]
fn placeholder_clears_selection() {
    let mut h = Harness::at_case_type_step();
    h.send(Event::CaseTypeSelected("12".into()));
    h.send(Event::CaseTypeSelected(String::new()));

    assert_eq!(h.model.selections.case_type, None);
    assert!(!h.view().next.enabled);
}
