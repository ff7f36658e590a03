//! Segmentation tests over JSON-lines session logs
//!
//! Logs are parsed with the same reader the binary uses, then segmented with
//! each policy.

use std::path::Path;
use trialstat::event::{EventNames, JsonLinesSource};
use trialstat::filter::EventFilter;
use trialstat::segment::{segment, Outcome, SegmentationPolicy};

fn parse(log: &str) -> Vec<trialstat::event::Event> {
    JsonLinesSource::parse_str(log, Path::new("test.jsonl"), &EventFilter::all()).unwrap()
}

#[test]
fn test_single_boundary_trial() {
    let log = r#"
{"name": "stm_size", "value": 30.0, "time": 100.0}
{"name": "stm_rotation_in_depth", "value": 10.0, "time": 100.5}
{"name": "Announce_TrialStart", "value": 1.0, "time": 101.0}
{"name": "success", "value": 1.0, "time": 102.0}
"#;

    let trials = segment(
        &parse(log),
        SegmentationPolicy::BoundaryAnchored,
        &EventNames::default(),
    );

    assert_eq!(trials.len(), 1);
    assert_eq!(trials[0].trial_number, 1);
    assert_eq!(trials[0].time, 101.0);
    assert_eq!(trials[0].stimulus_size, Some(30.0));
    assert_eq!(trials[0].stimulus_rotation, Some(10.0));
    assert_eq!(trials[0].outcome, Outcome::Success);
}

#[test]
fn test_outcome_anchored_trial_at_end_of_stream() {
    let log = r#"
# size-staircase session
{"name": "failure", "value": 1.0, "time": 1.0}
{"name": "stm_size", "value": 40.0, "time": 1.5}
{"name": "success", "value": 1.0, "time": 9.0}
{"name": "stm_size", "value": 35.0, "time": 9.5}
"#;

    let trials = segment(
        &parse(log),
        SegmentationPolicy::OutcomeAnchored,
        &EventNames::default(),
    );

    assert_eq!(trials.len(), 2);
    assert_eq!(trials[1].outcome, Outcome::Success);
    assert_eq!(trials[1].stimulus_size, Some(35.0));
    assert!(trials[1].stimulus_rotation.is_none());
}

#[test]
fn test_no_anchor_yields_no_trials() {
    let log = r#"
{"name": "stm_size", "value": 30.0, "time": 0.0}
{"name": "success", "value": 0.0, "time": 1.0}
{"name": "Announce_TrialEnd", "value": 1.0, "time": 2.0}
"#;

    for policy in [
        SegmentationPolicy::BoundaryAnchored,
        SegmentationPolicy::OutcomeAnchored,
        SegmentationPolicy::OutcomeAnchoredWithPosition,
    ] {
        assert!(segment(&parse(log), policy, &EventNames::default()).is_empty());
    }
}

#[test]
fn test_policy_filter_keeps_segmentation_intact() {
    let log = r#"
{"name": "stm_size", "value": 30.0, "time": 0.0}
{"name": "stm_rotation_in_depth", "value": -30.0, "time": 0.1}
{"name": "Announce_TrialStart", "value": 1.0, "time": 0.2}
{"name": "failure", "value": 1.0, "time": 0.3}
{"name": "Announce_TrialEnd", "value": 1.0, "time": 0.4}
"#;
    let names = EventNames::default();
    let filter = EventFilter::for_policy(&names, SegmentationPolicy::BoundaryAnchored);
    let events = JsonLinesSource::parse_str(log, Path::new("f.jsonl"), &filter).unwrap();

    let trials = segment(&events, SegmentationPolicy::BoundaryAnchored, &names);
    assert_eq!(trials.len(), 1);
    assert_eq!(trials[0].stimulus_rotation, Some(-30.0));
}

#[test]
fn test_malformed_line_reports_location() {
    let log = "{\"name\": \"stm_size\", \"value\": 30.0, \"time\": 0.0}\nnot json\n";
    let err = JsonLinesSource::parse_str(log, Path::new("bad.jsonl"), &EventFilter::all())
        .unwrap_err();
    assert!(err.to_string().contains("bad.jsonl:2"));
}

#[test]
fn test_trials_serialize_without_absent_parameters() {
    let log = r#"
{"name": "success", "value": 1.0, "time": 1.0}
{"name": "stm_size", "value": 35.0, "time": 1.5}
"#;
    let trials = segment(
        &parse(log),
        SegmentationPolicy::OutcomeAnchored,
        &EventNames::default(),
    );

    let json = serde_json::to_string(&trials[0]).unwrap();
    assert!(json.contains("\"outcome\":\"success\""));
    assert!(!json.contains("stimulus_rotation"));
}
