//! Unit tests for the recording file format

use std::time::Duration;

use cmdmock::{
    decode_as, Error, EventRegistry, ProcessExitEvent, Recording, Stream, StreamCloseEvent,
    TimelineEvent,
};
use serde_json::json;

use crate::helpers::{exit_at, fixtures_dir, load_fixture, sample_recording, write_at};

#[test]
fn fixture_decodes_every_builtin_event() {
    let recording =
        Recording::from_json_str(&load_fixture("greet.json"), &EventRegistry::builtin()).unwrap();

    assert_eq!(recording.path, "/bin/sh");
    assert_eq!(recording.args.len(), 2);
    assert_eq!(recording.timeline.len(), 4);
    assert_eq!(recording.timeline[0].time_offset, Duration::from_nanos(1_200_000));
    assert_eq!(recording.output(Stream::Stdout), b"hello\n");
    assert_eq!(recording.output(Stream::Stderr), b"oops\n");
    assert_eq!(
        recording.timeline[2].event,
        TimelineEvent::StreamClose(StreamCloseEvent {})
    );
    assert_eq!(recording.exit_code(), Some(3));
    assert_eq!(recording.duration(), Duration::from_millis(2));
}

#[test]
fn fixture_is_stored_in_canonical_layout() {
    let text = load_fixture("greet.json");
    let recording = Recording::from_json_str(&text, &EventRegistry::builtin()).unwrap();
    assert_eq!(recording.to_json_pretty().unwrap(), text.trim_end());
}

#[test]
fn from_path_reads_file() {
    let recording =
        Recording::from_path(fixtures_dir().join("greet.json"), &EventRegistry::builtin())
            .unwrap();
    assert_eq!(recording.exit_code(), Some(3));
}

#[test]
fn from_path_missing_file_is_io_error() {
    let err = Recording::from_path(
        fixtures_dir().join("does-not-exist.json"),
        &EventRegistry::builtin(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn unknown_event_type_rejects_whole_document() {
    let err = Recording::from_json_str(&load_fixture("bogus_event.json"), &EventRegistry::builtin())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownEventType(ref t) if t == "bogus-event"));
    assert!(err.to_string().contains("bogus-event"));
}

#[test]
fn malformed_json_is_decode_error() {
    let err = Recording::from_json_str("{\"Path\": ", &EventRegistry::builtin()).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn wire_names_match_file_format() {
    let value: serde_json::Value =
        serde_json::from_str(&sample_recording(0).to_json().unwrap()).unwrap();

    assert_eq!(value["Path"], "/bin/echo");
    assert_eq!(value["Args"], json!(["hello"]));
    assert_eq!(value["Timeline"][0]["Type"], "stream-write");
    assert_eq!(value["Timeline"][0]["TimeOffset"], 1_000_000);
    assert_eq!(value["Timeline"][0]["Event"]["Stream"], 1);
    assert_eq!(value["Timeline"][0]["Event"]["Data"], "aGVsbG8K");
    assert_eq!(value["Timeline"][1]["Event"]["ExitCode"], 0);
}

#[test]
fn binary_output_survives_encoding() {
    let bytes: Vec<u8> = (0..=255u8).collect();
    let recording = Recording::new(
        "x",
        vec![],
        vec![cmdmock::TimelineEntry::new(
            Duration::ZERO,
            cmdmock::StreamWriteEvent::new(Stream::Stderr, bytes.clone()),
        )],
    );
    let decoded =
        Recording::from_json_str(&recording.to_json().unwrap(), &EventRegistry::builtin())
            .unwrap();
    assert_eq!(decoded.output(Stream::Stderr), bytes);
}

#[test]
fn custom_registry_decodes_extra_event_type() {
    let mut registry = EventRegistry::builtin();
    registry
        .register("legacy-exit", decode_as::<ProcessExitEvent>)
        .unwrap();

    let text = r#"{"Path":"x","Args":[],"Timeline":[
        {"Type":"legacy-exit","TimeOffset":5,"Event":{"ExitCode":7}}]}"#;
    let recording = Recording::from_json_str(text, &registry).unwrap();
    assert_eq!(recording.exit_code(), Some(7));
    assert!(Recording::from_json_str(text, &EventRegistry::builtin()).is_err());
}

#[test]
fn exit_code_requires_trailing_exit_entry() {
    let recording = Recording::new("x", vec![], vec![exit_at(1, 0), write_at(2, Stream::Stdout, "late")]);
    assert_eq!(recording.exit_code(), None);
}
