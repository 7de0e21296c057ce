//! Integration tests for perfpair
//!
//! These tests drive whole suites through the same entry point the CLI uses,
//! collecting events in memory instead of reading stdout.

use perfpair::suites::{DETECTION_MODEL, IMAGE_LIBRARY};
use perfpair::{
    COMPLETE_TITLE, ConsoleReporter, Event, JsonReporter, MemoryReporter, OutputFormat, Settings,
    execute, wrap_fn,
};
use regex::Regex;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

const ALL_CAPABILITIES: &[&str] = &[IMAGE_LIBRARY, DETECTION_MODEL];

fn settings(suite: &str, filter: &str, disabled: &[&str], model_path: impl Into<PathBuf>) -> Settings {
    Settings {
        suite: suite.to_string(),
        filter: Regex::new(filter).unwrap(),
        format: OutputFormat::Human,
        pin_cpu: None,
        disabled: disabled.iter().map(|s| s.to_string()).collect(),
        model_path: model_path.into(),
    }
}

fn group_ids(suite: &str) -> Vec<&'static str> {
    perfpair::suites::all()
        .into_iter()
        .find(|s| s.id == suite)
        .map(|s| s.groups.iter().map(|g| g.id).collect())
        .unwrap_or_default()
}

/// The data suite runs every group in order, two timed variants each
#[test]
fn test_data_suite_end_to_end() {
    let reporter = MemoryReporter::new();
    let s = settings("data", ".*", ALL_CAPABILITIES, "missing.onnx");

    let summary = execute(&s, &reporter).unwrap();

    assert_eq!(summary.groups_run, 7);
    assert_eq!(summary.groups_skipped, 0);
    assert_eq!(summary.measurements, 14);
    assert_eq!(reporter.sections(), group_ids("data"));

    let events = reporter.events();
    let banner = events
        .iter()
        .position(|e| matches!(e, Event::Banner { title } if title == "Data Processing Performance Examples"))
        .unwrap();
    // Only capability diagnostics may precede the banner
    assert!(
        events[..banner]
            .iter()
            .all(|e| matches!(e, Event::Diagnostic { .. }))
    );
    assert!(matches!(&events[events.len() - 2], Event::Summary { .. }));
    assert!(matches!(&events[events.len() - 1], Event::Complete { title } if title == COMPLETE_TITLE));
}

/// Every measurement is reported with a non-negative elapsed time and
/// tagged with the group it ran in
#[test]
fn test_systems_measurements_are_tagged() {
    let reporter = MemoryReporter::new();
    let s = settings("systems", ".*", ALL_CAPABILITIES, "missing.onnx");

    let summary = execute(&s, &reporter).unwrap();

    assert_eq!(summary.groups_run, 7);
    assert_eq!(summary.measurements, 16);

    let ids = group_ids("systems");
    for m in reporter.measurements() {
        assert!(m.elapsed_ms >= 0.0, "{} reported {}", m.name, m.elapsed_ms);
        assert!(ids.iter().any(|id| *id == m.group), "unknown group {}", m.group);
    }
}

/// Gated groups are skipped in registration order with one notice each;
/// groups removed by the filter produce no notice at all
#[test]
fn test_vision_skips_without_capabilities() {
    let reporter = MemoryReporter::new();
    let s = settings("vision", "^(?:image|model|frame|memory|preprocessing)_", ALL_CAPABILITIES, "missing.onnx");

    let summary = execute(&s, &reporter).unwrap();

    assert_eq!(summary.groups_run, 0);
    assert_eq!(summary.groups_skipped, 5);
    assert!(reporter.sections().is_empty());
    assert_eq!(
        reporter.skipped(),
        vec![
            "image_resizing",
            "model_loading",
            "frame_processing",
            "memory_efficiency",
            "preprocessing_pipeline",
        ]
    );

    let diagnostics: Vec<_> = reporter
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Diagnostic { capability, .. } => Some(capability),
            _ => None,
        })
        .collect();
    assert_eq!(diagnostics, vec![IMAGE_LIBRARY, DETECTION_MODEL]);

    let lines = reporter.lines();
    assert!(lines.iter().any(|l| l.contains("Computer Vision & AI Optimization Best Practices")));
}

/// A model file on disk makes the model loading group run both patterns
#[test]
fn test_model_loading_with_weights_file() {
    let mut weights = tempfile::NamedTempFile::new().unwrap();
    weights.write_all(&[64u8; 1024]).unwrap();

    let reporter = MemoryReporter::new();
    let s = settings("vision", "^model_loading$", &[IMAGE_LIBRARY], weights.path());

    let summary = execute(&s, &reporter).unwrap();

    assert_eq!(summary.groups_run, 1);
    assert_eq!(summary.measurements, 4);
    assert_eq!(reporter.sections(), vec!["model_loading"]);
}

/// JSON lines carry an event tag and one object per event
#[test]
fn test_json_output_lines() {
    let reporter = JsonReporter::new(Vec::new());
    let s = settings("data", "^fibonacci$", ALL_CAPABILITIES, "missing.onnx");

    execute(&s, &reporter).unwrap();

    let text = String::from_utf8(reporter.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let kinds: Vec<_> = lines.iter().map(|v| v["event"].as_str().unwrap()).collect();

    assert_eq!(
        kinds,
        vec![
            "diagnostic",
            "diagnostic",
            "banner",
            "section",
            "measurement",
            "measurement",
            "summary",
            "complete",
        ]
    );
    assert_eq!(lines[0]["reason"], "disabled by configuration");
    assert_eq!(lines[4]["name"], "fibonacci_no_cache");
    assert_eq!(lines[4]["group"], "fibonacci");
    assert!(lines[4]["elapsed_ms"].as_f64().unwrap() >= 0.0);
    assert!(lines[4]["recorded_at"].is_string());
}

/// A filter matching nothing runs nothing
#[test]
fn test_empty_plan() {
    let reporter = MemoryReporter::new();
    let s = settings("all", "^no_such_group$", ALL_CAPABILITIES, "missing.onnx");

    let summary = execute(&s, &reporter).unwrap();

    assert_eq!(summary.groups_run + summary.groups_skipped, 0);
    assert!(
        reporter
            .events()
            .iter()
            .all(|e| matches!(e, Event::Diagnostic { .. }))
    );
}

struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A closed stdout ends the run with an error instead of running on silently
#[test]
fn test_closed_output_fails_run() {
    let reporter = ConsoleReporter::new(ClosedPipe);
    let s = settings("data", ".*", ALL_CAPABILITIES, "missing.onnx");

    let err = execute(&s, &reporter).unwrap_err();

    assert!(
        err.chain()
            .filter_map(|cause| cause.downcast_ref::<io::Error>())
            .any(|e| e.kind() == io::ErrorKind::BrokenPipe)
    );
}

fn slow_answer(delay: Duration) -> u32 {
    std::thread::sleep(delay);
    42
}

/// The wrapper returns the callable's value and times at least the delay
#[test]
fn test_wrapper_scenario() {
    let reporter = MemoryReporter::new();
    let mut timed = wrap_fn(&reporter, slow_answer);

    assert_eq!(timed(Duration::from_millis(10)), 42);

    let m = &reporter.measurements()[0];
    assert_eq!(m.name, "slow_answer");
    assert!(m.elapsed_ms >= 10.0);
    assert!(m.to_string().starts_with("slow_answer: "));
    assert!(m.to_string().ends_with(" ms"));
}
