// tests/submit_validation.rs

use conveyor::errors::ConveyorError;
use conveyor::submit::{JobSubmitter, RecordingBackend};
use conveyor_test_utils::builders::{submit_options, two_stage_config};
use tempfile::TempDir;

#[test]
fn test_empty_job_name_fails_before_any_scheduler_call() {
    conveyor_test_utils::init_tracing();

    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let mut opts = submit_options("", dir.path());
    opts.job_name = "  ".to_string();

    let mut backend = RecordingBackend::new();
    let mut submitter = JobSubmitter::new(&mut backend);
    let result = submitter.submit_master(&cfg, &opts);

    match result {
        Err(ConveyorError::MissingArgument(arg)) => assert_eq!(arg, "job-name"),
        other => panic!("Expected MissingArgument, got: {:?}", other.map(|_| ())),
    }

    // No scheduler calls, no filesystem side effects.
    assert!(backend.submitted.is_empty());
    assert!(!dir.path().join("logfiles").exists());
    assert!(!dir.path().join(".conveyor.lock").exists());
}

#[test]
fn test_empty_bind_paths_fail_fast() {
    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let mut opts = submit_options("demo", dir.path());
    opts.bind_paths = Vec::new();

    let mut backend = RecordingBackend::new();
    let mut submitter = JobSubmitter::new(&mut backend);

    match submitter.submit_master(&cfg, &opts) {
        Err(ConveyorError::MissingArgument(arg)) => assert_eq!(arg, "bind-paths"),
        other => panic!("Expected MissingArgument, got: {:?}", other.map(|_| ())),
    }
    assert!(backend.submitted.is_empty());
}

#[test]
fn test_blank_bind_path_entry_fails_fast() {
    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let mut opts = submit_options("demo", dir.path());
    opts.bind_paths = vec!["/data".to_string(), "".to_string()];

    let mut backend = RecordingBackend::new();
    let mut submitter = JobSubmitter::new(&mut backend);

    assert!(matches!(
        submitter.submit_master(&cfg, &opts),
        Err(ConveyorError::MissingArgument(_))
    ));
    assert!(backend.submitted.is_empty());
}

#[test]
fn test_stage_submission_failure_aborts_before_cleanup() {
    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let opts = submit_options("demo", dir.path());

    // Master succeeds, the quantify stage is rejected.
    let mut backend = RecordingBackend::new().fail_for("quantify");
    let mut submitter = JobSubmitter::new(&mut backend);

    assert!(matches!(
        submitter.submit_master(&cfg, &opts),
        Err(ConveyorError::Submission(_))
    ));

    // master + align went out; no cleanup job was scheduled.
    let names = backend.submitted_names();
    assert_eq!(names, vec!["demo", "align"]);
    assert!(!names.iter().any(|n| n.contains("cleanup")));
}
