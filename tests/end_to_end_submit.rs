// tests/end_to_end_submit.rs

//! End-to-end controller scenario against the recording backend:
//! lock marker, master submission, stage submissions with `afterok`
//! links, cleanup submission with `afterany`, in that order.

use conveyor::controller::{RunController, RunPhase};
use conveyor::errors::ConveyorError;
use conveyor::lock::{LockManager, LOCK_FILE};
use conveyor::submit::{Dependency, RecordingBackend};
use conveyor_test_utils::builders::{submit_options, two_stage_config};
use tempfile::TempDir;

#[test]
fn test_submit_produces_lock_master_stages_and_cleanup_in_order() {
    conveyor_test_utils::init_tracing();

    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let opts = submit_options("demo", dir.path());

    let mut controller = RunController::new(RecordingBackend::new());
    let outcome = controller.run(&cfg, &opts, false).unwrap();

    // (a) the lock marker exists and stays held (deferred release).
    assert!(dir.path().join(LOCK_FILE).is_file());
    assert_eq!(outcome.phase, RunPhase::Running);

    let submitted = outcome.submitted.unwrap();
    let backend = &controller.backend;

    // (b)+(c) submission order: master, align, quantify, cleanup.
    assert_eq!(
        backend.submitted_names(),
        vec!["demo", "align", "quantify", "demo:cleanup"]
    );

    // Master has no dependency and a fixed log path.
    let master = &backend.submitted[0];
    assert!(master.dependency.is_none());
    let master_log = master.log_path.as_ref().unwrap();
    assert!(master_log.ends_with("logfiles/master.log"));

    // Root stage depends afterok on the master job.
    let align = &backend.submitted[1];
    assert_eq!(
        align.dependency,
        Some(Dependency::AfterOk(vec![submitted.master_job_id.clone()]))
    );
    assert_eq!(align.profile.as_ref().unwrap().cpus, 16);

    // Downstream stage depends afterok on its upstream stage's job id.
    let align_job_id = submitted
        .stage_jobs
        .iter()
        .find(|(name, _)| name == "align")
        .map(|(_, id)| id.clone())
        .unwrap();
    let quantify = &backend.submitted[2];
    assert_eq!(
        quantify.dependency,
        Some(Dependency::AfterOk(vec![align_job_id]))
    );

    // Cleanup runs afterany the master job, success or failure.
    let cleanup = &backend.submitted[3];
    assert_eq!(
        cleanup.dependency,
        Some(Dependency::AfterAny(submitted.master_job_id.clone()))
    );

    // Bookkeeping files.
    let mjobid = std::fs::read_to_string(dir.path().join("logfiles/mjobid.log")).unwrap();
    assert_eq!(mjobid.trim(), submitted.master_job_id);

    let job_log = std::fs::read_to_string(dir.path().join("logfiles/jobs.log")).unwrap();
    let lines: Vec<&str> = job_log.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with(&format!(
        "Submitted batch job {} (demo)",
        submitted.master_job_id
    )));
    assert!(lines[1].contains("(align)"));
    assert!(lines[2].contains("(quantify)"));
    assert!(lines[3].contains("(demo:cleanup)"));
}

#[test]
fn test_bind_paths_fold_in_outdir_and_tmp() {
    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let opts = submit_options("demo", dir.path());

    let mut controller = RunController::new(RecordingBackend::new());
    controller.run(&cfg, &opts, false).unwrap();

    let master = &controller.backend.submitted[0];
    assert!(master.bind_paths.contains(&"/data/raw".to_string()));
    assert!(master
        .bind_paths
        .contains(&dir.path().display().to_string()));
}

#[test]
fn test_second_run_on_locked_directory_fails_without_submissions() {
    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let opts = submit_options("demo", dir.path());

    let mut first = RunController::new(RecordingBackend::new());
    first.run(&cfg, &opts, false).unwrap();

    let mut second = RunController::new(RecordingBackend::new());
    match second.run(&cfg, &opts, false) {
        Err(ConveyorError::AlreadyLocked(_)) => {}
        other => panic!("Expected AlreadyLocked, got: {:?}", other.map(|_| ())),
    }
    assert_eq!(second.phase(), RunPhase::Failed);
    assert!(second.backend.submitted.is_empty());
}

#[test]
fn test_submission_failure_releases_lock() {
    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let opts = submit_options("demo", dir.path());

    let mut controller = RunController::new(RecordingBackend::new().fail_for("align"));
    assert!(controller.run(&cfg, &opts, false).is_err());

    // No cleanup job will ever run for this attempt, so the controller
    // released the lock itself; a retry can proceed.
    assert!(!LockManager::new(dir.path()).is_locked());
    assert_eq!(controller.phase(), RunPhase::Failed);
}

#[test]
fn test_master_log_is_rotated_between_runs() {
    let dir = TempDir::new().unwrap();
    let cfg = two_stage_config();
    let opts = submit_options("demo", dir.path());

    std::fs::create_dir_all(dir.path().join("logfiles")).unwrap();
    std::fs::write(dir.path().join("logfiles/master.log"), "previous run").unwrap();

    let mut controller = RunController::new(RecordingBackend::new());
    controller.run(&cfg, &opts, false).unwrap();

    // The old log was renamed to master.<timestamp>.log.
    assert!(!dir.path().join("logfiles/master.log").exists());
    let rotated = std::fs::read_dir(dir.path().join("logfiles"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.starts_with("master.") && name.ends_with(".log")
        })
        .count();
    assert_eq!(rotated, 1);
}
