// tests/transfer_failures.rs

use std::path::PathBuf;
use std::time::Duration;

use conveyor::errors::ConveyorError;
use conveyor::retry::{RecordingSleeper, RetryPolicy};
use conveyor::transfer::mock::MockTransferApi;
use conveyor::transfer::{TransactionState, TransferClient};
use tempfile::TempDir;

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_secs(1),
        multiplier: 2,
    }
}

fn client<'a>(api: &'a MockTransferApi) -> TransferClient<'a> {
    TransferClient::with_sleeper(api, fast_policy(), Box::new(RecordingSleeper::default()))
}

fn local_files(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("contents of {name}")).unwrap();
            path
        })
        .collect()
}

#[test]
fn test_upload_failure_mid_sequence_leaves_transaction_open() {
    conveyor_test_utils::init_tracing();

    let dir = TempDir::new().unwrap();
    let files = local_files(&dir, &["a.txt", "b.txt", "c.txt"]);

    let api = MockTransferApi::new().fail_upload_of("b.txt");
    let mut client = client(&api);

    let result = client.upload(&files, "dataset-7", "txn-1", "token");

    // Exactly one file made it up; the call failed; commit never ran.
    match result {
        Err(ConveyorError::Transfer(msg)) => {
            assert!(msg.contains("b.txt"));
            assert!(msg.contains("3 attempts"));
        }
        other => panic!("Expected Transfer error, got: {:?}", other.map(|_| ())),
    }
    assert_eq!(api.uploaded_names(), vec!["a.txt".to_string()]);
    assert_eq!(api.commit_count(), 0);
}

#[test]
fn test_successful_upload_commits_exactly_once() {
    let dir = TempDir::new().unwrap();
    let files = local_files(&dir, &["a.txt", "b.txt"]);

    let api = MockTransferApi::new();
    let mut client = client(&api);

    let transaction = client.upload(&files, "dataset-7", "txn-2", "token").unwrap();

    assert_eq!(transaction.state, TransactionState::Committed);
    assert_eq!(transaction.uploaded, vec!["a.txt", "b.txt"]);
    assert_eq!(api.commit_count(), 1);
}

#[test]
fn test_commit_failure_is_fatal_after_all_files_uploaded() {
    let dir = TempDir::new().unwrap();
    let files = local_files(&dir, &["a.txt"]);

    let api = MockTransferApi::new().fail_commit();
    let mut client = client(&api);

    match client.upload(&files, "dataset-7", "txn-3", "token") {
        Err(ConveyorError::Transfer(msg)) => assert!(msg.contains("txn-3")),
        other => panic!("Expected Transfer error, got: {:?}", other.map(|_| ())),
    }
    assert_eq!(api.uploaded_names(), vec!["a.txt".to_string()]);
}

#[test]
fn test_download_writes_files_in_input_order() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("downloads");

    let api = MockTransferApi::new()
        .with_remote_file("refs/genome.fa", b"ACGT")
        .with_remote_file("refs/genes.gtf", b"gene");
    let mut client = client(&api);

    let paths = client
        .download(
            &["refs/genome.fa".to_string(), "refs/genes.gtf".to_string()],
            &dest,
            "token",
        )
        .unwrap();

    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("genome.fa"));
    assert_eq!(std::fs::read(&paths[0]).unwrap(), b"ACGT");
    assert_eq!(std::fs::read(&paths[1]).unwrap(), b"gene");
}

#[test]
fn test_download_failure_names_the_offending_path() {
    let dir = TempDir::new().unwrap();

    let api = MockTransferApi::new()
        .with_remote_file("refs/genome.fa", b"ACGT")
        .fail_download_of("refs/missing.fa");
    let mut client = client(&api);

    let result = client.download(
        &["refs/genome.fa".to_string(), "refs/missing.fa".to_string()],
        dir.path(),
        "token",
    );

    match result {
        Err(ConveyorError::Transfer(msg)) => {
            assert!(msg.contains("refs/missing.fa"));
            assert!(msg.contains("404"));
        }
        other => panic!("Expected Transfer error, got: {:?}", other.map(|_| ())),
    }

    // Retries kept hammering the bad path: 1 good + 3 failed attempts.
    assert_eq!(*api.download_attempts.lock().unwrap(), 4);
}
