// tests/error_handling.rs

use std::io::Write;
use tempfile::NamedTempFile;

use conveyor::config::load_and_validate;
use conveyor::errors::ConveyorError;

#[test]
fn test_stage_cycle_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[stage.align]
cmd = "workflow/align.sh"
after = ["quantify"]

[stage.quantify]
cmd = "workflow/quantify.sh"
after = ["align"]
"#
    )
    .unwrap();

    let result = load_and_validate(file.path());

    match result {
        Err(ConveyorError::StageCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("align") || msg.contains("quantify"));
        }
        Err(e) => panic!("Expected StageCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[stage.align]
cmd = "workflow/align.sh"
after = ["nonexistent"]
"#
    )
    .unwrap();

    let result = load_and_validate(file.path());

    match result {
        Err(ConveyorError::Config(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("nonexistent"));
        }
        Err(e) => panic!("Expected Config error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_self_dependency_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[stage.align]
cmd = "workflow/align.sh"
after = ["align"]
"#
    )
    .unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(ConveyorError::Config(_))
    ));
}

#[test]
fn test_empty_config_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[defaults]\ncpus = 4\n").unwrap();

    match load_and_validate(file.path()) {
        Err(ConveyorError::Config(msg)) => {
            assert!(msg.contains("at least one [stage.<name>]"));
        }
        other => panic!("Expected Config error, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_profiles_fall_back_to_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[defaults]
partition = "norm"
time = "08:00:00"
memory = "16g"
cpus = 4

[stage.align]
cmd = "workflow/align.sh"
cpus = 16
memory = "32g"

[stage.quantify]
cmd = "workflow/quantify.sh"
after = ["align"]
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();

    let align = cfg.stage["align"].effective_profile(&cfg.defaults);
    assert_eq!(align.cpus, 16);
    assert_eq!(align.memory, "32g");
    assert_eq!(align.partition.as_deref(), Some("norm"));
    assert_eq!(align.time, "08:00:00");

    let quantify = cfg.stage["quantify"].effective_profile(&cfg.defaults);
    assert_eq!(quantify.cpus, 4);
    assert_eq!(quantify.memory, "16g");
}
