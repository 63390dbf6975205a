//! Integration tests for the `validate` command.
use enliten::cli::handle_validate_command;
use enliten::log::is_logger_initialised;
use enliten::settings::Settings;
use std::path::PathBuf;

/// Get the path to the example asset.
fn get_input_path() -> PathBuf {
    PathBuf::from("demos/augmented/inputs.toml")
}

/// An integration test for the `validate` command.
///
/// We also check that the logger is initialised after it is run.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("ENLITEN_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    handle_validate_command(&get_input_path(), Some(Settings::default())).unwrap();

    assert!(is_logger_initialised());
}
