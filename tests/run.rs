//! Integration tests for the `run` command.
use enliten::cli::{RunOpts, handle_run_command};
use enliten::output::{ANNUAL_CASH_FLOW_FILE_NAME, METRICS_FILE_NAME};
use enliten::settings::Settings;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the example asset.
fn get_input_path() -> PathBuf {
    PathBuf::from("demos/default/inputs.toml")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("ENLITEN_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
    };
    handle_run_command(&get_input_path(), &opts, Some(Settings::default())).unwrap();

    for file_name in [
        ANNUAL_CASH_FLOW_FILE_NAME,
        METRICS_FILE_NAME,
        "enliten_info.log",
        "enliten_error.log",
    ] {
        assert!(output_dir.join(file_name).is_file());
    }

    // Second time will fail because the logging is already initialised
    let opts = RunOpts {
        output_dir: Some(tempdir.path().join("more_results")),
        overwrite: false,
    };
    assert_eq!(
        handle_run_command(&get_input_path(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        "Failed to initialise logging."
    );
}
