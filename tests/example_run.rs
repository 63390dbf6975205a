//! Integration tests for the `example run` command.
use enliten::cli::RunOpts;
use enliten::cli::example::handle_example_run_command;
use enliten::output::METRICS_FILE_NAME;
use enliten::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("ENLITEN_LOG_LEVEL", "off") };

    let dir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(dir.path().to_path_buf()),
        overwrite: false,
    };
    handle_example_run_command("subsidised", &opts, Some(Settings::default())).unwrap();
    assert!(dir.path().join(METRICS_FILE_NAME).is_file());
}
