//! CLI smoke tests for the devhabit-server binary.
//!
//! Every invocation runs inside a temporary directory so the default log file
//! lands there instead of the workspace.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

fn run_devhabit_server_in(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_devhabit-server"))
        .current_dir(dir)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute devhabit-server")
}

fn run_devhabit_server(args: &[&str]) -> std::process::Output {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    run_devhabit_server_in(temp_dir.path(), args)
}

async fn run_devhabit_server_with_timeout(
    dir: &Path,
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_devhabit-server"));
    cmd.current_dir(dir)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(timeout_duration, cmd.output()).await {
        Ok(result) => result.map_err(|e| e.into()),
        Err(elapsed) => Err(elapsed.into()),
    }
}

fn write_config(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_str().expect("utf-8 temp path").to_owned()
}

const VALID_CONFIG: &str = r#"
server:
  host: "127.0.0.1"
  port: 0
  base_url: "https://api.example.com"

logging:
  default:
    console_level: info
    file: "logs/devhabit.log"
    file_level: debug
    max_backups: 3
    max_size_mb: 10

modules:
  habits:
    default_page_size: 5
    max_page_size: 50
    seed: true
"#;

#[test]
fn test_cli_help_command() {
    let output = run_devhabit_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("devhabit-server"), "Should contain binary name");
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should contain usage information"
    );
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--print-config"));
}

#[test]
fn test_cli_version_command() {
    let output = run_devhabit_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("devhabit-server"));
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_devhabit_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("unrecognized"),
        "Should report the invalid command: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_devhabit_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Config file not found"),
        "Should mention the missing file: {stderr}"
    );
}

#[test]
fn test_cli_config_flag_short_form() {
    let output = run_devhabit_server(&["-c", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config file not found"), "{stderr}");
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "invalid.yaml", "invalid: yaml: content: [unclosed");

    let output = run_devhabit_server_in(temp_dir.path(), &["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config"),
        "Should mention the config failure: {stderr}"
    );
}

#[test]
fn test_cli_unknown_section_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "unknown.yaml",
        "database:\n  url: \"sqlite:///tmp/test.db\"\n",
    );

    let output = run_devhabit_server_in(temp_dir.path(), &["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Unknown top-level keys are errors");
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "valid.yaml", VALID_CONFIG);

    let output = run_devhabit_server_in(temp_dir.path(), &["--config", &config_path, "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
        eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
    }
    assert!(output.status.success(), "Should succeed with valid config");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"), "{stdout}");
    assert!(stdout.contains("api_ingress"), "ingress section is derived: {stdout}");
}

#[test]
fn test_cli_check_rejects_zero_max_page_size() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "zero.yaml",
        "server:\n  host: \"127.0.0.1\"\n  port: 0\nmodules:\n  habits:\n    max_page_size: 0\n",
    );

    let output = run_devhabit_server_in(temp_dir.path(), &["--config", &config_path, "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_page_size"), "{stderr}");
}

#[test]
fn test_cli_check_rejects_relative_base_url() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "base.yaml",
        "server:\n  host: \"127.0.0.1\"\n  port: 0\n  base_url: \"api.example.com\"\n",
    );

    let output = run_devhabit_server_in(temp_dir.path(), &["--config", &config_path, "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("base_url"), "{stderr}");
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "valid.yaml", VALID_CONFIG);

    let output = run_devhabit_server_in(
        temp_dir.path(),
        &["--config", &config_path, "--port", "9191", "--print-config"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9191"), "{stdout}");
    assert!(stdout.contains("127.0.0.1:9191"), "{stdout}");
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_devhabit_server(&["run", "--help"]);
    assert!(output.status.success(), "Run subcommand help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Start the server"), "{stdout}");

    let output = run_devhabit_server(&["check", "--help"]);
    assert!(output.status.success(), "Check subcommand help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Check configuration"), "{stdout}");
}

#[test]
fn test_cli_verbose_flag() {
    let output = run_devhabit_server(&["-vv", "--help"]);

    assert!(output.status.success(), "Verbose help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:") || stdout.contains("USAGE:"));
}

#[tokio::test]
async fn test_cli_run_starts_and_keeps_serving() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "run.yaml", VALID_CONFIG);

    let result = run_devhabit_server_with_timeout(
        temp_dir.path(),
        &["--config", &config_path, "run"],
        Duration::from_secs(5),
    )
    .await;

    // A running server only stops when the timeout fires.
    match result {
        Err(err) => assert!(
            err.to_string().contains("elapsed"),
            "Server failed to start: {err}"
        ),
        Ok(output) => {
            eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
            eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
            panic!("Server exited early with {}", output.status);
        }
    }
}
