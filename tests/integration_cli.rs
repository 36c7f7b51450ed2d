use std::path::PathBuf;
use std::process::Command;

fn get_cli_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_projectile-cli"))
}

#[test]
fn test_cli_launch_basic() {
    let output = Command::new(get_cli_binary())
        .args(["launch", "--velocity", "20", "--angle", "45"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TRAJECTORY") && stdout.contains("Distance"),
            "Should contain trajectory output");
}

#[test]
fn test_cli_launch_json_matches_reference_flight() {
    let output = Command::new(get_cli_binary())
        .args([
            "launch",
            "--velocity", "20",
            "--angle", "45",
            "--drag", "0",
            "--air-density", "0",
            "--ground-level",
            "--output", "json",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command should succeed");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Should be JSON");
    let distance = json["distance"].as_f64().unwrap();
    assert!((distance - 40.77).abs() / 40.77 < 0.01, "distance {distance}");
    assert_eq!(json["outcome"], "landed");
    assert!(json["trajectory"].as_array().unwrap().len() > 20);
}

#[test]
fn test_cli_launch_rejects_bad_params() {
    let output = Command::new(get_cli_binary())
        .args(["launch", "--angle", "120", "--mass", "0"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid parameters should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("angle") && stderr.contains("mass"), "Should name both fields: {stderr}");
}

#[test]
fn test_cli_live_command() {
    let output = Command::new(get_cli_binary())
        .args(["live", "--velocity", "15", "--spin=-10", "--every", "20"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("KE (J)"), "Should print the live readout: {stdout}");
    assert!(stdout.contains("Landed"), "Should report landing: {stdout}");
}

#[test]
fn test_cli_batch_command() {
    let output = Command::new(get_cli_binary())
        .args(["batch", "--trials", "12", "--seed", "3", "--keep-last", "5"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BATCH") && stdout.contains("Mean"), "Should contain batch summary: {stdout}");
    assert!(stdout.contains("Most recent 5 trials"));
}

#[test]
fn test_cli_batch_is_reproducible() {
    let run = || {
        Command::new(get_cli_binary())
            .args(["batch", "-n", "8", "-s", "11", "--output", "csv"])
            .output()
            .expect("Failed to execute command")
    };
    let first = run();
    let second = run();

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(stdout.starts_with("Velocity,Angle,Spin,Distance,MaxHeight,AirTime"));
    assert_eq!(stdout.lines().count(), 9);
}

#[test]
fn test_cli_export_then_heatmap_and_compare() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("trials.csv");

    let output = Command::new(get_cli_binary())
        .args(["batch", "-n", "40", "-s", "5", "--export"])
        .arg(&csv)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Batch export should succeed");
    assert!(csv.exists());

    let output = Command::new(get_cli_binary())
        .args(["heatmap", "--bins", "4", "-x", "params.angle", "-y", "velocity", "-o", "json", "--input"])
        .arg(&csv)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Heatmap should succeed");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Should be JSON");
    assert_eq!(json["cells"].as_array().unwrap().len(), 16);

    let output = Command::new(get_cli_binary())
        .args(["compare", "-o", "csv", "--input"])
        .arg(&csv)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Compare should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 41);
}

#[test]
fn test_cli_compare_reports_skipped_rows() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("mixed.csv");
    std::fs::write(&csv, "Velocity,Angle,Spin,Distance,MaxHeight,AirTime\nabc,45,0,1,1,1\n20,45,0,40,10,2.9\n").unwrap();

    let output = Command::new(get_cli_binary())
        .args(["compare", "-o", "csv", "--input"])
        .arg(&csv)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Compare should succeed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Skipped 1 malformed rows"), "Should report the bad row: {stderr}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);
}

#[test]
fn test_cli_heatmap_unknown_field() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("empty.csv");
    std::fs::write(&csv, "Velocity,Angle,Spin,Distance,MaxHeight,AirTime\n").unwrap();

    let output = Command::new(get_cli_binary())
        .args(["heatmap", "-x", "colour", "--input"])
        .arg(&csv)
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success(), "Unknown field should fail");
}

#[test]
fn test_cli_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("sim.toml");
    std::fs::write(&config, "[integrator]\ninitial_height = 0.0\nground_threshold = 0.0\n\n[launch]\nlaunchVelocity = 20.0\ndrag = 0.0\n").unwrap();

    let output = Command::new(get_cli_binary())
        .args(["launch", "-o", "json", "--config"])
        .arg(&config)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command should succeed");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Should be JSON");
    assert_eq!(json["params"]["launchVelocity"], 20.0);
    let distance = json["distance"].as_f64().unwrap();
    assert!((distance - 40.77).abs() / 40.77 < 0.01, "distance {distance}");
}

#[test]
fn test_cli_help() {
    let output = Command::new(get_cli_binary())
        .args(["--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Help command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["launch", "live", "batch", "heatmap", "compare", "info"] {
        assert!(stdout.contains(command), "Should list {command} command");
    }
}

#[test]
fn test_cli_info() {
    let output = Command::new(get_cli_binary())
        .args(["info"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("PROJECTILE ENGINE"));
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(get_cli_binary())
        .args(["invalid-command"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid command should fail");
}
