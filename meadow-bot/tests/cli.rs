use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "meadow-bot-cli-{label}-{}.json",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_print_config_applies_overrides() {
    let exe = env!("CARGO_BIN_EXE_meadow-bot");
    let output = Command::new(exe)
        .args([
            "--print-config",
            "--click-interval",
            "25",
            "--priority",
            "3,1",
            "--finish",
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let printed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("config is JSON");
    assert_eq!(printed["clickInterval"], 25);
    assert_eq!(printed["priorityItems"], serde_json::json!([3, 1]));
    assert_eq!(printed["finishGame"], true);
    assert_eq!(printed["selectors"]["points"], ".pointsValue__7a0c3");
}

#[test]
fn cli_print_config_reads_config_file() {
    let exe = env!("CARGO_BIN_EXE_meadow-bot");
    let path = temp_path("config");
    std::fs::write(
        &path,
        r#"{"pointsReserve": 250, "selectors": {"lawnmower": ".mower__00"}}"#,
    )
    .expect("write config");
    let output = Command::new(exe)
        .args(["--print-config", "--config"])
        .arg(&path)
        .output()
        .expect("run cli");
    let _ = std::fs::remove_file(&path);
    assert!(output.status.success());
    let printed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("config is JSON");
    assert_eq!(printed["pointsReserve"], 250);
    assert_eq!(printed["clickInterval"], 10);
    assert_eq!(printed["selectors"]["lawnmower"], ".mower__00");
}

#[test]
fn cli_rejects_zero_click_interval() {
    let exe = env!("CARGO_BIN_EXE_meadow-bot");
    let output = Command::new(exe)
        .args(["--print-config", "--click-interval", "0"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}

#[test]
fn cli_rejects_malformed_config_file() {
    let exe = env!("CARGO_BIN_EXE_meadow-bot");
    let path = temp_path("broken");
    std::fs::write(&path, "{ not json").expect("write config");
    let output = Command::new(exe)
        .args(["--print-config", "--config"])
        .arg(&path)
        .output()
        .expect("run cli");
    let _ = std::fs::remove_file(&path);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading config"));
}
