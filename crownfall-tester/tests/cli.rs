use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "crownfall-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_tournament_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_crownfall-tester");
    let output_path = temp_path("tournament");
    let save_path = temp_path("finalists");
    let status = Command::new(exe)
        .args([
            "--tiers", "4,2", "--games", "1", "--players", "3", "--report", "json", "--save",
        ])
        .arg(&save_path)
        .arg("--output")
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());

    let content = std::fs::read_to_string(&output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    let tiers = report["tiers"].as_array().expect("tiers array");
    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[1]["entrants"], 2);

    let saved = std::fs::read_to_string(&save_path).expect("read saved strategies");
    let saved: serde_json::Value = serde_json::from_str(&saved).expect("valid json");
    assert_eq!(saved.as_array().map(Vec::len), Some(2));
}

#[test]
fn cli_replay_prints_summary() {
    let exe = env!("CARGO_BIN_EXE_crownfall-tester");
    let output_path = temp_path("replay");
    let status = Command::new(exe)
        .args(["--mode", "replay", "--players", "3", "--seed", "11", "--output"])
        .arg(&output_path)
        .env("NO_COLOR", "1")
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Game Summary"));
    assert!(content.contains("Winner:"));
    assert!(content.contains("was crowned"));
}

#[test]
fn cli_rejects_growing_tiers() {
    let exe = env!("CARGO_BIN_EXE_crownfall-tester");
    let output = Command::new(exe)
        .args(["--tiers", "2,8", "--games", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("larger than the tier before it"));
}
