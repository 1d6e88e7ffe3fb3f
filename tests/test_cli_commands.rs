mod common;

use common::SenseiProcess;

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// version / completions
// ============================================================================

#[test]
fn version_human() {
    let output = SenseiProcess::spawn_command(&["version"]);
    assert!(output.status.success(), "version should exit 0: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("interview-sensei"), "unexpected output: {text}");
    assert!(text.contains("built-in scripts"), "unexpected output: {text}");
}

#[test]
fn version_json() {
    let output = SenseiProcess::spawn_command(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("version JSON should be valid");
    assert_eq!(parsed["name"], "interview-sensei");
    assert_eq!(parsed["builtin_scripts"], 3);
}

#[test]
fn completions_bash() {
    let output = SenseiProcess::spawn_command(&["completions", "bash"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("sensei"));
}

// ============================================================================
// scripts
// ============================================================================

#[test]
fn scripts_list_human() {
    let output = SenseiProcess::spawn_command(&["scripts", "list"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Built-in Scripts (3 available)"), "{text}");
    assert!(text.contains("aws-migration"));
    assert!(text.contains("Behavioral Interview") || text.contains("behavioral-basics"));
}

#[test]
fn scripts_list_json_filtered() {
    let output =
        SenseiProcess::spawn_command(&["scripts", "list", "--type", "behavioral", "-f", "json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0]["name"], "behavioral-basics");
    assert_eq!(parsed[0]["interview_type"], "behavioral");
}

#[test]
fn scripts_show_prints_yaml() {
    let output = SenseiProcess::spawn_command(&["scripts", "show", "quick-demo"]);
    assert!(output.status.success());
    let yaml: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert_eq!(yaml["session"]["title"], "Quick demo");
}

#[test]
fn scripts_show_unknown_suggests() {
    let output = SenseiProcess::spawn_command(&["scripts", "show", "quick-dem"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).contains("Did you mean 'quick-demo'?"));
}

// ============================================================================
// session validate
// ============================================================================

#[test]
fn validate_valid_script() {
    let path = SenseiProcess::fixture_path("valid_script.yaml");
    let output = SenseiProcess::spawn_command(&["session", "validate", path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("(2 turns, 0 warnings)"));
}

#[test]
fn validate_unknown_field_fails() {
    let path = SenseiProcess::fixture_path("unknown_field.yaml");
    let output = SenseiProcess::spawn_command(&["session", "validate", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("invalid"));
}

#[test]
fn validate_missing_file() {
    let output = SenseiProcess::spawn_command(&[
        "session",
        "validate",
        "/tmp/nonexistent_sensei_test_script.yaml",
    ]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("file not found"));
}

#[test]
fn validate_strict_promotes_warnings() {
    let path = SenseiProcess::fixture_path("empty_turns.yaml");
    let path = path.to_str().unwrap();

    let lenient = SenseiProcess::spawn_command(&["session", "validate", path]);
    assert!(lenient.status.success(), "{}", stderr(&lenient));
    assert!(stdout(&lenient).contains("1 warnings"));

    let strict = SenseiProcess::spawn_command(&["session", "validate", "--strict", path]);
    assert_eq!(strict.status.code(), Some(2));
}

#[test]
fn validate_json_reports_every_file() {
    let good = SenseiProcess::fixture_path("valid_script.yaml");
    let bad = SenseiProcess::fixture_path("unknown_field.yaml");
    let output = SenseiProcess::spawn_command(&[
        "session",
        "validate",
        "--format",
        "json",
        good.to_str().unwrap(),
        bad.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0]["valid"], true);
    assert_eq!(parsed[0]["turns"], 2);
    assert_eq!(parsed[1]["valid"], false);
}

// ============================================================================
// session simulate
// ============================================================================

#[test]
fn simulate_human_timeline() {
    let path = SenseiProcess::fixture_path("valid_script.yaml");
    let output = SenseiProcess::spawn_command(&[
        "session",
        "simulate",
        "--script",
        path.to_str().unwrap(),
        "--until",
        "700ms",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("question \"A B\""), "{text}");
    assert!(text.contains("answer \"X Y\""), "{text}");
    assert!(text.contains("turn 2 begins"), "{text}");
    assert!(text.contains("stopped: simulation horizon reached"), "{text}");
}

#[test]
fn simulate_json_summary() {
    let path = SenseiProcess::fixture_path("valid_script.yaml");
    let output = SenseiProcess::spawn_command(&[
        "session",
        "simulate",
        "-s",
        path.to_str().unwrap(),
        "--until",
        "700ms",
        "-f",
        "json",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["reason"], "horizon");
    assert_eq!(parsed["summary"]["turns_completed"], 1);
    assert_eq!(parsed["summary"]["elapsed_ms"], 700);
    assert_eq!(parsed["timeline"][0]["state"]["phase"], "asking_question");
}

#[test]
fn simulate_builtin_default() {
    let output = SenseiProcess::spawn_command(&["session", "simulate", "--until", "20s"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("AWS"));
}

// ============================================================================
// session run
// ============================================================================

#[test]
fn run_rejects_invalid_speed() {
    let output = SenseiProcess::spawn_command(&["session", "run", "--speed", "0", "--no-render"]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("invalid playback speed"));
}

#[test]
fn run_unknown_builtin_is_usage_error() {
    let output =
        SenseiProcess::spawn_command(&["session", "run", "--builtin", "quick-dem", "--no-render"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).contains("did you mean 'quick-demo'"));
}

#[test]
fn run_stops_when_input_closes() {
    let output =
        SenseiProcess::spawn_command(&["session", "run", "--builtin", "quick-demo", "--no-render"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Session input closed"));
}

#[tokio::test]
async fn run_end_command_writes_events() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.jsonl");
    let script = SenseiProcess::fixture_path("valid_script.yaml");

    let mut child = SenseiProcess::spawn_interactive(&[
        "session",
        "run",
        "--script",
        script.to_str().unwrap(),
        "--events-file",
        events.to_str().unwrap(),
        "--speed",
        "10",
    ]);
    SenseiProcess::send_line(&mut child, "s").await;
    SenseiProcess::send_line(&mut child, "e").await;
    let output = SenseiProcess::finish(child).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Session ended"), "{text}");
    assert!(text.contains("Interview session ended."), "{text}");

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&events)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.first().unwrap()["type"], "SessionStarted");
    assert_eq!(lines.first().unwrap()["title"], "Fixture interview");
    assert!(lines.iter().any(|e| e["type"] == "TurnRestarted"));
    let last = lines.last().unwrap();
    assert_eq!(last["type"], "SessionEnded");
    assert_eq!(last["reason"], "ended");
}

#[tokio::test]
async fn run_rejects_unknown_command_and_keeps_going() {
    let mut child = SenseiProcess::spawn_interactive(&[
        "session",
        "run",
        "--builtin",
        "quick-demo",
        "--no-render",
    ]);
    SenseiProcess::send_line(&mut child, "dance").await;
    SenseiProcess::send_line(&mut child, "q").await;
    let output = SenseiProcess::finish(child).await;

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("unknown command 'dance'"));
    assert!(stdout(&output).contains("Session ended"));
}
