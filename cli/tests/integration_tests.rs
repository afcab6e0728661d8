use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("parser")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tkb_parse() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tkb-parse"))
}

fn run(args: &[&str]) -> Output {
    tkb_parse().args(args).output().expect("failed to run tkb-parse")
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = tkb_parse()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn tkb-parse");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for tkb-parse")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("test paths are UTF-8")
}

fn read_state(path: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(path).expect("failed to read state file");
    serde_json::from_str(&raw).expect("state file is JSON")
}

// ---------------------------------------------------------------------------
// parse-file
// ---------------------------------------------------------------------------

#[test]
fn parse_file_emits_json_records() {
    let input = fixture("dut-timetable.txt");
    let output = run(&["parse-file", "--input", path_arg(&input)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let records: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let records = records.as_array().expect("records array");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["active_weeks"][0]["from"], 29);
    assert_eq!(records[0]["active_weeks"][0]["to"], 44);
}

#[test]
fn parse_file_emits_yaml_records() {
    let input = fixture("ufl-two-line.txt");
    let output = run(&[
        "parse-file",
        "--input",
        path_arg(&input),
        "--institution",
        "ufl",
        "--format",
        "yaml",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("room: DB303"));
}

#[test]
fn parse_file_markdown_resolves_lesson_times() {
    let input = fixture("ufl-two-line.txt");
    let output = run(&[
        "parse-file",
        "--input",
        path_arg(&input),
        "--institution",
        "ufl",
        "--format",
        "markdown",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.starts_with("# Timetable: "));
    assert!(out.contains("**Courses:** 2"));
    assert!(out.contains("| Thứ 3 | 6-7 |"));
    assert!(out.contains("16/09/24 - 29/12/24"));
}

#[test]
fn parse_file_with_report_wraps_records() {
    let input = fixture("dut-timetable.txt");
    let output = run(&["parse-file", "--input", path_arg(&input), "--with-report"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["records"].as_array().unwrap().len(), 3);
    assert_eq!(value["report"]["success"], true);
    assert_eq!(value["report"]["selected_format"], "grammar");
    assert_eq!(value["report"]["relevant_lines"], 5);
    assert_eq!(value["report"]["recognized_lines"], 3);
    assert!(value["report"].get("failure_code").is_none());
}

#[test]
fn parse_file_with_multiple_inputs_lists_each() {
    let first = fixture("ufl-two-line.txt");
    let second = fixture("ufl-three-timeline.txt");
    let output = run(&[
        "parse-file",
        "--input",
        path_arg(&first),
        "--input",
        path_arg(&second),
        "--institution",
        "ufl",
        "--jobs",
        "2",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let outputs = value.as_array().expect("one entry per input");
    assert_eq!(outputs.len(), 2);
    assert!(outputs[0]["input"].as_str().unwrap().ends_with("ufl-two-line.txt"));
    assert_eq!(outputs[0]["records"].as_array().unwrap().len(), 2);
    assert_eq!(outputs[1]["records"].as_array().unwrap().len(), 3);
    assert!(outputs[1].get("report").is_none());
}

#[test]
fn parse_file_merge_flags_override_profile_default() {
    let input = fixture("ufl-national-defense.txt");
    let count = |extra: &[&str]| {
        let mut args = vec!["parse-file", "--input", path_arg(&input), "--institution", "ufl"];
        args.extend_from_slice(extra);
        let output = run(&args);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let records: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        records.as_array().unwrap().len()
    };

    assert_eq!(count(&[]), 4);
    assert_eq!(count(&["--no-merge"]), 5);
    assert_eq!(count(&["--merge"]), 4);
}

#[test]
fn parse_file_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.txt");
    let output = run(&["parse-file", "--input", path_arg(&missing)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read"));
}

#[test]
fn parse_file_unknown_institution_lists_available() {
    let input = fixture("dut-timetable.txt");
    let output = run(&["parse-file", "--input", path_arg(&input), "--institution", "hcmus"]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("unknown profile: hcmus"));
    assert!(err.contains("available: dut, ufl"));
}

// ---------------------------------------------------------------------------
// parse-stdin
// ---------------------------------------------------------------------------

#[test]
fn parse_stdin_accepts_preview_rows() {
    let text = fs::read_to_string(fixture("dut-preview.txt")).unwrap();
    let output = run_with_stdin(&["parse-stdin", "--format", "table"], &text);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.starts_with("Profile: DUT  Courses: 2"));
    assert!(out.contains("C128"));
}

#[test]
fn parse_stdin_empty_input_fails() {
    let output = run_with_stdin(&["parse-stdin"], "   \n");
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.starts_with("error: "));
    assert!(err.contains("Failed to parse timetable for 'dut'"));
    assert!(err.contains("Empty input"));
}

#[test]
fn parse_stdin_empty_input_with_report_succeeds() {
    let output = run_with_stdin(&["parse-stdin", "--with-report"], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["report"]["success"], false);
    assert_eq!(value["report"]["failure_code"], "empty_input");
    assert!(value["records"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// profiles / select / state
// ---------------------------------------------------------------------------

#[test]
fn profiles_table_lists_builtins() {
    let output = run(&["profiles"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("dut"));
    assert!(lines[0].contains("grammar"));
    assert!(lines[1].starts_with("ufl"));
    assert!(lines[1].contains("positional"));
}

#[test]
fn config_file_adds_profiles() {
    let dir = TempDir::new().unwrap();

    let output = run(&["profiles", "--format", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let specs: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    let mut copy = specs[1].clone();
    copy["id"] = serde_json::json!("ufl-k48");
    copy["short_name"] = serde_json::json!("UFL48");
    let config = serde_json::json!({ "include_builtin": true, "profiles": [copy] });
    let config_path = dir.path().join("registry.json");
    fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let output = run(&["--config", path_arg(&config_path), "profiles"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).lines().count(), 3);

    let input = fixture("ufl-two-line.txt");
    let output = run(&[
        "--config",
        path_arg(&config_path),
        "parse-file",
        "--input",
        path_arg(&input),
        "--institution",
        "ufl-k48",
        "--format",
        "table",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("Profile: UFL48  Courses: 2"));
}

#[test]
fn config_file_yaml_replaces_builtins() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("registry.yaml");
    fs::write(
        &config_path,
        r#"include_builtin: false
profiles:
  - id: vku
    name: Trường Đại học Công nghệ Thông tin và Truyền thông Việt - Hàn
    short_name: VKU
    lessons:
      - { lesson_number: 1, start: "7:30", end: "8:15" }
      - { lesson_number: 2, start: "8:20", end: "9:05" }
    layout:
      kind: positional
"#,
    )
    .unwrap();

    let output = run(&["--config", path_arg(&config_path), "profiles"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("vku"));
}

#[test]
fn select_requires_state() {
    let output = run(&["select", "--institution", "ufl"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("select requires --state"));
}

#[test]
fn select_persists_default_institution() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("state.json");

    let output = run(&["--state", path_arg(&state), "select", "--institution", "ufl"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "ufl");
    assert_eq!(read_state(&state)["selectedUniversity"], "ufl");

    let input = fixture("ufl-two-line.txt");
    let output = run(&[
        "--state",
        path_arg(&state),
        "parse-file",
        "--input",
        path_arg(&input),
        "--format",
        "table",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("Profile: UFL  Courses: 2"));
}

#[test]
fn successful_parse_saves_session() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    let input = fixture("dut-timetable.txt");
    let text = fs::read_to_string(&input).unwrap();

    let output = run(&["--state", path_arg(&state), "parse-file", "--input", path_arg(&input)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let saved = read_state(&state);
    assert_eq!(saved["selectedUniversity"], "dut");
    assert_eq!(saved["data"], text.as_str());
    assert_eq!(saved["byWeek"], "false");
}

#[test]
fn failed_parse_leaves_state_untouched() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("state.json");

    let output = run_with_stdin(
        &["--state", path_arg(&state), "parse-stdin", "--with-report"],
        "Thời khóa biểu\nHọc kỳ 2",
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!state.exists());
}
