//! End-to-end runs of the `tql` binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const CSV: &str = "name,age,city\nAlice,30,NYC\nBob,25,LA\n";

const CONFIG: &str = "[output]
color = false
color_in_files = false
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("people.csv"), CSV).expect("Failed to write CSV");
        fs::write(dir.path().join("tql.toml"), CONFIG).expect("Failed to write config");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tql"))
            .current_dir(self.dir.path())
            .arg("--config")
            .arg(self.path("tql.toml"))
            .args(args)
            .env_remove("TQL_CONFIG")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to run tql")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "tql {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read output")
}

#[test]
fn test_create_then_edit_conversation() {
    let ws = Workspace::new();
    let stdout = ws.run_ok(&["create", "--in", "people.csv"]);
    assert!(stdout.contains("✅ Created"));
    assert!(stdout.contains("├─ Data rows: 2"));
    assert!(read(&ws.path("people.tql")).starts_with("@table[2]:"));

    let stdout = ws.run_ok(&[
        "insert", "--file", "people.tql", "--facet", "context", "--key", "user_timezone",
        "--value", "MST",
    ]);
    assert!(stdout.contains("✅ Inserted 1 row into @context (index 1)"));
    assert!(stdout.contains("├─ Documents: 1 → 2"));
    assert!(read(&ws.path("people.tql")).starts_with("#conversation[2]:"));

    let value = ws.run_ok(&[
        "get", "--file", "people.tql", "--facet", "context", "--index", "1", "--field", "value",
    ]);
    assert_eq!(value.trim(), "MST");

    ws.run_ok(&[
        "update", "--file", "people.tql", "--facet", "context", "--index", "1", "--data",
        r#"{"value":"PST"}"#,
    ]);
    let original = ws.run_ok(&[
        "get", "--file", "people.tql", "--facet", "context", "--index", "1", "--field", "value",
        "--document", "1",
    ]);
    assert_eq!(original.trim(), "MST");

    let diff = ws.run_ok(&["diff", "--file", "people.tql", "--no-color"]);
    assert!(diff.starts_with("$diff[+1→+2]:\n@context[1]:"));
    assert!(diff.contains("| -   | 1     | user_timezone | MST   |"));
    assert!(diff.contains("| +   | 1     | user_timezone | PST   |"));
    assert!(!diff.contains('\u{1b}'));

    ws.run_ok(&["delete", "--file", "people.tql", "--facet", "context", "--index", "1"]);
    let history = ws.run_ok(&["history", "--file", "people.tql", "--json"]);
    let entries: serde_json::Value = serde_json::from_str(&history).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 7);
    assert_eq!(entries[6]["type"], "document");
    assert_eq!(entries[6]["index"], 3);
    assert_eq!(entries[5]["row_changes"], 1);
}

#[test]
fn test_export_json() {
    let ws = Workspace::new();
    ws.run_ok(&["create", "--in", "people.csv", "--out", "people.tql"]);
    ws.run_ok(&[
        "insert", "--file", "people.tql", "--facet", "tasks", "--data",
        r#"{"name":"avg_age","formula":"AVG(age)"}"#,
    ]);
    ws.run_ok(&["export", "--file", "people.tql", "--out", "people.json"]);

    let json: serde_json::Value = serde_json::from_str(&read(&ws.path("people.json"))).unwrap();
    assert_eq!(json["count"], 2);
    assert_eq!(json["sequence"][1]["type"], "diff");

    ws.run_ok(&["export", "--file", "people.tql", "--out", "first.json", "--document", "0"]);
    let first: serde_json::Value = serde_json::from_str(&read(&ws.path("first.json"))).unwrap();
    assert_eq!(first["table"]["rows"][1]["name"], "Bob");
}

#[test]
fn test_errors_exit_with_status_one() {
    let ws = Workspace::new();
    ws.run_ok(&["create", "--in", "people.csv"]);
    let before = read(&ws.path("people.tql"));

    let output = ws.run(&["delete", "--file", "people.tql", "--facet", "context", "--index", "4"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
    assert_eq!(read(&ws.path("people.tql")), before);

    let output = ws.run(&["get", "--file", "missing.tql", "--facet", "table"]);
    assert_eq!(output.status.code(), Some(1));

    fs::write(ws.path("indexed.csv"), "index,name\n7,Alice\n").unwrap();
    let output = ws.run(&["create", "--in", "indexed.csv"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("source column 'index' is reserved"));
    assert!(!ws.path("indexed.tql").exists());
}
