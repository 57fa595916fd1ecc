// End-to-end tests for the myadmin binary.
//
// Every test gets its own settings file, database and transfer location, so
// nothing from the user's real configuration leaks in.
//
// Run with: cargo test -p myadmin-cli --test cli_tests

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = serde_json::json!({
            "export.localFile": dir.path().join("ad_export.csv"),
            "export.destination": dir.path().join("share").join("ad_export.csv"),
        });
        std::fs::write(
            dir.path().join("settings.json"),
            serde_json::to_string_pretty(&settings).unwrap(),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn database(&self) -> PathBuf {
        self.path("directory.db")
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Command without a database.
    fn bare(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_myadmin"));
        cmd.env_remove("MYADMIN_DATABASE")
            .env_remove("RUST_LOG")
            .arg("--settings")
            .arg(self.path("settings.json"));
        cmd
    }

    /// Command logged in to this test's database.
    fn myadmin(&self) -> Command {
        let mut cmd = self.bare();
        cmd.arg("--database").arg(self.database());
        cmd
    }

    fn import(&self, csv: &Path) -> Output {
        self.myadmin().arg("import").arg(csv).output().unwrap()
    }

    fn users(&self) -> Vec<serde_json::Value> {
        let output = self.myadmin().args(["list", "--json"]).output().unwrap();
        assert!(output.status.success(), "list failed: {}", stderr(&output));
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        value.as_array().unwrap().clone()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const COURSE: &str = "\
firstname,lastname,kurs,status_id_fk,city
Anna,Muster,3,1,Berlin
Ben,Beispiel,3,1,Hamburg
";

// ===========================================================================
// Menus
// ===========================================================================

#[test]
fn menu_lists_groups_and_toolbar() {
    let env = Env::new();
    let output = env.bare().arg("menu").output().unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("File (Alt+F)\n"));
    assert!(text.contains("  13  Log in"));
    assert!(text.contains("(log in first)"));
    assert!(text.contains("Toolbar: [Log in]"));
}

#[test]
fn menu_json_is_a_single_value() {
    let env = Env::new();
    let output = env.bare().args(["menu", "--json"]).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let groups = value["groups"].as_array().unwrap();
    assert_eq!(groups[0]["title"], "File");
    assert!(value["toolbar"].as_array().unwrap().len() > 1);
}

#[test]
fn about_needs_no_database() {
    let env = Env::new();
    let output = env.bare().arg("about").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("myAdmin "));
}

#[test]
fn malformed_settings_warn_and_fall_back() {
    let env = Env::new();
    env.write("settings.json", "{ \"log.level\": ");
    let output = env.bare().arg("about").output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("using default settings"), "stderr: {}", stderr(&output));
}

// ===========================================================================
// Preconditions
// ===========================================================================

#[test]
fn import_without_database_exits_4() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);
    let output = env.bare().arg("import").arg(&csv).output().unwrap();

    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("hint:"));
    assert!(!env.path("ad_export.csv").exists());
}

#[test]
fn unknown_command_id_exits_3() {
    let env = Env::new();
    let output = env.myadmin().args(["run", "99"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("myadmin menu"));
}

// ===========================================================================
// Import
// ===========================================================================

#[test]
fn import_inserts_then_updates() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);

    let first = env.import(&csv);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert!(stdout(&first).contains("2 inserted, 0 updated, 0 failed"));

    let second = env.import(&csv);
    assert!(second.status.success());
    assert!(stdout(&second).contains("0 inserted, 2 updated, 0 failed"));

    let users = env.users();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["username"], "amuster");
    assert_eq!(users[0]["email"], "anna.muster@M-zukunftsmotor.local");
    assert_eq!(users[0]["status"], "active");
}

#[test]
fn partial_import_exits_6() {
    let env = Env::new();
    let csv = env.write(
        "kurs.csv",
        "firstname,lastname,kurs,status_id_fk\nAnna,Muster,3,1\nBen,Beispiel,3,7\n",
    );
    let output = env
        .myadmin()
        .arg("import")
        .arg(&csv)
        .arg("--json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(6), "stderr: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["inserted"], 1);
    assert_eq!(value["failed"], 1);
    assert_eq!(value["failures"][0]["line"], 3);
    assert_eq!(env.users().len(), 1);
}

#[test]
fn missing_column_rejects_file() {
    let env = Env::new();
    let csv = env.write("kurs.csv", "firstname,lastname,status_id_fk\nAnna,Muster,1\n");
    let output = env.import(&csv);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("kurs"));
    assert!(env.users().is_empty());
}

// ===========================================================================
// Single-record commands
// ===========================================================================

#[test]
fn delete_with_yes_removes_one_user() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);
    assert!(env.import(&csv).status.success());

    let output = env.myadmin().args(["delete", "amuster", "--yes"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("deleted username 'amuster'"));

    let users = env.users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "bbeispiel");
}

#[test]
fn delete_declined_keeps_user() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);
    assert!(env.import(&csv).status.success());

    let mut child = env
        .myadmin()
        .args(["delete", "amuster"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"n\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("cancelled"));
    assert_eq!(env.users().len(), 2);
}

#[test]
fn delete_unknown_user_exits_9() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);
    assert!(env.import(&csv).status.success());

    let output = env.myadmin().args(["delete", "nobody", "-y"]).output().unwrap();
    assert_eq!(output.status.code(), Some(9));
    assert_eq!(env.users().len(), 2);
}

#[test]
fn deactivate_keeps_the_record() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);
    assert!(env.import(&csv).status.success());

    let output = env.myadmin().args(["deactivate", "bbeispiel", "--yes"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let users = env.users();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1]["status"], "inactive");
    assert!(!users[1]["modified"].is_null());
}

#[test]
fn edit_changes_named_fields_only() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);
    assert!(env.import(&csv).status.success());

    let output = env
        .myadmin()
        .args(["edit", "1", "--city", "Potsdam", "--phone", "0331 123"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let users = env.users();
    assert_eq!(users[0]["city"], "Potsdam");
    assert_eq!(users[0]["phone"], "0331 123");
    assert_eq!(users[0]["firstname"], "Anna");
}

// ===========================================================================
// Export
// ===========================================================================

#[test]
fn export_copies_to_destination() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);
    assert!(env.import(&csv).status.success());

    let output = env.myadmin().arg("export").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let local = std::fs::read_to_string(env.path("ad_export.csv")).unwrap();
    let copied = std::fs::read_to_string(env.path("share").join("ad_export.csv")).unwrap();
    assert_eq!(local, copied);
    assert!(local.starts_with("id_pk,username,"));
    assert_eq!(local.lines().count(), 3);
}

// ===========================================================================
// Shell
// ===========================================================================

#[test]
fn shell_runs_a_script_from_stdin() {
    let env = Env::new();
    let csv = env.write("kurs.csv", COURSE);

    let mut child = env
        .myadmin()
        .arg("shell")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let script = format!("import {}\ndeactivate amuster\ny\nexit\n", csv.display());
    child.stdin.take().unwrap().write_all(script.as_bytes()).unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("2 inserted"));
    assert!(text.contains("deactivated username 'amuster'"));
    assert!(text.contains("bye"));
    assert_eq!(env.users()[0]["status"], "inactive");
}
