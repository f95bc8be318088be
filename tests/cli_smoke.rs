use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn hourgit(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hourgit").expect("binary");
    cmd.env("HOME", home.path());
    cmd
}

#[test]
fn help_works() {
    let home = TempDir::new().unwrap();
    hourgit(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("time tracking"));
}

#[test]
fn subcommand_help_works() {
    let home = TempDir::new().unwrap();
    let subcommands = [
        "init", "project", "checkout", "sync", "generate", "log", "edit", "remove", "history",
        "report", "status", "config", "defaults", "completion",
    ];

    for cmd in subcommands {
        hourgit(&home).arg(cmd).arg("--help").assert().success();
    }
}

#[test]
fn version_prints() {
    let home = TempDir::new().unwrap();
    hourgit(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(contains("hourgit "));
}

#[test]
fn project_add_and_list() {
    let home = TempDir::new().unwrap();

    hourgit(&home)
        .args(["project", "add", "My Project"])
        .assert()
        .success()
        .stdout(contains("project 'My Project' created"));

    hourgit(&home)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(contains("My Project"));

    // Duplicate names fail with exit code 1.
    hourgit(&home)
        .args(["project", "add", "My Project"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("already exists"));
}

#[test]
fn log_and_history_round_trip() {
    let home = TempDir::new().unwrap();

    hourgit(&home).args(["project", "add", "p"]).assert().success();

    hourgit(&home)
        .args([
            "log", "--project", "p", "--duration", "2h", "--task", "docs", "--yes",
            "wrote the manual",
        ])
        .assert()
        .success()
        .stdout(contains("logged 2h 0m for project 'p'"));

    hourgit(&home)
        .args(["history", "--project", "p"])
        .assert()
        .success()
        .stdout(contains("wrote the manual"))
        .stdout(contains("[docs]"));
}

#[test]
fn unknown_project_exits_one() {
    let home = TempDir::new().unwrap();
    hourgit(&home)
        .args(["status", "--project", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("project 'ghost' not found"));
}

#[test]
fn command_without_context_fails_cleanly() {
    let home = TempDir::new().unwrap();
    hourgit(&home)
        .current_dir(home.path())
        .args(["sync"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("no project found"));
}

#[test]
fn report_export_rejects_unknown_format() {
    let home = TempDir::new().unwrap();
    hourgit(&home).args(["project", "add", "p"]).assert().success();

    hourgit(&home)
        .args(["report", "--project", "p", "--export", "csv"])
        .assert()
        .failure()
        .stderr(contains("unsupported export format"));
}
