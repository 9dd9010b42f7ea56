//! CLI tests for the `vs` binary

use assert_cmd::Command;
use predicates::prelude::*;
use proptest::prelude::*;
use tempfile::TempDir;

fn vs(store: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("vs").expect("vs binary should build");
    cmd.arg("--store").arg(store);
    cmd
}

#[test]
fn test_set_get_reset_cycle() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("vars.json");

    vs(&store).args(["set", "x", "init"]).assert().success();
    vs(&store).args(["set", "x", "5"]).assert().success();
    vs(&store)
        .args(["get", "x"])
        .assert()
        .success()
        .stdout(predicate::eq("5\n"));
    vs(&store)
        .args(["reset", "x"])
        .assert()
        .success()
        .stdout(predicate::eq("init\n"));
    vs(&store)
        .args(["get", "x"])
        .assert()
        .success()
        .stdout(predicate::eq("init\n"));
}

#[test]
fn test_get_missing_prints_empty_line() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("vars.json");

    vs(&store)
        .args(["get", "nope"])
        .assert()
        .success()
        .stdout(predicate::eq("\n"));
}

#[test]
fn test_counters() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("vars.json");

    vs(&store).args(["increment", "runs"]).assert().stdout(predicate::eq("1\n"));
    vs(&store).args(["increment", "runs"]).assert().stdout(predicate::eq("2\n"));
    vs(&store).args(["decrement", "runs"]).assert().stdout(predicate::eq("1\n"));
}

#[test]
fn test_list_and_delete() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("vars.json");

    vs(&store)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No variables found"));

    vs(&store).args(["set", "greeting", "hi"]).assert().success();
    vs(&store)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("greeting"));

    vs(&store).args(["delete", "greeting"]).assert().success();
    vs(&store)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No variables found"));
}

proptest! {
    #[test]
    fn prop_set_then_get_returns_value(name in "[a-z]{1,12}", value in "\\PC{0,40}") {
        let store = varstore::VariableStore::in_memory();
        store.set(&name, &value).unwrap();
        prop_assert_eq!(store.get(&name).unwrap(), value.clone());
        prop_assert_eq!(store.reset(&name).unwrap(), value);
    }
}
