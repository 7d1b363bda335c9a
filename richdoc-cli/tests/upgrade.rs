use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn upgrade_writes_json_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("record.html");
    let output = dir.path().join("record.json");
    fs::write(
        &input,
        r#"<ul data-type="taskList"><li data-checked="true"><p>Done</p></li></ul>"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("richdoc");
    cmd.arg("upgrade").arg(&input).arg("-o").arg(&output);
    cmd.assert().success();

    let value: serde_json::Value = serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(value["content"][0]["type"], "taskList");
    assert_eq!(value["content"][0]["content"][0]["attrs"]["checked"], true);
}

#[test]
fn upgrade_fails_on_missing_input() {
    let mut cmd = cargo_bin_cmd!("richdoc");
    cmd.arg("upgrade").arg("/nonexistent/record.html");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error reading file"));
}
