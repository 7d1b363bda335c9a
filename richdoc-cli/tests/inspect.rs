use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn inspect_prints_tree() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.json");
    fs::write(
        &input,
        r#"{"type":"doc","content":[{"type":"codeBlock","content":[{"type":"text","text":"a\nb"}]}]}"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("richdoc");
    cmd.arg("inspect").arg(&input);

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("⧉ Document (1 blocks)"))
        .stdout(predicate::str::contains("2 lines"));
}

#[test]
fn inspect_reads_html_with_explicit_format() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("record.txt");
    fs::write(&input, "<blockquote><p>quoted</p></blockquote>").unwrap();

    let mut cmd = cargo_bin_cmd!("richdoc");
    cmd.arg("inspect").arg(&input).arg("--from").arg("html");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1 paragraphs"));
}
