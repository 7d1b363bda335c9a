use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn broken_font_in_config_fails_before_rendering() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.json");
    fs::write(&input, r#"{"type":"doc"}"#).unwrap();

    let font = dir.path().join("broken.ttf");
    fs::write(&font, b"not a font").unwrap();
    let config_path = dir.path().join("richdoc.toml");
    fs::write(
        &config_path,
        format!("[render.fonts]\nregular = {:?}\n", font.display().to_string()),
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("richdoc");
    cmd.arg(&input)
        .arg("--to")
        .arg("pdf")
        .arg("-o")
        .arg(dir.path().join("out.pdf"))
        .arg("--config")
        .arg(&config_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
    assert!(!dir.path().join("out.pdf").exists());
}

#[test]
fn missing_explicit_config_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.json");
    fs::write(&input, r#"{"type":"doc"}"#).unwrap();

    let mut cmd = cargo_bin_cmd!("richdoc");
    cmd.arg(&input)
        .arg("--to")
        .arg("json")
        .arg("--config")
        .arg(dir.path().join("absent.toml"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn page_size_from_config_is_used() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.json");
    fs::write(
        &input,
        r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"Letter"}]}]}"#,
    )
    .unwrap();
    let config_path = dir.path().join("richdoc.toml");
    fs::write(&config_path, "[render.page]\nwidth = 612.0\nheight = 792.0\n").unwrap();
    let output = dir.path().join("out.pdf");

    let mut cmd = cargo_bin_cmd!("richdoc");
    cmd.arg(&input)
        .arg("--to")
        .arg("pdf")
        .arg("-o")
        .arg(&output)
        .arg("--config")
        .arg(&config_path);
    cmd.assert().success();

    let pdf = fs::read(&output).unwrap();
    let raw = String::from_utf8_lossy(&pdf);
    assert!(raw.contains("/MediaBox [0 0 612 792]"));
}
