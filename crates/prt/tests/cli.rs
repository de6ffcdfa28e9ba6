//! Integration tests for the prt binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn prt() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("prt").unwrap()
}

#[test]
fn renders_scene_and_prints_report() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("s.geo"), "sphere 0 0 0 1\n").unwrap();
    let env = dir.path().join("s.env");
    fs::write(&env, "geometry s.geo\nresolution 16 8\nmaxlevel 2\n").unwrap();

    prt()
        .args(["-p", "2", "-s"])
        .arg(&env)
        .assert()
        .success()
        .stdout(predicate::str::contains("Number of processors:     2"))
        .stdout(predicate::str::contains("Number of primitive objects:  1"))
        .stdout(predicate::str::contains(
            "TIMING STATISTICS MEASURED BY MAIN PROCESS:",
        ))
        .stdout(predicate::str::contains("PER-PROCESS STATISTICS:"));

    let image = fs::read(dir.path().join("s.rgb")).unwrap();
    assert_eq!(image.len(), 16 * 8 * 3);
}

#[test]
fn worker_count_out_of_range() {
    for p in ["0", "65"] {
        prt()
            .args(["-p", p, "scene.env"])
            .assert()
            .failure()
            .code(1)
            .stderr("prt: Valid range for #processors is [1, 64].\n");
    }
}

#[test]
fn invalid_option() {
    prt()
        .args(["-x", "scene.env"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("prt: Invalid option '-x'."));
}

#[test]
fn missing_environment_file() {
    let dir = tempdir().unwrap();
    let env = dir.path().join("absent.env");
    prt()
        .arg(&env)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "prt: Cannot open file \"{}\".",
            env.display()
        )));
}

#[test]
fn help_exits_zero() {
    prt()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("-p <N>"));
}
