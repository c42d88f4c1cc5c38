mod common;

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use common::create_noise_image;
use predicates::prelude::*;

fn bp_squeeze() -> Command {
    Command::cargo_bin("bp-squeeze").unwrap()
}

#[test]
fn test_cli_help() {
    bp_squeeze()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("breakpoints"));
}

#[test]
fn test_generate_help() {
    bp_squeeze()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--step"));
}

#[test]
fn test_info_help() {
    bp_squeeze().args(["info", "--help"]).assert().success();
}

#[test]
fn test_generate_missing_args() {
    bp_squeeze().args(["generate"]).assert().failure();
    bp_squeeze()
        .args(["generate", "--source", "hero.jpg", "--lower", "10x10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--step"));
}

#[test]
fn test_generate_rejects_bad_dimensions() {
    bp_squeeze()
        .args(["generate", "-s", "hero.jpg", "--step", "100", "-l", "10by10"])
        .assert()
        .failure();
}

#[test]
fn test_generate_nonexistent_source() {
    let temp = TempDir::new().unwrap();
    bp_squeeze()
        .args(["generate", "-s", "nonexistent.jpg", "--step", "1000", "-l", "10x10"])
        .arg("-o")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_generate_unsupported_source() {
    let temp = TempDir::new().unwrap();
    let notes = temp.child("notes.txt");
    notes.write_str("not an image").unwrap();

    bp_squeeze()
        .args(["generate", "--step", "1000", "-l", "10x10", "-s"])
        .arg(notes.path())
        .assert()
        .failure();
}

#[test]
fn test_generate_writes_breakpoints() {
    let temp = TempDir::new().unwrap();
    let source = create_noise_image(temp.path(), "noise.jpg", 160, 120);
    let out = temp.child("out");

    bp_squeeze()
        .args(["generate", "--step", "3000", "--lower", "16x12", "-s"])
        .arg(&source)
        .arg("-o")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    out.child("noise-16x12.jpg").assert(predicate::path::exists());
    out.child("noise-160x120.jpg").assert(predicate::path::exists());

    let written = std::fs::read_dir(out.path()).unwrap().count();
    assert!(written >= 2);
}

#[test]
fn test_generate_restricts_upper_to_source() {
    let temp = TempDir::new().unwrap();
    let source = create_noise_image(temp.path(), "small.png", 40, 30);

    bp_squeeze()
        .args(["generate", "--step", "2000", "-l", "8x6", "-u", "4000x3000", "-s"])
        .arg(&source)
        .arg("-o")
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("restricted to the source image size"));

    temp.child("small-40x30.png").assert(predicate::path::exists());
}

#[test]
fn test_generate_quiet_prints_nothing() {
    let temp = TempDir::new().unwrap();
    let source = create_noise_image(temp.path(), "quiet.jpg", 64, 48);

    bp_squeeze()
        .args(["generate", "--step", "2000", "-l", "16x12", "--quiet", "-s"])
        .arg(&source)
        .arg("-o")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    temp.child("quiet-64x48.jpg").assert(predicate::path::exists());
}

#[test]
fn test_info_reports_dimensions() {
    let temp = TempDir::new().unwrap();
    let source = create_noise_image(temp.path(), "info.png", 80, 60);

    bp_squeeze()
        .arg("info")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("80x60"));
}

#[test]
fn test_info_with_seed_estimate() {
    let temp = TempDir::new().unwrap();
    let source = create_noise_image(temp.path(), "seed.jpg", 120, 90);

    bp_squeeze()
        .args(["info", "--lower", "12x9", "--step", "2000"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Growth factor"));
}

#[test]
fn test_info_with_collapsed_bounds() {
    let temp = TempDir::new().unwrap();
    let source = create_noise_image(temp.path(), "tiny.png", 40, 30);

    bp_squeeze()
        .args(["info", "--lower", "500x500", "--step", "100"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("restricted to the upper image size of 40x30"))
        .stdout(predicate::str::contains("+0x+0"))
        .stdout(predicate::str::contains("Expected breakpoints: 1"));
}

#[test]
fn test_info_nonexistent_file() {
    bp_squeeze()
        .args(["info", "nonexistent.png"])
        .assert()
        .failure();
}
