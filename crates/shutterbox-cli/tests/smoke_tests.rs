//! Smoke tests for the shutterbox binary

#![allow(deprecated)] // Command::cargo_bin until assert_cmd settles its replacement
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Rgba, RgbaImage};
use predicates::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn shutterbox() -> Command {
    Command::cargo_bin("shutterbox").expect("shutterbox binary should exist")
}

/// Six small stills plus a config that keeps the loop animation tiny
fn export_fixture(dir: &TempDir) -> (Vec<PathBuf>, PathBuf) {
    let stills = (0..6u8)
        .map(|i| {
            let path = dir.path().join(format!("shot-{i}.png"));
            RgbaImage::from_pixel(40, 30, Rgba([i * 40, 120, 200, 255]))
                .save(&path)
                .unwrap();
            path
        })
        .collect();
    let config = dir.path().join("kiosk.yaml");
    fs::write(&config, "export:\n  loop_width: 64\n  loop_height: 48\n").unwrap();
    (stills, config)
}

fn first_loop_frame(path: &Path) -> RgbaImage {
    let bytes = fs::read(path).unwrap();
    let decoder = GifDecoder::new(Cursor::new(bytes)).unwrap();
    let frames = decoder.into_frames().collect_frames().unwrap();
    frames[0].buffer().clone()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    shutterbox()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_lists_subcommands() {
    shutterbox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("devices"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    shutterbox().assert().failure();
}

#[test]
fn test_run_help_mentions_unattended() {
    shutterbox()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--unattended"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_prints_default_timings() {
    shutterbox()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("countdown_from: 5"))
        .stdout(predicate::str::contains("auto_advance_ms: 10000"));
}

#[test]
fn test_config_file_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kiosk.yaml");
    fs::write(&path, "session:\n  auto_advance_ms: 4000\n").unwrap();
    shutterbox()
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("auto_advance_ms: 4000"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kiosk.yaml");
    fs::write(&path, "export:\n  fps: 0\n").unwrap();
    shutterbox()
        .args(["config", "--check", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

// ============================================================================
// Devices
// ============================================================================

#[test]
fn test_devices_stars_obs_camera() {
    shutterbox()
        .arg("devices")
        .assert()
        .success()
        .stdout(predicate::str::contains("* synthetic-0"))
        .stdout(predicate::str::contains("OBS Virtual Camera"));
}

#[test]
fn test_devices_json() {
    let output = shutterbox()
        .args(["devices", "--format", "json", "--device", "Webcam"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["devices"].as_array().unwrap().len(), 1);
    assert_eq!(listing["selected"], "synthetic-0");
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_writes_strip_and_loop() {
    let dir = TempDir::new().unwrap();
    let (stills, config) = export_fixture(&dir);
    let out = dir.path().join("out");

    shutterbox()
        .args(["-q", "export", "--session", "party 7", "--plain", "2x3", "--output"])
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .args(&stills)
        .assert()
        .success()
        .stdout(predicate::str::contains("party_7-strip.png"))
        .stdout(predicate::str::contains("party_7-loop.gif"));

    let strip = image::open(out.join("party_7-strip.png")).unwrap();
    assert_eq!((strip.width(), strip.height()), (1200, 1800));
    assert!(fs::read(out.join("party_7-loop.gif"))
        .unwrap()
        .starts_with(b"GIF89a"));
    // no clips, no highlight video
    assert!(!out.join("party_7-highlight.mp4").exists());

    // the default loop frame is a white border
    let frame = first_loop_frame(&out.join("party_7-loop.gif"));
    let corner = frame.get_pixel(0, 0).0;
    assert!(corner[..3].iter().all(|c| *c > 230), "corner {corner:?}");
}

#[test]
fn test_export_loop_frame_flag() {
    let dir = TempDir::new().unwrap();
    let (stills, config) = export_fixture(&dir);
    let art = dir.path().join("gif-frame.png");
    RgbaImage::from_fn(64, 48, |_, y| {
        if y < 24 {
            Rgba([250, 140, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
    .save(&art)
    .unwrap();
    let out = dir.path().join("out");

    shutterbox()
        .args(["-q", "export", "--session", "framed", "--loop-frame"])
        .arg(&art)
        .arg("--output")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .args(&stills)
        .assert()
        .success();

    let frame = first_loop_frame(&out.join("framed-loop.gif"));
    let top = frame.get_pixel(32, 8).0;
    assert!(top[0] > 220 && top[2] < 60, "top {top:?}");
    // the first still shows through the transparent half
    let bottom = frame.get_pixel(32, 40).0;
    assert!(bottom[2] > 160 && bottom[0] < 40, "bottom {bottom:?}");
}

#[test]
fn test_export_rejects_five_stills() {
    let dir = TempDir::new().unwrap();
    let (stills, _) = export_fixture(&dir);
    shutterbox()
        .arg("export")
        .args(&stills[..5])
        .assert()
        .failure();
}

#[test]
fn test_export_unknown_background_fails() {
    let dir = TempDir::new().unwrap();
    let (stills, config) = export_fixture(&dir);
    shutterbox()
        .args(["export", "--background", "9", "--config"])
        .arg(&config)
        .args(&stills)
        .assert()
        .failure()
        .stderr(predicate::str::contains("background 9 does not exist"));
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn test_run_rejects_blank_token() {
    let dir = TempDir::new().unwrap();
    shutterbox()
        .args(["run", " ", "--unattended", "--output"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_run_abandons_on_quit_key() {
    let dir = TempDir::new().unwrap();
    shutterbox()
        .args(["run", "guest-1", "--output"])
        .arg(dir.path())
        .write_stdin("q\n")
        .assert()
        .failure();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
