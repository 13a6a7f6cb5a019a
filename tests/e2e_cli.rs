//! CLI end-to-end tests
//!
//! Tests for the mkvtag command-line interface against synthetic files.

use assert_cmd::prelude::*;
use mkvtag_ebml::{ids, ElementBuilder};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the mkvtag binary, run from `dir` so no stray config
/// file is picked up.
#[allow(deprecated)]
fn mkvtag_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mkvtag").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

/// Write a small video file with a title and one audio track.
fn sample_file(dir: &TempDir) -> PathBuf {
    let mut header = ElementBuilder::new(ids::EBML);
    header.string(ids::DOC_TYPE, "matroska").unwrap();

    let mut info = ElementBuilder::new(ids::INFO);
    info.uint(ids::TIMESTAMP_SCALE, 1_000_000)
        .unwrap()
        .float(ids::DURATION, 65_250.0)
        .unwrap()
        .string(ids::TITLE, "Sample")
        .unwrap();

    let mut video = ElementBuilder::new(ids::VIDEO);
    video
        .uint(ids::PIXEL_WIDTH, 640)
        .unwrap()
        .uint(ids::PIXEL_HEIGHT, 360)
        .unwrap();
    let mut entry = ElementBuilder::new(ids::TRACK_ENTRY);
    entry
        .uint(ids::TRACK_NUMBER, 1)
        .unwrap()
        .uint(ids::TRACK_UID, 42)
        .unwrap()
        .uint(ids::TRACK_TYPE, 1)
        .unwrap()
        .string(ids::CODEC_ID, "V_VP9")
        .unwrap()
        .child(video)
        .unwrap();
    let mut tracks = ElementBuilder::new(ids::TRACKS);
    tracks.child(entry).unwrap();

    let mut cluster = ElementBuilder::new(ids::CLUSTER);
    cluster.raw(&[0xE7, 0x81, 0x00]);

    let mut segment = ElementBuilder::new(ids::SEGMENT);
    segment
        .child(info)
        .unwrap()
        .child(tracks)
        .unwrap()
        .child(cluster)
        .unwrap();

    let mut bytes = header.build().unwrap().to_vec();
    bytes.extend_from_slice(&segment.build_with_size_length(8).unwrap());
    let path = dir.path().join("sample.mkv");
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    let temp = tempdir().unwrap();
    mkvtag_cmd(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let temp = tempdir().unwrap();
    mkvtag_cmd(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mkvtag"))
        .stdout(predicate::str::contains("set-title"));
}

#[test]
fn test_cli_show() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);
    mkvtag_cmd(temp.path())
        .arg("show")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("DocType: matroska"))
        .stdout(predicate::str::contains("Title: Sample"))
        .stdout(predicate::str::contains("Duration: 00:01:05.250"))
        .stdout(predicate::str::contains("Video VP9 640x360"));
}

#[test]
fn test_cli_show_nonexistent_file() {
    let temp = tempdir().unwrap();
    mkvtag_cmd(temp.path())
        .args(["show", "/nonexistent/file.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_show_rejects_other_formats() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("clip.avi");
    fs::write(&file, b"RIFF\x10\x00\x00\x00AVI LIST").unwrap();
    mkvtag_cmd(temp.path())
        .arg("show")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn test_cli_set_and_clear_title() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);

    mkvtag_cmd(temp.path())
        .arg("set-title")
        .arg(&file)
        .arg("Hello")
        .assert()
        .success();
    mkvtag_cmd(temp.path())
        .arg("show")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Title: Hello"));

    mkvtag_cmd(temp.path())
        .arg("clear-title")
        .arg(&file)
        .assert()
        .success();
    mkvtag_cmd(temp.path())
        .arg("show")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Title:").not());
}

#[test]
fn test_cli_set_tag_json() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);

    mkvtag_cmd(temp.path())
        .arg("set-tag")
        .arg(&file)
        .args(["director", "Someone", "--language", "eng"])
        .assert()
        .success();

    let output = mkvtag_cmd(temp.path())
        .args(["show", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["doc_type"], "matroska");
    assert_eq!(json["duration_ms"], 65_250);

    let tag = &json["tags"][0];
    // A video file gets the configured video scope.
    assert_eq!(tag["target_type_value"], 50);
    let director = &tag["simple_tags"]["DIRECTOR"][0];
    assert_eq!(director["value"]["Text"], "Someone");
    assert_eq!(director["language"], "eng");
}

#[test]
fn test_cli_config_targets() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);
    let config = temp.path().join("custom.toml");
    fs::write(&config, "[targets]\nvideo = 70\n").unwrap();

    mkvtag_cmd(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("set-tag")
        .arg(&file)
        .args(["COLLECTION", "Box set"])
        .assert()
        .success();
    mkvtag_cmd(temp.path())
        .arg("show")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Level 70"))
        .stdout(predicate::str::contains("COLLECTION = Box set"));
}

#[test]
fn test_cli_local_config_file() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);
    fs::write(temp.path().join("mkvtag.toml"), "[targets]\nvideo = 60\n").unwrap();

    mkvtag_cmd(temp.path())
        .arg("set-tag")
        .arg(&file)
        .args(["NOTE", "x"])
        .assert()
        .success();
    mkvtag_cmd(temp.path())
        .arg("show")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Level 60"));
}

#[test]
fn test_cli_invalid_config() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);
    let config = temp.path().join("bad.toml");
    fs::write(&config, "[targets]\nvideo = 55\n").unwrap();

    mkvtag_cmd(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("show")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("target level"));
}

#[test]
fn test_cli_attach_extract_detach() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);
    let cover = temp.path().join("cover.png");
    fs::write(&cover, [0x89, b'P', b'N', b'G', 1, 2, 3]).unwrap();

    mkvtag_cmd(temp.path())
        .arg("attach")
        .arg(&file)
        .arg(&cover)
        .assert()
        .success();
    mkvtag_cmd(temp.path())
        .arg("show")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("cover.png (image/png, 7 bytes, front cover)"));

    let out = temp.path().join("extracted.png");
    mkvtag_cmd(temp.path())
        .arg("extract")
        .arg(&file)
        .arg("cover.png")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read(&out).unwrap(), fs::read(&cover).unwrap());

    mkvtag_cmd(temp.path())
        .arg("detach")
        .arg(&file)
        .arg("cover.png")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 attachment"));
    mkvtag_cmd(temp.path())
        .arg("detach")
        .arg(&file)
        .arg("cover.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No attachment named"));
}

#[test]
fn test_cli_remove_tags() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);

    mkvtag_cmd(temp.path())
        .arg("set-tag")
        .arg(&file)
        .args(["ARTIST", "Someone"])
        .assert()
        .success();
    mkvtag_cmd(temp.path())
        .arg("remove-tags")
        .arg(&file)
        .assert()
        .success();
    mkvtag_cmd(temp.path())
        .arg("show")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tags: 0"))
        .stdout(predicate::str::contains("Title:").not());
}

#[test]
fn test_cli_check() {
    let temp = tempdir().unwrap();
    let file = sample_file(&temp);

    mkvtag_cmd(temp.path())
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("SeekHead entries: 0"));

    mkvtag_cmd(temp.path())
        .arg("set-title")
        .arg(&file)
        .arg("Indexed")
        .assert()
        .success();
    mkvtag_cmd(temp.path())
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("SeekHead entries: 3"))
        .stdout(predicate::str::contains("Cluster"));
}
