#![allow(missing_docs)]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use csv::ReaderBuilder;
use serde_json::Value;
use tempfile::TempDir;

fn row_count(path: &std::path::Path) -> usize {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .expect("open table")
        .records()
        .count()
}

#[test]
fn generate_then_smooth_reports_json() {
    let dir = TempDir::new().expect("tempdir");
    let net = dir.path().join("net");

    let output = cargo_bin_cmd!("voxgraph")
        .args(["--format", "json", "generate", "--nodes", "500", "--clusters", "5"])
        .args(["--wiring-seed", "3", "--out-dir"])
        .arg(&net)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let generated: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(generated["nodes_written"], 500);
    assert_eq!(generated["report"]["clusters"], 5);
    let edges_written = generated["edges_written"].as_u64().expect("edge count");
    assert_eq!(row_count(&net.join("nodes.tsv")), 500);
    assert_eq!(row_count(&net.join("edges.tsv")) as u64, edges_written);

    let out = dir.path().join("smoothed.tsv");
    let output = cargo_bin_cmd!("voxgraph")
        .args(["--format", "json", "smooth", "--grid", "32", "--raster", "exact"])
        .arg("--nodes")
        .arg(net.join("nodes.tsv"))
        .arg("--edges")
        .arg(net.join("edges.tsv"))
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let smoothed: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(smoothed["rows_written"].as_u64(), Some(edges_written));
    assert_eq!(smoothed["report"]["strategy"], "exact");
    assert!(smoothed["report"]["spectral"]["mask"]["zeroed"].is_number());

    let header = fs::read_to_string(&out).expect("smoothed table");
    let columns = header.lines().next().expect("header").split('\t').count();
    assert_eq!(columns, 2 + 3 * 8);
}

#[test]
fn seeded_generate_is_reproducible() {
    let dir = TempDir::new().expect("tempdir");
    for run in ["a", "b"] {
        cargo_bin_cmd!("voxgraph")
            .args(["--quiet", "generate", "--nodes", "300", "--clusters", "3"])
            .args(["--seed", "5", "--wiring-seed", "8", "--out-dir"])
            .arg(dir.path().join(run))
            .assert()
            .success();
    }
    for table in ["nodes.tsv", "edges.tsv"] {
        assert_eq!(
            fs::read(dir.path().join("a").join(table)).expect("a"),
            fs::read(dir.path().join("b").join(table)).expect("b"),
        );
    }
}

#[test]
fn config_file_overrides_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("pipeline.toml");
    fs::write(&config, "[smoothing]\ngrid_size = 64\npath_points = 4\n").expect("write config");

    let output = cargo_bin_cmd!("voxgraph")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "config"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["smoothing"]["grid_size"], 64);
    assert_eq!(json["smoothing"]["path_points"], 4);
    assert_eq!(json["generator"]["num_nodes"], 10_000);
}

#[test]
fn invalid_parameters_fail_cleanly() {
    let dir = TempDir::new().expect("tempdir");
    let assert = cargo_bin_cmd!("voxgraph")
        .args(["generate", "--nodes", "3", "--clusters", "5", "--out-dir"])
        .arg(dir.path())
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.starts_with("error:"), "{stderr}");
    assert!(!dir.path().join("nodes.tsv").exists());
    assert!(!dir.path().join("edges.tsv").exists());
}

#[test]
fn oversized_grid_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let assert = cargo_bin_cmd!("voxgraph")
        .current_dir(dir.path())
        .args(["--quiet", "smooth", "--grid", "3000000"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("smoothing.grid_size"), "{stderr}");
}

#[test]
fn repeated_smooth_is_byte_identical() {
    let dir = TempDir::new().expect("tempdir");
    let net = dir.path().join("net");
    cargo_bin_cmd!("voxgraph")
        .args(["--quiet", "generate", "--nodes", "400", "--clusters", "4"])
        .args(["--wiring-seed", "21", "--out-dir"])
        .arg(&net)
        .assert()
        .success();

    for run in ["a.tsv", "b.tsv"] {
        cargo_bin_cmd!("voxgraph")
            .args(["--quiet", "smooth", "--grid", "32"])
            .arg("--nodes")
            .arg(net.join("nodes.tsv"))
            .arg("--edges")
            .arg(net.join("edges.tsv"))
            .arg("--out")
            .arg(dir.path().join(run))
            .assert()
            .success();
    }
    let a = fs::read(dir.path().join("a.tsv")).expect("a");
    let b = fs::read(dir.path().join("b.tsv")).expect("b");
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn smooth_without_inputs_fails() {
    let dir = TempDir::new().expect("tempdir");
    cargo_bin_cmd!("voxgraph")
        .current_dir(dir.path())
        .args(["--quiet", "smooth"])
        .assert()
        .failure();
}
