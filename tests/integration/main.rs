//! Integration tests for terragraph
//!
//! These tests drive the loader, builder, query facade and CLI together.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use terragraph_core::{Direction, Hops, ReferenceKind};
use terragraph_indexer::{IndexConfig, Session};

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

/// Root module, two local modules, a registry module and a broken file.
fn sample_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "main.tf",
        r#"
module "network" {
  source = "./modules/network"
}

module "app" {
  source     = "./modules/app"
  subnet_ids = module.network.subnet_ids
}

module "eks" {
  source  = "terraform-aws-modules/eks/aws"
  version = "~> 20.0"
}
"#,
    );
    write(root, "modules/network/main.tf", "resource \"aws_vpc\" \"this\" {\n  cidr_block = \"10.0.0.0/16\"\n}\n");
    write(root, "modules/network/outputs.tf", "output \"subnet_ids\" {\n  value = []\n}\n");
    write(
        root,
        "modules/app/main.tf.json",
        r#"{"locals": {"policy": "${file(\"${path.module}/policy.tf\")}"}}"#,
    );
    write(root, "modules/app/policy.tf", "");
    write(root, "legacy/broken.tf", "resource \"aws_s3_bucket\" {\n");
    write(root, "README.md", "# sample\n");
    dir
}

fn terragraph(root: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_terragraph"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("Failed to execute terragraph")
}

#[test]
fn test_full_pipeline() {
    let repo = sample_repo();
    let (graph, report) = Session::new(repo.path(), IndexConfig::default()).scan().unwrap();

    assert_eq!(report.files, 6);
    assert_eq!(report.parse_failures, 1);

    assert_eq!(
        graph.neighbors("main.tf", Direction::Outgoing).unwrap(),
        vec![
            "modules/app/main.tf.json",
            "modules/app/policy.tf",
            "modules/network/main.tf",
            "modules/network/outputs.tf",
            "terraform-aws-modules/eks/aws",
        ]
    );
    assert!(graph.has_edge(
        "modules/app/main.tf.json",
        "modules/app/policy.tf",
        ReferenceKind::LocalFileReference
    ));
    assert_eq!(
        graph.neighbors("modules/app/policy.tf", Direction::Incoming).unwrap(),
        vec!["main.tf", "modules/app/main.tf.json"]
    );

    let reachable = graph.expand(&["main.tf"], Hops::Unbounded).unwrap();
    assert_eq!(reachable.len(), 6);
    assert!(!reachable.contains("legacy/broken.tf"));

    let summary = graph.summary();
    let broken = summary.nodes.iter().find(|n| n.path == "legacy/broken.tf").unwrap();
    assert!(broken.parse_failed);
    assert_eq!(broken.out_degree, 0);
}

#[test]
fn test_parallel_scan_matches_sequential() {
    let repo = sample_repo();
    let (sequential, _) = Session::new(repo.path(), IndexConfig::default()).scan().unwrap();
    let config = IndexConfig {
        parallel: true,
        ..IndexConfig::default()
    };
    let (parallel, _) = Session::new(repo.path(), config).scan().unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_terragraph"))
        .arg("--help")
        .output()
        .expect("Failed to execute terragraph");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("terragraph"));
    assert!(stdout.contains("File-level dependency graphs for Terraform repositories"));
}

#[test]
fn test_cli_summary() {
    let repo = sample_repo();
    let output = terragraph(repo.path(), &["summary"]);
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["node_count"], 7);
}

#[test]
fn test_cli_neighbors_unknown_path_fails() {
    let repo = sample_repo();
    let output = terragraph(repo.path(), &["neighbors", "nope.tf"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.tf"));
}

#[test]
fn test_cli_export_envelope() {
    let repo = sample_repo();
    let out = repo.path().join("graph.json");
    let output = terragraph(repo.path(), &["export", "--output", out.to_str().unwrap()]);
    assert!(output.status.success());

    let export: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert!(export["exported_at"].is_string());
    assert_eq!(export["nodes"].as_array().unwrap().len(), 7);
    assert!(export["edges"].as_array().unwrap().iter().any(|e| e["external"] == true));
}

#[test]
fn test_cli_apply_then_rescan() {
    let repo = sample_repo();
    let changes = repo.path().join("changes.json");
    fs::write(
        &changes,
        r#"{"modules/db/main.tf": "variable \"name\" {}\n", "main.tf": "module \"db\" {\n  source = \"./modules/db\"\n}\n"}"#,
    )
    .unwrap();

    let output = terragraph(repo.path(), &["apply", changes.to_str().unwrap(), "--dry-run"]);
    assert!(output.status.success());
    assert!(!repo.path().join("modules/db").exists());

    let output = terragraph(repo.path(), &["apply", changes.to_str().unwrap()]);
    assert!(output.status.success());

    let (graph, _) = Session::new(repo.path(), IndexConfig::default()).scan().unwrap();
    assert_eq!(
        graph.neighbors("main.tf", Direction::Outgoing).unwrap(),
        vec!["modules/db/main.tf"]
    );
}
