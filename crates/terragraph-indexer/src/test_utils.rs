//! Test utilities for the indexer

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a temporary repository with the given `(path, content)` files
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in structure {
        write_file(temp_dir.path(), path, content);
    }
    temp_dir
}

/// Write one file below `root`, creating parent directories if needed
pub fn write_file(root: &Path, path: &str, content: &str) {
    let full_path = root.join(path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&full_path, content).unwrap();
}

/// The three-file layout used throughout the tests: a root module calling a
/// local module and reading a sibling file.
pub fn create_scenario_repo() -> TempDir {
    create_repo_with_structure(&[
        (
            "main.tf",
            r#"
module "net" {
  source = "./net"
  cidr   = "10.0.0.0/16"
}

locals {
  outputs = file("${path.module}/outputs.tf")
}
"#,
        ),
        (
            "net/net.tf",
            r#"
variable "cidr" {}

resource "aws_vpc" "this" {
  cidr_block = var.cidr
}
"#,
        ),
        (
            "outputs.tf",
            r#"
output "vpc_id" {
  value = module.net.vpc_id
}
"#,
        ),
    ])
}
