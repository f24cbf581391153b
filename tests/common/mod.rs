//! Common test utilities for zip-meta-map integration tests

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Builder for test project trees and zip archives
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a text file, creating parent directories as needed
    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        self.add_bytes(relative_path, content.as_bytes())
    }

    /// Add a file with raw bytes
    pub fn add_bytes(&self, relative_path: &str, content: &[u8]) -> &Self {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("failed to write file");
        self
    }

    /// Write a zip archive with the given entries. Entry names are stored
    /// verbatim, so hostile names like `../escape.py` are representable.
    pub fn write_zip(&self, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let zip_path = self.dir.path().join(name);
        let file = fs::File::create(&zip_path).expect("failed to create zip");
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (entry_name, content) in entries {
            writer
                .start_file(*entry_name, options)
                .expect("failed to start zip entry");
            writer.write_all(content).expect("failed to write zip entry");
        }
        writer.finish().expect("failed to finish zip");
        zip_path
    }

    /// Lay down a small Python CLI project
    pub fn python_project(&self) -> &Self {
        self.add_file("README.md", "# Sample tool\n\nA small CLI.\n")
            .add_file("pyproject.toml", "[project]\nname = \"sample\"\n")
            .add_file("main.py", "import sys\n\nprint(\"hello\")\n")
            .add_file("src/core.py", "def run():\n    return 1\n")
            .add_file("src/util.py", "def helper():\n    return 2\n")
            .add_file("tests/test_core.py", "def test_run():\n    assert True\n")
    }

    /// Lay down a small TypeScript tool project
    pub fn node_project(&self) -> &Self {
        self.add_file("README.md", "# ts-tool\n\nA tiny node utility.\n")
            .add_file(
                "package.json",
                "{\n  \"name\": \"ts-tool\",\n  \"version\": \"0.1.0\"\n}\n",
            )
            .add_file("tsconfig.json", "{\n  \"compilerOptions\": {}\n}\n")
            .add_file("src/index.ts", "export function main(): void {}\n")
            .add_file("src/util.ts", "export const two = 2;\n")
            .add_file("node_modules/left-pad/index.js", "module.exports = 0;\n")
    }

    /// Lay down a small pnpm workspace with two packages
    pub fn monorepo_project(&self) -> &Self {
        self.add_file("README.md", "# workspace\n\nTwo packages.\n")
            .add_file("pnpm-workspace.yaml", "packages:\n  - packages/*\n")
            .add_file(
                "packages/app/package.json",
                "{\n  \"name\": \"app\"\n}\n",
            )
            .add_file("packages/app/index.ts", "export const app = 1;\n")
            .add_file(
                "packages/lib/package.json",
                "{\n  \"name\": \"lib\"\n}\n",
            )
            .add_file("packages/lib/index.ts", "export const lib = 2;\n")
            .add_file(
                "packages/app/node_modules/dep/index.js",
                "module.exports = 1;\n",
            )
    }

    /// Run the CLI with this project dir as cwd
    pub fn run_cli(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_zip-meta-map"))
            .current_dir(self.path())
            .args(args)
            .output()
            .expect("failed to run CLI")
    }

    /// Run the CLI and expect success, returning stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args);
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
