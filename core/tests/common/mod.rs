//! Common test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture paths and utilities
pub struct TestFixtures {
    pub fixtures_dir: PathBuf,
    pub data_dir: PathBuf,
    pub tql_dir: PathBuf,
    pub configs_dir: PathBuf,
}

impl TestFixtures {
    /// Get the test fixtures directory
    pub fn new() -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

        Self {
            data_dir: fixtures_dir.join("data"),
            tql_dir: fixtures_dir.join("tql"),
            configs_dir: fixtures_dir.join("configs"),
            fixtures_dir,
        }
    }

    /// Get path to a source data file
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Get path to a TQL file
    pub fn tql_file(&self, name: &str) -> PathBuf {
        self.tql_dir.join(name)
    }

    /// Get path to a test config file
    pub fn config_file(&self, name: &str) -> PathBuf {
        self.configs_dir.join(name)
    }

    /// Contents of a TQL fixture
    pub fn tql_text(&self, name: &str) -> String {
        fs::read_to_string(self.tql_file(name)).expect("Failed to read TQL fixture")
    }
}

/// Temporary directory holding copies of fixtures
pub struct TestWorkspace {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().to_path_buf();
        Self { temp_dir, path }
    }

    /// Copy a source data file to the workspace
    pub fn copy_data_file(&self, data_file_name: &str, target_name: &str) -> PathBuf {
        let source = TestFixtures::new().data_file(data_file_name);
        let target = self.path.join(target_name);
        fs::copy(&source, &target).expect("Failed to copy data file");
        target
    }

    /// Copy a TQL fixture to the workspace
    pub fn copy_tql_file(&self, tql_file_name: &str, target_name: &str) -> PathBuf {
        let source = TestFixtures::new().tql_file(tql_file_name);
        let target = self.path.join(target_name);
        fs::copy(&source, &target).expect("Failed to copy TQL file");
        target
    }

    /// Get the workspace path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_exist() {
        let fixtures = TestFixtures::new();
        assert!(fixtures.fixtures_dir.exists());
        assert!(fixtures.data_file("transfers.csv").exists());
        assert!(fixtures.tql_file("conversation.tql").exists());
        assert!(fixtures.config_file("lenient.toml").exists());
    }

    #[test]
    fn test_workspace_creation() {
        let workspace = TestWorkspace::new();
        assert!(workspace.path().exists());
        let data_file = workspace.copy_data_file("transfers.csv", "test.csv");
        assert!(data_file.exists());
    }
}
