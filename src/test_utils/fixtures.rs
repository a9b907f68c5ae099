use std::path::PathBuf;

use tempfile::TempDir;

use crate::bandit::{Bandit, PullMode, ThompsonSampler};
use crate::config::PROJECT_CONFIG_FILE;

/// Test fixture providing an isolated directory for config and report files.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    /// Create a test file with content.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Write a project config file picked up from this directory.
    #[must_use]
    pub fn create_project_config(&self, content: &str) -> PathBuf {
        self.create_file(PROJECT_CONFIG_FILE, content)
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}

/// The three-arm demo bandit: means `[1, 2, 3]`, unit variances.
#[must_use]
pub fn demo_bandit() -> Bandit {
    Bandit::new("thompson_sampling", vec![1.0, 2.0, 3.0], vec![1.0, 1.0, 1.0])
        .expect("demo bandit is valid")
}

/// A sampler with default settings in `mode`.
#[must_use]
pub fn default_sampler(mode: PullMode) -> ThompsonSampler {
    ThompsonSampler::with_defaults(mode)
}
