//! Common test utilities for artifactctl integration tests

#![allow(dead_code)]

pub mod registry;

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// Isolated configuration and install directories for one test
pub struct TestEnv {
    /// Temporary directory holding everything below
    pub temp: TempDir,
    pub config_dir: PathBuf,
    pub plugins_dir: PathBuf,
    pub rulesfiles_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let config_dir = temp.path().join("config");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config directory");
        Self {
            plugins_dir: temp.path().join("plugins"),
            rulesfiles_dir: temp.path().join("rules"),
            config_dir,
            temp,
        }
    }

    /// Write a file in the configuration directory
    pub fn write_config(&self, name: &str, content: &str) {
        std::fs::write(self.config_dir.join(name), content).expect("Failed to write config file");
    }

    /// Configure `indexes` as `(name, index file content)` pairs
    pub fn write_indexes(&self, indexes: &[(&str, &str)]) {
        let mut listing = String::from("configs:\n");
        for (name, content) in indexes {
            listing.push_str(&format!(
                "  - name: {name}\n    url: https://example.com/{name}/index.yaml\n"
            ));
            self.write_config(&format!("{name}.yaml"), content);
        }
        self.write_config("indexes.yaml", &listing);
    }

    /// Command running the artifactctl binary against this environment
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("artifactctl").expect("Binary not built");
        cmd.env_remove("ARTIFACTCTL_CONFIG_DIR")
            .env("NO_PROXY", "127.0.0.1,localhost")
            .env("ARTIFACTCTL_PLUGINS_DIR", &self.plugins_dir)
            .env("ARTIFACTCTL_RULESFILES_DIR", &self.rulesfiles_dir)
            .arg("--config-dir")
            .arg(&self.config_dir);
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
