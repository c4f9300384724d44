//! Artifact indexes
//!
//! This module handles:
//! - Reading the list of configured indexes (`indexes.yaml`)
//! - Loading each configured index file
//! - Merging all indexes into one name lookup

pub mod entry;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::Result;
use crate::ui::Reporter;

pub use entry::{Index, IndexEntry};

/// Name lookup over one or more indexes
pub trait IndexLookup {
    /// Find an entry by exact name
    fn entry_by_name(&self, name: &str) -> Option<&IndexEntry>;
}

/// One configured index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfigEntry {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Configured indexes (`indexes.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub configs: Vec<IndexConfigEntry>,
}

impl IndexConfig {
    /// Load configured indexes; a missing file means no indexes are configured
    pub fn load(path: &Path) -> Result<Self> {
        Ok(config::read_yaml_file(path)?.unwrap_or_default())
    }
}

/// All configured indexes merged into a single lookup
///
/// When several indexes list the same name, the index merged last wins.
#[derive(Debug, Clone, Default)]
pub struct MergedIndexes {
    entries: HashMap<String, IndexEntry>,
}

impl MergedIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge indexes in order
    pub fn merge(&mut self, indexes: &[Index]) {
        for index in indexes {
            for entry in &index.entries {
                self.entries.insert(entry.name.clone(), entry.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IndexLookup for MergedIndexes {
    fn entry_by_name(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.get(name)
    }
}

/// Load every configured index from `config_dir` and merge them
pub fn load_merged(config_dir: &Path, reporter: &mut dyn Reporter) -> Result<MergedIndexes> {
    let indexes_file = config_dir.join(config::INDEXES_FILE);
    reporter.info(&format!(
        "Reading all configured index files from {:?}",
        indexes_file.display().to_string()
    ));
    let index_config = IndexConfig::load(&indexes_file)?;

    reporter.info("Loading index files ...");
    let mut all_indexes = Vec::with_capacity(index_config.configs.len());
    for config_entry in &index_config.configs {
        let file_name = format!("{}.yaml", config_entry.name);
        reporter.verbose(&format!("Loading index: {file_name:?}"));

        let mut index = Index::new(&config_entry.name);
        index.read(&config_dir.join(&file_name))?;
        all_indexes.push(index);
    }

    reporter.info("Merging all configured indexes ...");
    let mut merged = MergedIndexes::new();
    merged.merge(&all_indexes);
    reporter.verbose(&format!(
        "All configured indexes have been merged: {} indexes, {} artifacts",
        all_indexes.len(),
        merged.len()
    ));

    Ok(merged)
}
