//! CLI subcommands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use examscore_core::engine::{ScoringConfig, ScoringService};
use examscore_store::{load_config_from, DirectoryStore, ExamscoreConfig};

pub mod init;
pub mod score;
pub mod score_all;
pub mod show;
pub mod stats;
pub mod validate;

/// Load config and open the data directory it points at.
pub(crate) fn open_store(config_path: Option<&Path>) -> Result<(ExamscoreConfig, Arc<DirectoryStore>)> {
    let config = load_config_from(config_path)?;
    anyhow::ensure!(
        config.data_dir.is_dir(),
        "data directory not found: {} (run `examscore init` to create one)",
        config.data_dir.display()
    );
    let store = Arc::new(DirectoryStore::new(&config.data_dir));
    Ok((config, store))
}

pub(crate) fn service(store: Arc<DirectoryStore>, parallelism: usize) -> ScoringService {
    ScoringService::new(store.clone(), store, ScoringConfig { parallelism })
}
