//! examscore-store — Collaborator store implementations and configuration.
//!
//! Implements the `ExamStore` and `SubmissionStore` traits over an in-memory
//! map and over a JSON data directory, and loads the examscore config file.

pub mod config;
pub mod error;
pub mod fs;
pub mod memory;

pub use config::{load_config, load_config_from, ExamscoreConfig};
pub use error::StoreError;
pub use fs::DirectoryStore;
pub use memory::MemoryStore;
