//! examscore configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level examscore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamscoreConfig {
    /// Data directory holding `exams/` and `submissions/`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Max submissions scored concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for bulk reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./examscore-data")
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examscore-results")
}

impl Default for ExamscoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examscore.toml` in the current directory
/// 2. `~/.config/examscore/config.toml`
///
/// Environment variable override: `EXAMSCORE_DATA_DIR`.
pub fn load_config() -> Result<ExamscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamscoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => parse_config(&path)?,
        None => ExamscoreConfig::default(),
    };

    if let Ok(dir) = std::env::var("EXAMSCORE_DATA_DIR") {
        if !dir.is_empty() {
            config.data_dir = PathBuf::from(dir);
        }
    }

    config.data_dir = resolve_path(&config.data_dir);
    config.output_dir = resolve_path(&config.output_dir);

    if config.parallelism == 0 {
        anyhow::bail!("parallelism must be at least 1");
    }

    Ok(config)
}

fn parse_config(path: &Path) -> Result<ExamscoreConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<ExamscoreConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examscore"))
}
