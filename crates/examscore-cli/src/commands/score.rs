//! The `examscore score` command.

use std::path::PathBuf;

use anyhow::Result;

use super::show::print_record;
use super::{open_store, service};

pub async fn execute(submission_id: String, config_path: Option<PathBuf>) -> Result<()> {
    let (config, store) = open_store(config_path.as_deref())?;
    let service = service(store, config.parallelism);

    let record = service.score_one(&submission_id).await?;
    print_record(&submission_id, &record);
    Ok(())
}
