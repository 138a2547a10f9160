//! examscore CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examscore", version, about = "Exam submission scoring engine")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one submission and store the result
    Score {
        /// Submission ID
        #[arg(long)]
        submission: String,
    },

    /// Score every unscored submission
    ScoreAll {
        /// Max concurrent submissions (default: from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Report output directory (default: from config)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the stored score of a submission
    Show {
        /// Submission ID
        #[arg(long)]
        submission: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate exam definition files
    Validate {
        /// Path to an exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// Cohort statistics for an exam
    Stats {
        /// Exam ID
        #[arg(long)]
        exam: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter config and sample data directory
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examscore=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Score { submission } => commands::score::execute(submission, config).await,
        Commands::ScoreAll {
            parallelism,
            output,
        } => commands::score_all::execute(parallelism, output, config).await,
        Commands::Show { submission, format } => {
            commands::show::execute(submission, format, config).await
        }
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Stats { exam, format } => commands::stats::execute(exam, format, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
