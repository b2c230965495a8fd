mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "playground-cli")]
#[command(about = "Playground CLI - Run code remotely and ask the assistant about it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a source file in the remote sandbox
    Run {
        /// Language key (e.g., python, cpp, rust)
        #[arg(short, long)]
        language: String,

        /// Source file to run
        #[arg(short, long)]
        file: PathBuf,

        /// File whose contents are fed to the program's stdin
        #[arg(short, long)]
        stdin: Option<PathBuf>,

        /// Print the raw result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List supported languages
    Languages,

    /// Guess the language of a source file
    Detect {
        /// Source file to inspect
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Ask the assistant a question about a source file
    Ask {
        /// Language key
        #[arg(short, long)]
        language: String,

        /// Source file the question is about
        #[arg(short, long)]
        file: PathBuf,

        /// The question
        #[arg(short, long)]
        question: String,
    },

    /// Have the assistant explain a source file
    Explain {
        /// Language key
        #[arg(short, long)]
        language: String,

        /// Source file to explain
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so program output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            language,
            file,
            stdin,
            json,
        } => {
            commands::run(&language, &file, stdin.as_deref(), json).await?;
        }
        Commands::Languages => {
            commands::list_languages();
        }
        Commands::Detect { file } => {
            commands::detect(&file).await?;
        }
        Commands::Ask {
            language,
            file,
            question,
        } => {
            commands::ask(&language, &file, &question).await?;
        }
        Commands::Explain { language, file } => {
            commands::explain(&language, &file).await?;
        }
    }

    Ok(())
}
