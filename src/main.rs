use clap::{Parser, Subcommand};
use complisense::Result;
use complisense::commands::{analyze_clause, search_regulations, show_status};
use complisense::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "complisense")]
#[command(about = "GDPR contract clause compliance analysis using RAG over a local Ollama instance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Analyze a contract clause for GDPR compliance
    Analyze {
        /// The clause text to analyze
        clause: Option<String>,
        /// Read the clause text from a file instead
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Retrieve the regulation clauses most similar to a query
    Search {
        /// Query text
        query: String,
        /// Number of clauses to retrieve
        #[arg(long, default_value_t = 2)]
        top_k: usize,
    },
    /// Show configuration, dataset and Ollama status
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Analyze { clause, file } => {
            analyze_clause(clause, file)?;
        }
        Commands::Search { query, top_k } => {
            search_regulations(&query, top_k)?;
        }
        Commands::Status => {
            show_status()?;
        }
    }

    Ok(())
}
