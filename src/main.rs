use clap::{Parser, Subcommand};
use doc_qa::Result;
use doc_qa::assistant::{DEFAULT_QUIZ_COUNT, Difficulty};
use doc_qa::commands::{
    ask_document, check_health, quiz_document, run_chat, search_document, summarize_document,
};
use doc_qa::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doc-qa")]
#[command(about = "Ask questions about your documents using a local Ollama server")]
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
    /// Check that Ollama is reachable and the configured models are installed
    Health,
    /// Show the chunks of a document closest to a query
    Search {
        /// Document to index (txt or csv)
        file: PathBuf,
        /// Search query
        query: String,
        /// Number of chunks to return
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Answer a question about a document
    Ask {
        /// Document to index (txt or csv)
        file: PathBuf,
        /// Question to answer
        question: String,
        /// Number of chunks used as context
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Summarize a document chunk by chunk
    Summarize {
        /// Document to summarize
        file: PathBuf,
    },
    /// Generate quiz questions from a document
    Quiz {
        /// Document to quiz on
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,
        /// Number of questions
        #[arg(long, default_value_t = DEFAULT_QUIZ_COUNT)]
        count: usize,
        /// Print the answer under each question
        #[arg(long)]
        show_answers: bool,
    },
    /// Start an interactive session
    Chat {
        /// Session owner; each user has an independent document
        #[arg(long, default_value = "local")]
        user: String,
        /// Document to load before the first prompt
        #[arg(long)]
        document: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
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
        Commands::Health => {
            check_health().await?;
        }
        Commands::Search { file, query, k } => {
            search_document(file, query, k).await?;
        }
        Commands::Ask { file, question, k } => {
            ask_document(file, question, k).await?;
        }
        Commands::Summarize { file } => {
            summarize_document(file).await?;
        }
        Commands::Quiz {
            file,
            difficulty,
            count,
            show_answers,
        } => {
            quiz_document(file, difficulty, count, show_answers).await?;
        }
        Commands::Chat { user, document } => {
            run_chat(user, document).await?;
        }
    }

    Ok(())
}
