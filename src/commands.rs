use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::assistant::{Assistant, Difficulty, LanguageModel, QuestionCache};
use crate::chat::{ChatSession, Outcome};
use crate::config::{Config, get_config_dir};
use crate::documents::load_document;
use crate::embeddings::{EmbeddingProvider, OllamaClient};
use crate::retrieval::RetrievalService;
use crate::store::UserId;

/// User the one-shot commands index documents under
const CLI_USER: &str = "cli";

fn load_config(top_k: Option<usize>) -> Result<Config> {
    let mut config = Config::load_default()?;
    if let Some(top_k) = top_k {
        config
            .retrieval
            .set_top_k(top_k)
            .context("Invalid value for -k")?;
    }
    Ok(config)
}

fn build_assistant(config: &Config) -> Result<Arc<Assistant>> {
    let client = Arc::new(OllamaClient::new(&config.ollama)?);
    let retrieval = RetrievalService::from_config(
        Arc::clone(&client) as Arc<dyn EmbeddingProvider>,
        config,
    );
    Ok(Arc::new(Assistant::new(
        Arc::new(retrieval),
        client as Arc<dyn LanguageModel>,
    )))
}

/// Extract, chunk and embed `file` for the CLI user
async fn load_file(assistant: &Arc<Assistant>, file: PathBuf) -> Result<usize> {
    let assistant = Arc::clone(assistant);
    let chunks = tokio::task::spawn_blocking(move || -> crate::Result<usize> {
        let (text, doc_type) = load_document(&file)?;
        assistant
            .retrieval()
            .replace_document(&UserId::from(CLI_USER), &text, doc_type)
    })
    .await
    .context("Document ingestion task failed")??;

    if chunks == 0 {
        warn!("Document contains no readable text");
        println!("{}", style("The document contains no readable text.").yellow());
    } else {
        info!("Indexed {} chunks", chunks);
    }
    Ok(chunks)
}

/// Check that Ollama is reachable and both configured models are installed
#[inline]
pub async fn check_health() -> Result<()> {
    let config = load_config(None)?;
    println!("Config: {}", get_config_dir()?.join("config.toml").display());
    println!("Ollama: {}", config.ollama.ollama_url()?);

    let client = OllamaClient::new(&config.ollama)?;
    let result = tokio::task::spawn_blocking(move || client.health_check())
        .await
        .context("Health check task failed")?;

    match result {
        Ok(()) => {
            println!("{} Embedding model: {}", style("✓").green(), config.ollama.model);
            println!(
                "{} Generation model: {}",
                style("✓").green(),
                config.ollama.generation_model
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {:#}", style("✗").red(), e);
            Err(e)
        }
    }
}

/// Print the chunks of `file` nearest to `query`, with their distances
#[inline]
pub async fn search_document(file: PathBuf, query: String, top_k: Option<usize>) -> Result<()> {
    let config = load_config(top_k)?;
    let k = config.retrieval.top_k;
    let assistant = build_assistant(&config)?;

    if load_file(&assistant, file).await? == 0 {
        return Ok(());
    }

    let hits = tokio::task::spawn_blocking(move || {
        assistant
            .retrieval()
            .retrieve_with_scores(&UserId::from(CLI_USER), &query, k)
    })
    .await
    .context("Search task failed")??;

    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{} {}",
            style(format!("#{} chunk {} (distance {:.4})", rank + 1, hit.position, hit.distance))
                .bold(),
            style(format!("{} chars", hit.text.chars().count())).dim()
        );
        println!("{}", hit.text);
        println!();
    }
    Ok(())
}

/// Answer a question about `file`
#[inline]
pub async fn ask_document(file: PathBuf, question: String, top_k: Option<usize>) -> Result<()> {
    let config = load_config(top_k)?;
    let assistant = build_assistant(&config)?;

    if load_file(&assistant, file).await? == 0 {
        return Ok(());
    }

    let answer = tokio::task::spawn_blocking(move || {
        assistant.answer(&UserId::from(CLI_USER), &question)
    })
    .await
    .context("Answer task failed")??;

    println!("{}", answer.unwrap_or_default());
    Ok(())
}

/// Summarize `file` chunk by chunk
#[inline]
pub async fn summarize_document(file: PathBuf) -> Result<()> {
    let config = load_config(None)?;
    let assistant = build_assistant(&config)?;

    let chunks = load_file(&assistant, file).await?;
    if chunks == 0 {
        return Ok(());
    }

    let summaries = tokio::task::spawn_blocking(move || {
        assistant.summarize_document(&UserId::from(CLI_USER))
    })
    .await
    .context("Summary task failed")??;

    for (index, summary) in summaries.iter().enumerate() {
        if chunks > 1 {
            println!("{}", style(format!("Part {}/{}", index + 1, chunks)).bold());
        }
        println!("{}", summary.trim());
        println!();
    }
    Ok(())
}

/// Generate a quiz from `file`
#[inline]
pub async fn quiz_document(
    file: PathBuf,
    difficulty: Difficulty,
    count: usize,
    show_answers: bool,
) -> Result<()> {
    let config = load_config(None)?;
    let assistant = build_assistant(&config)?;

    if load_file(&assistant, file).await? == 0 {
        return Ok(());
    }

    let quiz = tokio::task::spawn_blocking(move || {
        let mut cache = QuestionCache::new();
        assistant.generate_quiz(&UserId::from(CLI_USER), difficulty, count, &mut cache)
    })
    .await
    .context("Quiz task failed")??;

    if quiz.is_empty() {
        println!("{}", style("No questions could be generated.").yellow());
        return Ok(());
    }

    println!("{}", style(format!("Quiz ({difficulty})")).bold());
    for (number, pair) in quiz.iter().enumerate() {
        println!("{}. {}", number + 1, pair.question);
        if show_answers {
            println!("   {}", style(&pair.answer).green());
        }
    }
    Ok(())
}

/// Interactive session on stdin/stdout
#[inline]
pub async fn run_chat(user: String, document: Option<PathBuf>) -> Result<()> {
    let config = load_config(None)?;
    let assistant = build_assistant(&config)?;
    let user_id = UserId::from(user);

    tokio::task::spawn_blocking(move || -> crate::Result<()> {
        let mut session = ChatSession::new(assistant, user_id);
        if let Some(path) = document {
            preload(&mut session, &path);
        }
        let stdin = std::io::stdin();
        session.run(stdin.lock(), std::io::stdout())
    })
    .await
    .context("Chat session task failed")??;

    Ok(())
}

fn preload(session: &mut ChatSession, path: &Path) {
    if let Outcome::Reply(reply) =
        session.handle_line(&format!("/load {}", path.display()))
    {
        println!("{reply}");
    }
}
