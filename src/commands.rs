use anyhow::{Context, Result, bail};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::dataset::load_regulations;
use crate::embeddings::EmbeddingClient;
use crate::index::RegulationIndex;
use crate::pipeline::ComplianceAnalyzer;

/// Analyze a single contract clause and print the result as JSON.
#[inline]
pub fn analyze_clause(clause: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let clause_text = match (clause, file) {
        (Some(text), None) => text,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read clause file: {}", path.display()))?,
        (Some(_), Some(_)) => bail!("Provide either a clause argument or --file, not both"),
        (None, None) => bail!("Provide a clause argument or --file"),
    };

    let config = Config::load().context("Failed to load configuration")?;
    let mut analyzer =
        ComplianceAnalyzer::new(&config).context("Failed to initialize analysis pipeline")?;

    info!("Pipeline ready, analyzing clause");
    let result = analyzer.analyze(&clause_text);

    // One-shot invocation: nothing else will need the embedding model.
    analyzer.release_embedding_provider();

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize analysis result")?
    );

    Ok(())
}

/// Retrieval only: print the regulation clauses nearest to a query.
#[inline]
pub fn search_regulations(query: &str, top_k: usize) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let clauses = load_regulations(&config.retrieval.dataset_path)
        .context("Failed to load regulation dataset")?;

    let embedder =
        EmbeddingClient::new(&config).context("Failed to initialize embedding client")?;
    let index =
        RegulationIndex::build(clauses, &embedder).context("Failed to build regulation index")?;

    let results = index
        .search(&embedder, query, top_k)
        .context("Search failed")?;

    println!("Top {} regulation clauses for: {}", results.len(), query);
    for (rank, scored) in results.iter().enumerate() {
        println!();
        println!(
            "{}. {} (distance {:.4})",
            rank + 1,
            scored.clause.clause_id,
            scored.distance
        );
        if !scored.clause.heading.is_empty() {
            println!("   {}", scored.clause.heading);
        }
        println!("   {}", scored.clause.text);
    }

    Ok(())
}

/// Show configuration, dataset and Ollama connectivity status.
#[inline]
pub fn show_status() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    println!("Ollama: http://{}:{}", config.ollama.host, config.ollama.port);
    println!("  Embedding model: {}", config.ollama.embedding_model);
    println!("  Chat model: {}", config.ollama.chat_model);
    println!("Dataset: {}", config.retrieval.dataset_path.display());
    println!("  Top-k per analysis: {}", config.retrieval.top_k);

    match load_regulations(&config.retrieval.dataset_path) {
        Ok(clauses) => println!("  Clauses: {}", clauses.len()),
        Err(e) => println!("  Dataset unavailable: {e}"),
    }

    let client = EmbeddingClient::new(&config).context("Failed to initialize Ollama client")?;
    match client.health_check() {
        Ok(()) => println!("Ollama status: ok"),
        Err(e) => println!("Ollama status: unreachable ({e:#})"),
    }

    Ok(())
}
