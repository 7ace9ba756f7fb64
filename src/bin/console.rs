//! Console demo: ingest a folder of documents, then answer questions interactively
//!
//! Run with: cargo run --bin docqa-console -- <folder> [config.toml]

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use walkdir::WalkDir;

use docqa::providers::LocalDocumentSource;
use docqa::types::{DocumentMeta, FileType};
use docqa::{RagConfig, RagContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let folder = PathBuf::from(
        args.next()
            .context("usage: docqa-console <folder> [config.toml]")?,
    );
    let config = match args.next() {
        Some(path) => RagConfig::from_file(path)?,
        None => RagConfig::default(),
    };

    tracing::info!("Embedding model: {}", config.embeddings.model);
    tracing::info!("LLM model: {}", config.llm.model);

    // Check the backend before ingesting anything.
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/api/tags", config.llm.base_url))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("backend reachable at {}", config.llm.base_url);
        }
        _ => {
            tracing::warn!("backend not reachable at {}", config.llm.base_url);
            tracing::warn!("start Ollama with `ollama serve` and pull the configured models");
        }
    }

    let source = Arc::new(LocalDocumentSource::new(folder.clone()));
    let context = RagContext::new(config, source)?;

    let ids = register_folder(&context, &folder)?;
    anyhow::ensure!(
        !ids.is_empty(),
        "no supported documents found in {}",
        folder.display()
    );

    println!("Processing {} document(s)...", ids.len());
    let runs = ids.iter().map(|id| context.pipeline().process(*id));
    for (id, result) in ids.iter().zip(futures_util::future::join_all(runs).await) {
        match result {
            Ok(outcome) => tracing::info!(document = %id, ?outcome, "done"),
            Err(e) => tracing::error!(document = %id, error = %e, "failed"),
        }
    }

    println!("\nAsk questions (empty line to quit):");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        match context.synthesizer().answer(question, None).await {
            Ok(result) => {
                println!("\n{}\n", result.answer);
                for source in &result.sources {
                    println!(
                        "  [{} chunk {} relevance {:.2}] {}",
                        source.document_title, source.chunk_index, source.relevance, source.excerpt
                    );
                }
                if let Some(confidence) = result.confidence {
                    println!("  confidence {:.2}, {} ms", confidence, result.elapsed_ms);
                }
            }
            Err(e) => println!("error: {e}"),
        }
    }

    Ok(())
}

/// Register every supported file under `folder`, with paths relative to it
fn register_folder(context: &RagContext, folder: &Path) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::new();
    for entry in WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_type) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(FileType::from_extension)
        else {
            continue;
        };
        let file_ref = path
            .strip_prefix(folder)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_ref.clone());
        let meta = DocumentMeta {
            id: Uuid::new_v4(),
            title,
            file_ref,
            file_type,
            size_bytes: entry.metadata().map(|m| m.len()).unwrap_or(0),
            is_public: true,
        };
        tracing::info!(file = %meta.file_ref, "registered");
        ids.push(meta.id);
        context.registry().register(meta);
    }
    Ok(ids)
}
