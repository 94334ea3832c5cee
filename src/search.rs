//! `relayctx search`: ingest the configured corpus and print ranked chunks.

use anyhow::Result;

use crate::config::Config;
use crate::ingest::load_service;

const EXCERPT_CHARS: usize = 160;

pub fn run_search(config: &Config, query: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let service = load_service(config)?;
    let limit = limit.unwrap_or(config.retrieval.max_context_chunks);
    let hits = service.index().search(query, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{:.2}] {} / {}", i + 1, hit.score, hit.doc_path, hit.title);
        println!("    excerpt: \"{}\"", excerpt(&hit.text));
        println!("    id: {}", hit.chunk_id);
        println!();
    }
    Ok(())
}

fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    match flat.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat.to_string(),
    }
}
