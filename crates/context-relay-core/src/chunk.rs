//! Section-aware text chunker.
//!
//! Splits a document into [`Chunk`]s no longer than `chunk_size` bytes.
//! Markdown headings delimit sections; a section that fits is kept whole,
//! an oversized one is re-packed word by word.
//!
//! Chunk IDs are derived from the document path and the chunk's position,
//! so re-chunking the same document always yields the same IDs.
//!
//! # Algorithm
//!
//! 1. Collapse whitespace runs holding three or more newlines to a single
//!    blank line, then trim.
//! 2. Start a new section at every line whose trimmed form begins with `#`.
//!    Each line keeps its trailing `\n`.
//! 3. A section of at most `chunk_size` bytes becomes one chunk,
//!    `{path}_chunk_{i}`.
//! 4. A longer section is split on whitespace and greedily packed into
//!    space-joined parts, `{path}_chunk_{i}_{j}`. A single word longer than
//!    `chunk_size` is kept whole in its own part.
//!
//! # Example
//!
//! ```rust
//! use context_relay_core::chunk::{build_document, chunk_document};
//! use context_relay_core::models::SourceDoc;
//!
//! let doc = build_document(&SourceDoc::new("faq.md", "# FAQ\n\nShort answer."));
//! let chunks = chunk_document(&doc, 1000);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].id, "faq.md_chunk_0");
//! assert_eq!(chunks[0].title, "FAQ");
//! ```

use std::borrow::Cow;

use sha2::{Digest, Sha256};

use crate::keywords::extract_keywords;
use crate::models::{Chunk, Document, SourceDoc};

/// Title used when a document has no `# ` heading.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Turn a raw source pair into a [`Document`].
pub fn build_document(source: &SourceDoc) -> Document {
    Document {
        path: source.id.clone(),
        title: extract_title(&source.text),
        content: source.text.clone(),
        size: source.text.len(),
    }
}

/// Return the text of the first top-level `# ` heading, or [`DEFAULT_TITLE`].
pub fn extract_title(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Split a document into chunks of at most `chunk_size` bytes.
pub fn chunk_document(doc: &Document, chunk_size: usize) -> Vec<Chunk> {
    let content = normalize_whitespace(&doc.content);
    let mut chunks = Vec::new();

    for (i, section) in split_sections(&content).iter().enumerate() {
        if section.trim().is_empty() {
            continue;
        }

        if section.len() <= chunk_size {
            chunks.push(make_chunk(doc, format!("{}_chunk_{}", doc.path, i), section));
        } else {
            for (j, part) in split_words(section, chunk_size).iter().enumerate() {
                chunks.push(make_chunk(doc, format!("{}_chunk_{}_{}", doc.path, i, j), part));
            }
        }
    }

    chunks
}

/// Collapse whitespace runs containing three or more newlines.
///
/// Within such a run, everything from the first to the last newline is
/// replaced by `"\n\n"`; whitespace before the first and after the last
/// newline is kept. The result is trimmed.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(|c: char| c.is_ascii_whitespace()) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let run_len = tail
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(tail.len());
        out.push_str(&collapse_newlines(&tail[..run_len]));
        rest = &tail[run_len..];
    }
    out.push_str(rest);

    out.trim().to_string()
}

fn collapse_newlines(run: &str) -> Cow<'_, str> {
    if run.matches('\n').count() < 3 {
        return Cow::Borrowed(run);
    }
    match (run.find('\n'), run.rfind('\n')) {
        (Some(first), Some(last)) => Cow::Owned(format!("{}\n\n{}", &run[..first], &run[last + 1..])),
        _ => Cow::Borrowed(run),
    }
}

/// Split text into sections at heading lines.
///
/// Every line, including the last, is terminated with `\n` in the output.
pub fn split_sections(content: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in content.split('\n') {
        if line.trim().starts_with('#') && !current.is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

/// Greedily pack whitespace-delimited words into space-joined parts.
pub fn split_words(text: &str, chunk_size: usize) -> Vec<String> {
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > chunk_size {
            parts.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn make_chunk(doc: &Document, id: String, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id,
        doc_path: doc.path.clone(),
        title: doc.title.clone(),
        text: text.to_string(),
        keywords: extract_keywords(text),
        hash,
    }
}
