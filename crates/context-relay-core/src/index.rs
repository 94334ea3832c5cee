//! Inverted keyword index over document chunks.
//!
//! An [`IndexSnapshot`] is one immutable generation of the index: the
//! documents, their chunks, and the keyword → chunk-position postings,
//! always built together. [`DocumentIndex`] holds the current snapshot
//! behind an `Arc` and replaces it wholesale on every ingest.
//!
//! # Publication
//!
//! ```text
//!   ingest():  load corpus ─▶ build snapshot (no lock) ─▶ swap Arc (write lock)
//!   search():  clone Arc (read lock) ─▶ score snapshot (no lock)
//! ```
//!
//! A search therefore sees either the old generation or the new one,
//! never a mix, and a slow search never delays an ingest beyond the
//! pointer swap.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::chunk::{build_document, chunk_document};
use crate::connector::{Connector, SkippedDocument};
use crate::error::IngestError;
use crate::models::{Chunk, Document, SearchHit, SourceDoc};
use crate::search;

/// One immutable generation of documents, chunks, and postings.
#[derive(Debug)]
pub struct IndexSnapshot {
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
    postings: HashMap<String, Vec<usize>>,
    built_at: DateTime<Utc>,
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            chunks: Vec::new(),
            postings: HashMap::new(),
            built_at: Utc::now(),
        }
    }

    /// Chunk every document and index the chunks' keywords.
    pub fn build(sources: &[SourceDoc], chunk_size: usize) -> Self {
        let mut documents = Vec::with_capacity(sources.len());
        let mut chunks = Vec::new();

        for source in sources {
            let doc = build_document(source);
            chunks.extend(chunk_document(&doc, chunk_size));
            documents.push(doc);
        }

        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, chunk) in chunks.iter().enumerate() {
            for keyword in &chunk.keywords {
                postings.entry(keyword.clone()).or_default().push(position);
            }
        }

        Self {
            documents,
            chunks,
            postings,
            built_at: Utc::now(),
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Positions of the chunks containing `keyword`, ascending.
    pub fn postings(&self, keyword: &str) -> Option<&[usize]> {
        self.postings.get(keyword).map(Vec::as_slice)
    }

    pub fn keyword_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.documents.len(),
            chunks: self.chunks.len(),
            keywords: self.postings.len(),
            built_at: self.built_at,
        }
    }

    pub fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        search::search(self, query, max_results)
    }
}

/// Size of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub keywords: usize,
    pub built_at: DateTime<Utc>,
}

/// Outcome of one ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub keywords: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// The live, swappable document index.
pub struct DocumentIndex {
    current: RwLock<Arc<IndexSnapshot>>,
    chunk_size: usize,
}

impl DocumentIndex {
    /// An empty index producing chunks of at most `chunk_size` bytes.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty())),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().clone()
    }

    /// Load `connector` and replace the whole index with its documents.
    ///
    /// On error the previous snapshot stays published.
    pub fn ingest(&self, connector: &dyn Connector) -> Result<IngestReport, IngestError> {
        info!(connector = connector.name(), "loading corpus");
        let corpus = connector.load()?;

        for skipped in &corpus.skipped {
            warn!(
                connector = connector.name(),
                document = %skipped.id,
                reason = %skipped.reason,
                "skipping unreadable document"
            );
        }

        let mut report = self.ingest_documents(&corpus.documents);
        report.skipped = corpus.skipped;
        Ok(report)
    }

    /// Replace the whole index with `sources`.
    pub fn ingest_documents(&self, sources: &[SourceDoc]) -> IngestReport {
        let snapshot = IndexSnapshot::build(sources, self.chunk_size);
        let report = IngestReport {
            documents: snapshot.documents.len(),
            chunks: snapshot.chunks.len(),
            keywords: snapshot.postings.len(),
            skipped: Vec::new(),
        };

        *self.current.write() = Arc::new(snapshot);

        info!(
            documents = report.documents,
            chunks = report.chunks,
            keywords = report.keywords,
            "published index snapshot"
        );
        report
    }

    /// Rank chunks for `query`; see [`search::search`].
    pub fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        self.snapshot().search(query, max_results)
    }

    pub fn stats(&self) -> IndexStats {
        self.snapshot().stats()
    }
}
