//! Directory connector: walks a local folder of Markdown files.
//!
//! Paths are matched relative to the root against `include_globs` and
//! `exclude_globs`; `.git`, `target` and `node_modules` are always
//! excluded. Documents are returned sorted by relative path so repeated
//! ingests produce the same chunk order.

use anyhow::{Context, Result};
use context_relay_core::connector::{Connector, Corpus};
use context_relay_core::error::IngestError;
use context_relay_core::models::SourceDoc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::config::CorpusConfig;

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

pub struct DirectoryConnector {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
    description: String,
}

impl DirectoryConnector {
    pub fn new(root: PathBuf, corpus: &CorpusConfig) -> Result<Self> {
        let include = build_globset(&corpus.include_globs)?;

        let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        excludes.extend(corpus.exclude_globs.iter().cloned());
        let exclude = build_globset(&excludes)?;

        let description = format!("directory {}", root.display());
        Ok(Self {
            root,
            include,
            exclude,
            follow_symlinks: corpus.follow_symlinks,
            description,
        })
    }
}

impl Connector for DirectoryConnector {
    fn name(&self) -> &str {
        "directory"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn load(&self) -> Result<Corpus, IngestError> {
        if !self.root.is_dir() {
            return Err(IngestError::SourceUnavailable(
                self.root.display().to_string(),
            ));
        }

        let mut corpus = Corpus::default();
        let walker = WalkDir::new(&self.root).follow_links(self.follow_symlinks);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let id = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| self.root.display().to_string());
                    corpus.skip(id, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().replace('\\', "/");

            if self.exclude.is_match(&rel_str) || !self.include.is_match(&rel_str) {
                continue;
            }

            match std::fs::read_to_string(path) {
                Ok(text) => corpus.push(SourceDoc::new(rel_str, text)),
                Err(e) => corpus.skip(rel_str, e),
            }
        }

        corpus.documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(corpus)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
