//! Zip bundle connector: the knowledge base shipped as one archive.
//!
//! Every entry whose name ends in `.md` (any case) becomes a document,
//! identified by its path inside the archive and kept in archive order.
//! An entry that cannot be decompressed, exceeds [`MAX_ENTRY_BYTES`], or
//! is not valid UTF-8 is skipped.

use context_relay_core::connector::{Connector, Corpus};
use context_relay_core::error::IngestError;
use context_relay_core::models::SourceDoc;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

/// Upper bound on the decompressed size of a single entry.
pub const MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

pub struct ZipBundleConnector {
    path: PathBuf,
    description: String,
}

impl ZipBundleConnector {
    pub fn new(path: PathBuf) -> Self {
        let description = format!("zip bundle {}", path.display());
        Self { path, description }
    }
}

impl Connector for ZipBundleConnector {
    fn name(&self) -> &str {
        "zip"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn load(&self) -> Result<Corpus, IngestError> {
        let source_name = self.path.display().to_string();
        let file = File::open(&self.path).map_err(|source| IngestError::Io {
            source_name: source_name.clone(),
            source,
        })?;
        let mut archive =
            zip::ZipArchive::new(BufReader::new(file)).map_err(|e| IngestError::Archive {
                source_name: source_name.clone(),
                reason: e.to_string(),
            })?;

        let mut corpus = Corpus::default();
        for i in 0..archive.len() {
            let entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    corpus.skip(format!("#{}", i), e);
                    continue;
                }
            };
            if entry.is_dir() || !entry.name().to_lowercase().ends_with(".md") {
                continue;
            }

            let name = entry.name().to_string();
            let text = read_bounded(entry, MAX_ENTRY_BYTES)
                .and_then(|bytes| String::from_utf8(bytes).map_err(|e| e.to_string()));
            match text {
                Ok(text) => corpus.push(SourceDoc::new(name, text)),
                Err(reason) => corpus.skip(name, reason),
            }
        }
        Ok(corpus)
    }
}

fn read_bounded(entry: impl Read, max_bytes: u64) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    entry
        .take(max_bytes + 1)
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    if out.len() as u64 > max_bytes {
        return Err(format!("entry exceeds size limit ({} bytes)", max_bytes));
    }
    Ok(out)
}
