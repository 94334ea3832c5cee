//! Ingestion orchestration: pick the configured connector, load it into
//! the service's index, and report.
//!
//! A ZIP bundle takes precedence over a directory when both are
//! configured. With no source configured, or a configured source that does
//! not exist, the relay serves from an empty index.

use anyhow::{Context, Result};
use context_relay_core::connector::Connector;
use context_relay_core::error::IngestError;
use context_relay_core::index::IngestReport;
use tracing::warn;

use crate::config::Config;
use crate::connector_fs::DirectoryConnector;
use crate::connector_zip::ZipBundleConnector;
use crate::service::ContextService;

/// The connector for the configured corpus, if any.
pub fn build_connector(config: &Config) -> Result<Option<Box<dyn Connector>>> {
    if let Some(ref zip_path) = config.corpus.zip_path {
        return Ok(Some(Box::new(ZipBundleConnector::new(zip_path.clone()))));
    }
    if let Some(ref dir) = config.corpus.dir {
        let connector = DirectoryConnector::new(dir.clone(), &config.corpus)
            .with_context(|| format!("Invalid directory corpus: {}", dir.display()))?;
        return Ok(Some(Box::new(connector)));
    }
    Ok(None)
}

/// Ingest the configured corpus into `service`.
///
/// Returns `None` when no corpus is configured.
pub fn ingest(config: &Config, service: &ContextService) -> Result<Option<IngestReport>> {
    let Some(connector) = build_connector(config)? else {
        return Ok(None);
    };
    let report = service
        .reload(connector.as_ref())
        .with_context(|| format!("Failed to ingest {}", connector.description()))?;
    Ok(Some(report))
}

/// Build a service from `config` and load its corpus. A missing corpus is
/// logged and the service starts with an empty index.
pub fn load_service(config: &Config) -> Result<ContextService> {
    let service = ContextService::from_config(config);
    let Some(connector) = build_connector(config)? else {
        warn!("no corpus configured, running without knowledge base");
        return Ok(service);
    };

    match service.reload(connector.as_ref()) {
        Ok(_) => Ok(service),
        Err(e) if is_missing(&e) => {
            warn!(
                source = connector.description(),
                "corpus not found, running without knowledge base"
            );
            Ok(service)
        }
        Err(e) => {
            Err(e).with_context(|| format!("Failed to ingest {}", connector.description()))
        }
    }
}

fn is_missing(err: &IngestError) -> bool {
    match err {
        IngestError::SourceUnavailable(_) => true,
        IngestError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
        IngestError::Archive { .. } => false,
    }
}

/// `relayctx index`: ingest and print the report.
pub fn run_index(config: &Config, json: bool) -> Result<()> {
    let service = ContextService::from_config(config);
    let Some(report) = ingest(config, &service)? else {
        println!("No corpus configured. Set corpus.zip_path or corpus.dir.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("index");
    println!("  documents: {}", report.documents);
    println!("  chunks: {}", report.chunks);
    println!("  keywords: {}", report.keywords);
    println!("  skipped: {}", report.skipped.len());
    for skipped in &report.skipped {
        println!("    {}: {}", skipped.id, skipped.reason);
    }
    println!("ok");
    Ok(())
}
