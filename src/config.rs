//! Configuration: a TOML file, then environment overrides, then validation.
//!
//! Every section is optional; a missing file yields [`Config::default`].
//! Environment variables override the file so a deployment can tune the
//! relay without shipping a config file.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DOCS_ZIP_PATH` | `corpus.zip_path` |
//! | `DOCS_DIR` | `corpus.dir` |
//! | `CHUNK_SIZE` | `chunking.chunk_size` |
//! | `MAX_CONTEXT_CHUNKS` | `retrieval.max_context_chunks` |
//! | `MAX_MESSAGES` | `conversation.max_messages` |
//! | `MAX_CONVERSATION_AGE_SECS` | `conversation.max_age_secs` |
//! | `LOG_LEVEL` | `logging.level` |
//! | `LOG_FORMAT` | `logging.format` |

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where documents come from. `zip_path` wins over `dir` when both are set.
#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default)]
    pub zip_path: Option<PathBuf>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            zip_path: None,
            dir: None,
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk length in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_max_context_chunks")]
    pub max_context_chunks: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: default_max_context_chunks(),
        }
    }
}

fn default_max_context_chunks() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversationConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_age_secs: default_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_max_messages() -> usize {
    20
}
fn default_max_age_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    900
}

#[derive(Debug, Deserialize, Clone)]
pub struct DedupConfig {
    #[serde(default = "default_dedup_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            max_entries: default_dedup_max_entries(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

fn default_dedup_max_entries() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    /// Replaces the built-in system prompt.
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default = "default_reply_limit")]
    pub reply_limit: usize,
    #[serde(default = "default_reply_keep")]
    pub reply_keep: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: None,
            reply_limit: default_reply_limit(),
            reply_keep: default_reply_keep(),
        }
    }
}

fn default_reply_limit() -> usize {
    4000
}
fn default_reply_keep() -> usize {
    3900
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty`, `compact`, or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DOCS_ZIP_PATH") {
            self.corpus.zip_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("DOCS_DIR") {
            self.corpus.dir = Some(PathBuf::from(v));
        }
        if let Some(v) = parse_var(&lookup, "CHUNK_SIZE")? {
            self.chunking.chunk_size = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_CONTEXT_CHUNKS")? {
            self.retrieval.max_context_chunks = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_MESSAGES")? {
            self.conversation.max_messages = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_CONVERSATION_AGE_SECS")? {
            self.conversation.max_age_secs = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.logging.format = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be > 0");
        }
        if self.conversation.max_messages == 0 {
            bail!("conversation.max_messages must be > 0");
        }
        if self.conversation.max_age_secs == 0 {
            bail!("conversation.max_age_secs must be > 0");
        }
        if self.conversation.sweep_interval_secs == 0 {
            bail!("conversation.sweep_interval_secs must be > 0");
        }
        if self.dedup.max_entries == 0 {
            bail!("dedup.max_entries must be > 0");
        }
        if self.prompt.reply_keep > self.prompt.reply_limit {
            bail!("prompt.reply_keep must not exceed prompt.reply_limit");
        }
        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            other => bail!(
                "Unknown logging.format: '{}'. Must be pretty, compact, or json.",
                other
            ),
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: '{}'", name, raw))
        })
        .transpose()
}

/// Parse a config file without environment overrides or validation.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

/// Load `path` (or defaults if it does not exist), apply process
/// environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.retrieval.max_context_chunks, 5);
        assert_eq!(config.conversation.max_messages, 20);
        assert_eq!(config.conversation.max_age_secs, 3600);
        assert_eq!(config.conversation.sweep_interval_secs, 900);
        assert_eq!(config.dedup.max_entries, 1000);
        assert_eq!(config.corpus.include_globs, vec!["**/*.md"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let config = parse_config(
            r#"
[corpus]
zip_path = "./kb.zip"

[chunking]
chunk_size = 400

[conversation]
max_messages = 8
"#,
        )
        .unwrap();
        assert_eq!(config.corpus.zip_path, Some(PathBuf::from("./kb.zip")));
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.conversation.max_messages, 8);
        assert_eq!(config.conversation.max_age_secs, 3600);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = parse_config("[chunking]\nchunk_size = 400").unwrap();
        config
            .apply_env(env(&[
                ("CHUNK_SIZE", "250"),
                ("MAX_CONTEXT_CHUNKS", "3"),
                ("DOCS_DIR", "/srv/docs"),
                ("LOG_FORMAT", "json"),
            ]))
            .unwrap();
        assert_eq!(config.chunking.chunk_size, 250);
        assert_eq!(config.retrieval.max_context_chunks, 3);
        assert_eq!(config.corpus.dir, Some(PathBuf::from("/srv/docs")));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("MAX_MESSAGES", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_MESSAGES"));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.chunking.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prompt.reply_keep = config.prompt.reply_limit + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/relay.toml")).unwrap();
        assert!(config.chunking.chunk_size > 0);
    }
}
