//! Prompt composition for a grounded language-model call.
//!
//! The relay does not call a model itself. It produces the system prompt
//! and the ordered message list a caller sends to one, and trims the
//! model's reply to what a chat surface accepts.

use anyhow::Result;
use context_relay_core::models::{Message, Role, SearchHit};
use serde::Serialize;

use crate::config::Config;
use crate::ingest::load_service;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions in a team chat. \
You help users with questions about the product, its documentation, and general tasks.

Key guidelines:
- Be helpful, friendly, and professional
- Provide clear, concise answers
- If you're unsure about something, say so
- For complex questions, break your response into digestible parts
- Prefer information from the provided documentation when it is available
- Keep responses conversational but informative";

pub const TRUNCATION_NOTICE: &str = "\n\n... (response truncated due to length)";

/// One entry of the message list sent to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

impl From<&Message> for PromptMessage {
    fn from(msg: &Message) -> Self {
        Self::new(msg.role.as_str(), msg.content.clone())
    }
}

/// Append the retrieved chunks to `base`. Without chunks, `base` is
/// returned unchanged.
pub fn build_system_prompt(base: &str, chunks: &[SearchHit]) -> String {
    if chunks.is_empty() {
        return base.to_string();
    }

    let mut prompt = String::with_capacity(
        base.len() + chunks.iter().map(|c| c.text.len() + c.title.len() + 32).sum::<usize>(),
    );
    prompt.push_str(base);
    prompt.push_str("\n\nRELEVANT DOCUMENTATION:\n");
    for (i, chunk) in chunks.iter().enumerate() {
        prompt.push_str(&format!(
            "\n--- Document {}: {} ---\n{}\n",
            i + 1,
            chunk.title,
            chunk.text
        ));
    }
    prompt.push_str(
        "\nUse the above documentation to inform your responses when relevant. \
If the documentation doesn't contain the answer, say so clearly.",
    );
    prompt
}

/// System message, then `history` in order, then the new user message.
pub fn compose_messages(
    system: &str,
    history: &[Message],
    user_message: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::new("system", system));
    messages.extend(history.iter().map(PromptMessage::from));
    messages.push(PromptMessage::new(Role::User.as_str(), user_message));
    messages
}

/// Cut replies longer than `limit` bytes to at most `keep` bytes, on a
/// char boundary, and append [`TRUNCATION_NOTICE`].
pub fn truncate_reply(text: &str, limit: usize, keep: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut cut = keep.min(text.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &text[..cut], TRUNCATION_NOTICE)
}

/// `relayctx prompt`: compose and print the grounded prompt for `message`.
///
/// `turns` seeds the thread's history before the message is prepared.
pub fn run_prompt(
    config: &Config,
    message: &str,
    thread: &str,
    turns: &[(Role, String)],
    json: bool,
) -> Result<()> {
    let service = load_service(config)?;
    for (role, content) in turns {
        service
            .conversations()
            .add_message(thread, *role, content.clone());
    }
    let prepared = service.prepare(thread, message);

    if json {
        println!("{}", serde_json::to_string_pretty(&prepared)?);
        return Ok(());
    }

    for msg in &prepared.messages {
        println!("[{}]", msg.role);
        println!("{}", msg.content);
        println!();
    }
    if prepared.sources.is_empty() {
        println!("sources: (none)");
    } else {
        println!("sources: {}", prepared.sources.join(", "));
    }
    Ok(())
}
