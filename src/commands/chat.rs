use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use tracing::info;

use crate::chat::{ChatSession, DEFAULT_SYSTEM_PROMPT, SessionEnd};
use crate::config::{ConfigStore, EffectiveConfig};
use crate::i18n::Language;
use crate::input::{LinePrompter, Prompter, TerminalPrompter};
use crate::llm::openai::OpenAIClient;

pub fn run(store: ConfigStore, system: Option<String>) -> Result<SessionEnd> {
    let config = store.read().context("failed to load configuration")?;
    let lang = config.language();
    let system_prompt = system
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    let client = OpenAIClient::new(store)?;
    if io::stdin().is_terminal() {
        run_session(&client, TerminalPrompter::new(lang), lang, system_prompt, &config)
    } else {
        let prompter = LinePrompter::new(io::stdin().lock());
        run_session(&client, prompter, lang, system_prompt, &config)
    }
}

fn run_session<P: Prompter>(
    client: &OpenAIClient,
    prompter: P,
    lang: Language,
    system_prompt: String,
    config: &EffectiveConfig,
) -> Result<SessionEnd> {
    let mut session = ChatSession::new(client, prompter, io::stdout(), lang, system_prompt);
    let end = session.run(config)?;
    info!(
        ?end,
        turns = session.history().len(),
        state = ?session.state(),
        "chat command finished"
    );
    Ok(end)
}
