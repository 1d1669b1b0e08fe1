use std::io::{self, Write};

use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use tracing::{debug, info, warn};

use crate::config::EffectiveConfig;
use crate::error::Result;
use crate::i18n::{Language, MessageKey, t};
use crate::input::{Prompter, UserInput};
use crate::llm::{CompletionClient, Turn};
use crate::stream::drain;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const EXIT_KEYWORD: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingInput,
    Streaming,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed `exit` or cancelled the prompt.
    UserExit,
    /// Required settings were empty; no chat took place.
    NotConfigured,
}

/// One interactive conversation. History lives only as long as the session.
pub struct ChatSession<'a, C: ?Sized, P, W> {
    client: &'a C,
    prompter: P,
    out: W,
    lang: Language,
    system_prompt: String,
    history: Vec<Turn>,
    state: SessionState,
}

impl<'a, C, P, W> ChatSession<'a, C, P, W>
where
    C: CompletionClient + ?Sized,
    P: Prompter,
    W: Write,
{
    pub fn new(client: &'a C, prompter: P, out: W, lang: Language, system_prompt: String) -> Self {
        Self {
            client,
            prompter,
            out,
            lang,
            system_prompt,
            history: Vec::new(),
            state: SessionState::Idle,
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs until the user exits. Provider errors end the session and propagate.
    pub fn run(&mut self, config: &EffectiveConfig) -> Result<SessionEnd> {
        self.state = SessionState::Idle;
        if let Err(err) = config.credentials() {
            warn!(%err, "chat session not started");
            writeln!(self.out)?;
            writeln!(self.out, "{}", t(&self.lang, MessageKey::PleaseSetConfig))?;
            writeln!(self.out, "{}", t(&self.lang, MessageKey::RunConfigHint).dim())?;
            self.out.flush()?;
            self.state = SessionState::Exiting;
            return Ok(SessionEnd::NotConfigured);
        }

        info!("starting chat session");
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{}",
            t(&self.lang, MessageKey::StartingConversation).bold()
        )?;

        while let Some(prompt) = self.await_input()? {
            self.history.push(Turn::user(prompt));
            self.stream_reply()?;
        }

        self.state = SessionState::Exiting;
        writeln!(self.out, "{}", t(&self.lang, MessageKey::Goodbye))?;
        self.out.flush()?;
        info!(turns = self.history.len(), "chat session ended");
        Ok(SessionEnd::UserExit)
    }

    /// `None` means the user asked to leave.
    fn await_input(&mut self) -> Result<Option<String>> {
        self.state = SessionState::AwaitingInput;
        loop {
            self.out.flush()?;
            match self.prompter.read_line()? {
                UserInput::Cancelled => return Ok(None),
                UserInput::Line(line) => {
                    // Exact matches only: padded or whitespace-only lines are prompts.
                    if line == EXIT_KEYWORD {
                        return Ok(None);
                    }
                    if line.is_empty() {
                        writeln!(
                            self.out,
                            "{}",
                            t(&self.lang, MessageKey::PleaseEnterPrompt).yellow()
                        )?;
                        continue;
                    }
                    return Ok(Some(line));
                }
            }
        }
    }

    fn stream_reply(&mut self) -> Result<()> {
        self.state = SessionState::Streaming;
        let lang = self.lang;
        write!(self.out, "{}", t(&lang, MessageKey::Thinking).dim())?;
        self.out.flush()?;

        let fragments = self
            .client
            .stream_completion(&self.history, &self.system_prompt)?;

        let out = &mut self.out;
        let mut replying = false;
        let mut write_err: Option<io::Error> = None;
        let reply = drain(fragments, |fragment| {
            if write_err.is_some() {
                return;
            }
            if let Err(e) = forward(&mut *out, fragment, &mut replying, &lang) {
                write_err = Some(e);
            }
        })?;
        if let Some(e) = write_err {
            return Err(e.into());
        }

        if !replying {
            clear_line(&mut self.out)?;
        }
        if !reply.ends_with('\n') {
            writeln!(self.out)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;

        debug!(chars = reply.len(), "assistant reply complete");
        self.history.push(Turn::assistant(reply));
        self.state = SessionState::AwaitingInput;
        Ok(())
    }
}

fn clear_line<W: Write>(out: &mut W) -> io::Result<()> {
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))
}

/// Writes one fragment, replacing the thinking indicator with the header first.
fn forward<W: Write>(out: &mut W, fragment: &str, replying: &mut bool, lang: &Language) -> io::Result<()> {
    if !*replying {
        clear_line(out)?;
        writeln!(out, "{}", t(lang, MessageKey::ReplyHeader).green())?;
        writeln!(out)?;
        *replying = true;
    }
    out.write_all(fragment.as_bytes())?;
    out.flush()
}
