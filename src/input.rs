use std::io::{self, BufRead, Write};

use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind, KeyModifiers,
};
use console::measure_text_width;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{cursor, execute, queue};

use crate::error::Result;
use crate::i18n::{Language, MessageKey, t};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Line(String),
    /// Ctrl+C, Esc, or end of input.
    Cancelled,
}

pub trait Prompter {
    fn read_line(&mut self) -> Result<UserInput>;
}

/// Reads plain lines, for piped stdin and tests. End of input cancels.
pub struct LinePrompter<R> {
    reader: R,
}

impl<R: BufRead> LinePrompter<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Prompter for LinePrompter<R> {
    fn read_line(&mut self) -> Result<UserInput> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(UserInput::Cancelled);
        }
        let line = line.trim_end_matches(['\r', '\n']);
        Ok(UserInput::Line(line.to_string()))
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnableBracketedPaste) {
            terminal::disable_raw_mode().ok();
            return Err(e.into());
        }
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableBracketedPaste);
        let _ = terminal::disable_raw_mode();
    }
}

fn terminal_width() -> usize {
    terminal::size().map(|(w, _)| w as usize).unwrap_or(80)
}

/// Rows a prompt of `width` columns occupies; an exact fit leaves the cursor on the last row.
fn rows_used(width: usize, columns: usize) -> usize {
    width.div_ceil(columns.max(1)).max(1)
}

/// Single-line editor on crossterm key events. Raw mode is only held while reading.
pub struct TerminalPrompter {
    lang: Language,
    /// Rows between the prompt's first row and the cursor after the last draw.
    cursor_row: usize,
}

impl TerminalPrompter {
    pub fn new(lang: Language) -> Self {
        Self { lang, cursor_row: 0 }
    }

    /// Redraws the whole prompt, including rows a long line wrapped onto.
    fn draw(&mut self, buf: &str) -> Result<()> {
        let label = t(&self.lang, MessageKey::PromptUser);
        let prefix = format!("{label} ");
        let columns = terminal_width();
        let mut stdout = io::stdout();

        if self.cursor_row > 0 {
            queue!(stdout, cursor::MoveUp(self.cursor_row as u16))?;
        }
        queue!(stdout, cursor::MoveToColumn(0), Clear(ClearType::FromCursorDown))?;

        if buf.is_empty() {
            let placeholder = t(&self.lang, MessageKey::PromptPlaceholder);
            queue!(
                stdout,
                Print(label.cyan()),
                Print(' '),
                cursor::SavePosition,
                Print(placeholder.dim()),
                cursor::RestorePosition
            )?;
            self.cursor_row = rows_used(measure_text_width(&prefix), columns) - 1;
        } else {
            queue!(stdout, Print(label.cyan()), Print(' '), Print(buf))?;
            let width = measure_text_width(&prefix) + measure_text_width(buf);
            self.cursor_row = rows_used(width, columns) - 1;
        }
        stdout.flush()?;
        Ok(())
    }

    fn finish_line(&mut self) -> Result<()> {
        self.cursor_row = 0;
        print!("\r\n");
        io::stdout().flush()?;
        Ok(())
    }
}

impl Prompter for TerminalPrompter {
    fn read_line(&mut self) -> Result<UserInput> {
        let _guard = RawModeGuard::enable()?;
        let mut buf = String::new();
        self.draw(&buf)?;

        loop {
            match event::read()? {
                Event::Key(key) => {
                    if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        continue;
                    }
                    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                    match key.code {
                        KeyCode::Enter => {
                            self.finish_line()?;
                            return Ok(UserInput::Line(buf));
                        }
                        KeyCode::Char('c') if ctrl => {
                            self.finish_line()?;
                            return Ok(UserInput::Cancelled);
                        }
                        KeyCode::Char('d') if ctrl && buf.is_empty() => {
                            self.finish_line()?;
                            return Ok(UserInput::Cancelled);
                        }
                        KeyCode::Esc => {
                            self.finish_line()?;
                            return Ok(UserInput::Cancelled);
                        }
                        KeyCode::Backspace => {
                            if buf.pop().is_some() {
                                self.draw(&buf)?;
                            }
                        }
                        KeyCode::Char(_) if ctrl => {}
                        KeyCode::Char(c) => {
                            buf.push(c);
                            self.draw(&buf)?;
                        }
                        _ => {}
                    }
                }
                Event::Paste(pasted) => {
                    let normalized = pasted.replace(['\r', '\n'], " ");
                    buf.push_str(&normalized);
                    self.draw(&buf)?;
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_line_prompter_reads_lines_then_cancels() {
        let mut prompter = LinePrompter::new(Cursor::new("hi there\r\n\nexit"));
        assert_eq!(
            prompter.read_line().unwrap(),
            UserInput::Line("hi there".to_string())
        );
        assert_eq!(prompter.read_line().unwrap(), UserInput::Line(String::new()));
        assert_eq!(prompter.read_line().unwrap(), UserInput::Line("exit".to_string()));
        assert_eq!(prompter.read_line().unwrap(), UserInput::Cancelled);
    }

    #[test]
    fn test_prompt_label_width_counts_wide_chars() {
        assert_eq!(measure_text_width("You: "), 5);
        assert_eq!(measure_text_width("你: "), 4);
        assert_eq!(measure_text_width(&"你: ".cyan().to_string()), 4);
    }

    #[test]
    fn test_rows_used_by_wrapped_prompt() {
        assert_eq!(rows_used(0, 80), 1);
        assert_eq!(rows_used(5, 80), 1);
        assert_eq!(rows_used(80, 80), 1);
        assert_eq!(rows_used(81, 80), 2);
        assert_eq!(rows_used(200, 80), 3);
        assert_eq!(rows_used(10, 0), 10);
    }
}
