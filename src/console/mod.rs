//! # Console Adapter
//!
//! Reads player commands from a text terminal and writes styled text back
//! to it. This is the only module that touches the terminal.
//!
//! ```text
//!   driver ──render_output()──▶ String with tags
//!          ──output(lines)────▶ apply_style() ──▶ terminal (flushed)
//!
//!   terminal ──LineSource──▶ input_line() ──▶ Player::store_input_line()
//!                               ▲
//!                               └── AsyncConsoleInput (timer-mode thread)
//! ```
//!
//! ## Style resolution
//!
//! Text without a `<` goes out untouched. Otherwise, when a color backend
//! is present and styles are enabled, each known tag is swapped for its
//! escape code; if not, known tags are stripped.
//!
//! ## Reads
//!
//! Ctrl+C during `input_line` prints a hint and the loop carries on. End of
//! input also carries on, with nothing stored. Any other failure is returned.

pub mod async_input;
pub mod colors;
pub mod error;
pub mod terminal;

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::core::config::ResolvedConfig;
use crate::core::player::Player;
use crate::core::style::{StyleTag, strip_text_styles};
use crate::core::wrap::StyleTagsAwareWrapper;

pub use async_input::AsyncConsoleInput;
pub use colors::{AnsiPalette, ColorBackend};
pub use error::ConsoleError;
pub use terminal::{LineSource, ReadOutcome, ScriptedLines, StdinLines};

/// Shown before every command line.
pub const PROMPT: &str = "\n<dim>≫</> ";

/// Printed when Ctrl+C arrives during a read. `<quit>` is not a style tag
/// and is shown as-is.
pub const CTRL_C_MESSAGE: &str = "\n* break: Use <quit> if you want to quit.";

/// A block of text for `render_output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    /// Word-wrap this paragraph; otherwise only indent its existing lines.
    pub formatted: bool,
}

impl Paragraph {
    pub fn formatted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formatted: true,
        }
    }

    pub fn unformatted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formatted: false,
        }
    }
}

impl From<(&str, bool)> for Paragraph {
    fn from((text, formatted): (&str, bool)) -> Self {
        Self {
            text: text.to_string(),
            formatted,
        }
    }
}

/// I/O adapter for a text console.
pub struct ConsoleIo {
    input: Mutex<Box<dyn LineSource>>,
    output: Mutex<Box<dyn Write + Send>>,
    colors: Option<Box<dyn ColorBackend>>,
    do_styles: AtomicBool,
    /// Milliseconds; the driver may overwrite it.
    output_line_delay: AtomicU64,
    /// The last read hit end of input.
    input_closed: AtomicBool,
}

impl ConsoleIo {
    pub fn new(
        input: Box<dyn LineSource>,
        output: Box<dyn Write + Send>,
        colors: Option<Box<dyn ColorBackend>>,
    ) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            colors,
            do_styles: AtomicBool::new(true),
            output_line_delay: AtomicU64::new(crate::core::config::DEFAULT_OUTPUT_LINE_DELAY),
            input_closed: AtomicBool::new(false),
        }
    }

    /// Console on stdout with the given input source. Colors are used when
    /// stdout is a terminal; configured color overrides are validated here.
    pub fn for_terminal(
        config: &ResolvedConfig,
        input: Box<dyn LineSource>,
    ) -> Result<Self, ConsoleError> {
        let colors = AnsiPalette::detect(&config.colors)?
            .map(|palette| Box::new(palette) as Box<dyn ColorBackend>);
        info!(
            "Console on stdout (colors: {}, styles: {})",
            colors.is_some(),
            config.do_styles
        );
        let console = Self::new(input, Box::new(io::stdout()), colors);
        console.configure(config);
        Ok(console)
    }

    pub fn configure(&self, config: &ResolvedConfig) {
        self.set_do_styles(config.do_styles);
        self.set_output_line_delay(config.output_line_delay);
    }

    pub fn do_styles(&self) -> bool {
        self.do_styles.load(Ordering::Relaxed)
    }

    pub fn set_do_styles(&self, enabled: bool) {
        self.do_styles.store(enabled, Ordering::Relaxed);
    }

    pub fn output_line_delay(&self) -> u64 {
        self.output_line_delay.load(Ordering::Relaxed)
    }

    pub fn set_output_line_delay(&self, millis: u64) {
        self.output_line_delay.store(millis, Ordering::Relaxed);
    }

    /// Whether tags are turned into escape codes right now.
    pub fn colors_active(&self) -> bool {
        self.colors.is_some() && self.do_styles()
    }

    fn out(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        match self.output.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self) -> io::Result<ReadOutcome> {
        let mut input = match self.input.lock() {
            Ok(input) => input,
            Err(poisoned) => poisoned.into_inner(),
        };
        let outcome = input.read_line()?;
        match outcome {
            ReadOutcome::Line(_) => self.input_closed.store(false, Ordering::Relaxed),
            ReadOutcome::EndOfInput => self.input_closed.store(true, Ordering::Relaxed),
            ReadOutcome::Interrupted => {}
        }
        Ok(outcome)
    }

    /// True when the most recent read found the input closed. Lets a
    /// driver end the session, since `input_line` keeps going on its own.
    pub fn at_end_of_input(&self) -> bool {
        self.input_closed.load(Ordering::Relaxed)
    }

    /// Writes `text` with styles resolved, no newline, and flushes.
    fn write_flushed(&self, text: &str) -> io::Result<()> {
        let mut out = self.out();
        out.write_all(self.apply_style(text).as_bytes())?;
        out.flush()
    }

    /// Resolves style tags: escape codes when colors are on, stripped
    /// otherwise. Text without a `<` is returned borrowed.
    pub fn apply_style<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains('<') {
            return Cow::Borrowed(text);
        }
        match &self.colors {
            Some(colors) if self.do_styles() => {
                let mut line = text.to_string();
                for tag in StyleTag::ALL {
                    let markup = tag.markup();
                    if line.contains(&markup) {
                        line = line.replace(&markup, colors.escape_code(tag));
                    }
                }
                Cow::Owned(line)
            }
            _ => strip_text_styles(text),
        }
    }

    /// Asks for immediate input: shows `prompt`, blocks for one line and
    /// returns it trimmed.
    pub fn input(&self, prompt: Option<&str>) -> Result<String, ConsoleError> {
        if let Some(prompt) = prompt {
            self.write_flushed(prompt)?;
        }
        match self.read()? {
            ReadOutcome::Line(line) => Ok(line.trim().to_string()),
            ReadOutcome::Interrupted => Err(ConsoleError::Interrupted),
            ReadOutcome::EndOfInput => Err(ConsoleError::EndOfInput),
        }
    }

    /// Reads one command line into the player's input buffer.
    ///
    /// Returns `Ok(true)` if the input loop should carry on and `Ok(false)`
    /// when the player typed `quit`. Used directly by the driver in
    /// command-mode and by [`AsyncConsoleInput`] in timer-mode.
    pub fn input_line(&self, player: &dyn Player) -> Result<bool, ConsoleError> {
        self.write_flushed(PROMPT)?;
        match self.read()? {
            ReadOutcome::Line(line) => {
                let cmd = line.trim();
                player.store_input_line(cmd);
                if cmd == "quit" {
                    return Ok(false);
                }
            }
            ReadOutcome::Interrupted => self.break_pressed(player)?,
            ReadOutcome::EndOfInput => debug!("End of input for {}", player.name()),
        }
        Ok(true)
    }

    /// Formats paragraphs into one string, style tags left in place.
    ///
    /// Formatted paragraphs are wrapped to `width` columns with `indent`
    /// spaces of margin; unformatted ones only get `indent` spaces in front
    /// of each existing line. Each paragraph ends with one newline.
    /// Returns `None` for no paragraphs.
    pub fn render_output(&self, paragraphs: &[Paragraph], indent: usize, width: usize) -> Option<String> {
        if paragraphs.is_empty() {
            return None;
        }
        let indent = " ".repeat(indent);
        let wrapper = StyleTagsAwareWrapper::new(width)
            .indent(&indent)
            .fix_sentence_endings(true);

        let mut output = String::new();
        for paragraph in paragraphs {
            if paragraph.formatted {
                output.push_str(&wrapper.fill(&paragraph.text));
            } else {
                let lines = split_lines(&paragraph.text);
                if lines.is_empty() {
                    output.push_str(&indent);
                }
                for (idx, line) in lines.into_iter().enumerate() {
                    if idx > 0 {
                        output.push('\n');
                    }
                    output.push_str(&indent);
                    output.push_str(line);
                }
            }
            output.push('\n');
        }
        Some(output)
    }

    /// Writes each line plus a newline, styles resolved, then flushes once.
    pub fn output<I, S>(&self, lines: I) -> Result<(), ConsoleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.out();
        for line in lines {
            out.write_all(self.apply_style(line.as_ref()).as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Pauses for `output_line_delay` milliseconds.
    pub fn output_delay(&self) {
        thread::sleep(Duration::from_millis(self.output_line_delay()));
    }

    /// Called when the player hits Ctrl+C during a read.
    pub fn break_pressed(&self, player: &dyn Player) -> Result<(), ConsoleError> {
        debug!("Break pressed by {}", player.name());
        let mut out = self.out();
        out.write_all(self.apply_style(CTRL_C_MESSAGE).as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }

    /// Starts the background reader used in timer-mode. It begins disabled;
    /// call `enable()` each time a line is wanted.
    pub fn get_async_input(
        self: Arc<Self>,
        player: Arc<dyn Player>,
    ) -> Result<AsyncConsoleInput, ConsoleError> {
        AsyncConsoleInput::start(self, player)
    }
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Splits at every line boundary, not just `\n`; `\r\n` counts as one. A
/// trailing break does not start another line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if !is_line_break(ch) {
            continue;
        }
        lines.push(&text[start..idx]);
        start = idx + ch.len_utf8();
        if ch == '\r' && chars.next_if(|&(_, next)| next == '\n').is_some() {
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

impl fmt::Debug for ConsoleIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleIo")
            .field("colors", &self.colors.is_some())
            .field("do_styles", &self.do_styles())
            .field("output_line_delay", &self.output_line_delay())
            .finish_non_exhaustive()
    }
}
