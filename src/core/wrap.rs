//! Word wrapping that understands style tags.
//!
//! Tags such as `<bright>` take no room on screen, so they must not count
//! towards the line width. Words are measured with their tags stripped and
//! then laid out with textwrap's first-fit algorithm.

use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;
use unicode_width::UnicodeWidthChar;

use crate::core::style::{strip_text_styles, tag_len_at, visible_width};

/// A word plus the whitespace that follows it. `width` excludes tags.
#[derive(Debug)]
struct StyledWord<'a> {
    word: &'a str,
    whitespace: &'static str,
    width: usize,
}

impl Fragment for StyledWord<'_> {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn whitespace_width(&self) -> f64 {
        self.whitespace.len() as f64
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct StyleTagsAwareWrapper {
    pub width: usize,
    pub initial_indent: String,
    pub subsequent_indent: String,
    /// Put two spaces after a sentence-ending word.
    pub fix_sentence_endings: bool,
}

impl StyleTagsAwareWrapper {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            initial_indent: String::new(),
            subsequent_indent: String::new(),
            fix_sentence_endings: false,
        }
    }

    /// Same indent on the first and on continuation lines.
    pub fn indent(mut self, indent: &str) -> Self {
        self.initial_indent = indent.to_string();
        self.subsequent_indent = indent.to_string();
        self
    }

    pub fn fix_sentence_endings(mut self, enabled: bool) -> Self {
        self.fix_sentence_endings = enabled;
        self
    }

    /// Wraps `text` into lines, indents included. Whitespace (newlines too)
    /// is collapsed between words. Empty text gives no lines.
    pub fn wrap(&self, text: &str) -> Vec<String> {
        let first_width = self.available(&self.initial_indent);
        let rest_width = self.available(&self.subsequent_indent);
        let words = self.split_words(text, first_width.min(rest_width));
        if words.is_empty() {
            return Vec::new();
        }

        let line_widths = [first_width as f64, rest_width as f64];
        wrap_first_fit(&words, &line_widths)
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let mut out = if idx == 0 {
                    self.initial_indent.clone()
                } else {
                    self.subsequent_indent.clone()
                };
                for (pos, word) in line.iter().enumerate() {
                    out.push_str(word.word);
                    if pos + 1 < line.len() {
                        out.push_str(word.whitespace);
                    }
                }
                out
            })
            .collect()
    }

    /// Wraps `text` and joins the lines with newlines (no trailing newline).
    pub fn fill(&self, text: &str) -> String {
        self.wrap(text).join("\n")
    }

    fn available(&self, indent: &str) -> usize {
        self.width.saturating_sub(visible_width(indent)).max(1)
    }

    fn split_words<'a>(&self, text: &'a str, limit: usize) -> Vec<StyledWord<'a>> {
        let mut words = Vec::new();
        for raw in text.split_whitespace() {
            let whitespace = if self.fix_sentence_endings && ends_sentence(raw) {
                "  "
            } else {
                " "
            };
            let parts = hyphen_parts(raw);
            let last = parts.len() - 1;
            for (idx, part) in parts.into_iter().enumerate() {
                let trailing = if idx == last { whitespace } else { "" };
                push_word(&mut words, part, trailing, limit);
            }
        }
        words
    }
}

/// Adds `word`, broken into pieces first if it is wider than `limit`.
fn push_word<'a>(words: &mut Vec<StyledWord<'a>>, word: &'a str, whitespace: &'static str, limit: usize) {
    let width = visible_width(word);
    if width <= limit {
        words.push(StyledWord { word, whitespace, width });
        return;
    }
    let chunks = split_long_word(word, limit);
    let last = chunks.len().saturating_sub(1);
    for (idx, chunk) in chunks.into_iter().enumerate() {
        words.push(StyledWord {
            word: chunk,
            whitespace: if idx == last { whitespace } else { "" },
            width: visible_width(chunk),
        });
    }
}

/// Splits a compound word after each hyphen that joins two words, so
/// `well-known` may break as `well-` / `known`. Dashes like `--` stay whole.
fn hyphen_parts(word: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = word.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '-'
            && prev.is_some_and(char::is_alphanumeric)
            && chars.peek().is_some_and(|&(_, next)| next.is_alphabetic())
        {
            parts.push(&word[start..=idx]);
            start = idx + 1;
        }
        prev = Some(ch);
    }
    parts.push(&word[start..]);
    parts
}

/// A lowercase letter, then `.`, `!` or `?`, then an optional quote.
fn ends_sentence(word: &str) -> bool {
    let plain = strip_text_styles(word);
    let mut chars = plain.chars().rev().peekable();
    if matches!(chars.peek(), Some('"') | Some('\'')) {
        chars.next();
    }
    matches!(chars.next(), Some('.') | Some('!') | Some('?'))
        && chars.next().is_some_and(|c| c.is_ascii_lowercase())
}

/// Breaks a word wider than `limit` columns into pieces that fit.
/// Tags never get split and stay with the text before them.
fn split_long_word(word: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut columns = 0;
    let mut pos = 0;
    while pos < word.len() {
        if let Some(len) = tag_len_at(word, pos) {
            pos += len;
            continue;
        }
        let Some(ch) = word[pos..].chars().next() else {
            break;
        };
        let ch_width = ch.width().unwrap_or(0);
        if columns > 0 && columns + ch_width > limit {
            chunks.push(&word[start..pos]);
            start = pos;
            columns = 0;
        }
        columns += ch_width;
        pos += ch.len_utf8();
    }
    if start < word.len() {
        chunks.push(&word[start..]);
    }
    chunks
}
