//! Terminal color backend: style tag → ANSI escape sequence.
//!
//! The escape strings come from crossterm's commands, rendered once into a
//! table when the palette is built. The console holds the backend as an
//! `Option`; `None` means "no colors here", and tags get stripped instead.

use std::collections::{BTreeMap, HashMap};
use std::io::stdout;

use crossterm::Command;
use crossterm::style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::tty::IsTty;
use log::{debug, info};

use crate::console::error::ConsoleError;
use crate::core::style::StyleTag;

pub trait ColorBackend: Send + Sync {
    /// The escape sequence that `tag` turns into.
    fn escape_code(&self, tag: StyleTag) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StyleAction {
    Attr(Attribute),
    Fg(Color),
    Bg(Color),
}

impl StyleAction {
    fn to_ansi(self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = match self {
            StyleAction::Attr(attr) => SetAttribute(attr).write_ansi(&mut out),
            StyleAction::Fg(color) => SetForegroundColor(color).write_ansi(&mut out),
            StyleAction::Bg(color) => SetBackgroundColor(color).write_ansi(&mut out),
        };
        out
    }
}

fn default_action(tag: StyleTag) -> StyleAction {
    use StyleAction::{Attr, Bg, Fg};
    match tag {
        StyleTag::Dim => Attr(Attribute::Dim),
        StyleTag::Normal => Attr(Attribute::NormalIntensity),
        StyleTag::Bright => Attr(Attribute::Bold),
        StyleTag::Underline => Attr(Attribute::Underlined),
        StyleTag::Reverse => Attr(Attribute::Reverse),
        StyleTag::Reset => Attr(Attribute::Reset),
        StyleTag::Blink => Attr(Attribute::SlowBlink),
        StyleTag::Black => Fg(Color::Black),
        StyleTag::Red => Fg(Color::DarkRed),
        StyleTag::Green => Fg(Color::DarkGreen),
        StyleTag::Yellow => Fg(Color::DarkYellow),
        StyleTag::Blue => Fg(Color::DarkBlue),
        StyleTag::Magenta => Fg(Color::DarkMagenta),
        StyleTag::Cyan => Fg(Color::DarkCyan),
        StyleTag::White => Fg(Color::Grey),
        StyleTag::BgBlack => Bg(Color::Black),
        StyleTag::BgRed => Bg(Color::DarkRed),
        StyleTag::BgGreen => Bg(Color::DarkGreen),
        StyleTag::BgYellow => Bg(Color::DarkYellow),
        StyleTag::BgBlue => Bg(Color::DarkBlue),
        StyleTag::BgMagenta => Bg(Color::DarkMagenta),
        StyleTag::BgCyan => Bg(Color::DarkCyan),
        StyleTag::BgWhite => Bg(Color::Grey),
        StyleTag::Living | StyleTag::Player | StyleTag::Item | StyleTag::Exit | StyleTag::Location => {
            Attr(Attribute::Bold)
        }
    }
}

fn is_background(tag: StyleTag) -> bool {
    matches!(default_action(tag), StyleAction::Bg(_))
}

/// Parses a configured override value for `tag`. Colors land on the
/// background for `bg:` tags and on the foreground for everything else.
fn parse_override(tag: StyleTag, value: &str) -> Option<StyleAction> {
    let color = match value.trim().to_ascii_lowercase().as_str() {
        "bold" | "bright" => return Some(StyleAction::Attr(Attribute::Bold)),
        "dim" => return Some(StyleAction::Attr(Attribute::Dim)),
        "underline" | "ul" => return Some(StyleAction::Attr(Attribute::Underlined)),
        "reverse" | "rev" => return Some(StyleAction::Attr(Attribute::Reverse)),
        "black" => Color::Black,
        "red" => Color::DarkRed,
        "green" => Color::DarkGreen,
        "yellow" => Color::DarkYellow,
        "blue" => Color::DarkBlue,
        "magenta" => Color::DarkMagenta,
        "cyan" => Color::DarkCyan,
        "white" => Color::White,
        "grey" | "gray" => Color::Grey,
        "dark_grey" | "dark_gray" => Color::DarkGrey,
        _ => return None,
    };
    Some(if is_background(tag) {
        StyleAction::Bg(color)
    } else {
        StyleAction::Fg(color)
    })
}

/// ANSI escape table for every [`StyleTag`].
#[derive(Debug, Clone)]
pub struct AnsiPalette {
    codes: HashMap<StyleTag, String>,
}

impl Default for AnsiPalette {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiPalette {
    pub fn new() -> Self {
        let codes = StyleTag::ALL
            .iter()
            .map(|&tag| (tag, default_action(tag).to_ansi()))
            .collect();
        Self { codes }
    }

    /// Default palette with some tags recolored. Unknown tag names and
    /// unknown color names are rejected here, before any output happens.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, ConsoleError> {
        let mut palette = Self::new();
        for (name, value) in overrides {
            let tag = StyleTag::from_name(name)
                .ok_or_else(|| ConsoleError::UnknownStyleTag(name.clone()))?;
            let action = parse_override(tag, value).ok_or_else(|| ConsoleError::InvalidStyleValue {
                tag: name.clone(),
                value: value.clone(),
            })?;
            debug!("Style <{}> overridden with {:?}", name, action);
            palette.codes.insert(tag, action.to_ansi());
        }
        Ok(palette)
    }

    /// Builds the palette if stdout can show colors: it must be a terminal
    /// and `NO_COLOR` must be unset. The overrides are validated either way.
    pub fn detect(overrides: &BTreeMap<String, String>) -> Result<Option<Self>, ConsoleError> {
        let palette = Self::with_overrides(overrides)?;
        if std::env::var_os("NO_COLOR").is_some() {
            info!("NO_COLOR is set, style tags will be stripped");
            return Ok(None);
        }
        if !stdout().is_tty() {
            info!("stdout is not a terminal, style tags will be stripped");
            return Ok(None);
        }
        Ok(Some(palette))
    }
}

impl ColorBackend for AnsiPalette {
    fn escape_code(&self, tag: StyleTag) -> &str {
        self.codes.get(&tag).map(String::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_has_an_escape_code() {
        let palette = AnsiPalette::new();
        for tag in StyleTag::ALL {
            let code = palette.escape_code(tag);
            assert!(code.starts_with("\x1b["), "{tag} has no escape: {code:?}");
            assert!(code.ends_with('m'));
        }
    }

    #[test]
    fn test_reset_and_bright() {
        let palette = AnsiPalette::new();
        assert_eq!(palette.escape_code(StyleTag::Reset), "\x1b[0m");
        assert_eq!(palette.escape_code(StyleTag::Bright), "\x1b[1m");
        assert_eq!(palette.escape_code(StyleTag::Location), palette.escape_code(StyleTag::Bright));
    }

    #[test]
    fn test_foreground_and_background_differ() {
        let palette = AnsiPalette::new();
        assert_ne!(palette.escape_code(StyleTag::Red), palette.escape_code(StyleTag::BgRed));
    }

    #[test]
    fn test_override_recolors_tag() {
        let overrides = BTreeMap::from([("location".to_string(), "cyan".to_string())]);
        let palette = AnsiPalette::with_overrides(&overrides).unwrap();
        assert_eq!(
            palette.escape_code(StyleTag::Location),
            AnsiPalette::new().escape_code(StyleTag::Cyan)
        );
    }

    #[test]
    fn test_override_on_background_tag_stays_background() {
        let overrides = BTreeMap::from([("bg:blue".to_string(), "cyan".to_string())]);
        let palette = AnsiPalette::with_overrides(&overrides).unwrap();
        assert_eq!(
            palette.escape_code(StyleTag::BgBlue),
            AnsiPalette::new().escape_code(StyleTag::BgCyan)
        );
    }

    #[test]
    fn test_unknown_tag_fails() {
        let overrides = BTreeMap::from([("lcation".to_string(), "cyan".to_string())]);
        let err = AnsiPalette::with_overrides(&overrides).unwrap_err();
        assert!(matches!(err, ConsoleError::UnknownStyleTag(ref name) if name == "lcation"));
        assert!(err.to_string().contains("lcation"));
    }

    #[test]
    fn test_unknown_color_fails() {
        let overrides = BTreeMap::from([("item".to_string(), "chartreuse".to_string())]);
        let err = AnsiPalette::with_overrides(&overrides).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidStyleValue { .. }));
    }
}
