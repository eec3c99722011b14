//! # Style Tags
//!
//! Text handed to the console may carry style tags between angle brackets:
//! `<bright>`, `<red>`, `<bg:blue>`, and `</>` to reset everything.
//!
//! [`StyleTag`] is the one vocabulary shared by the whole crate. The color
//! table in `console::colors` is an exhaustive match over it, so the set of
//! tags the console can render and the set of tags the text may contain are
//! always the same set.

use std::borrow::Cow;
use std::fmt;

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleTag {
    Dim,
    Normal,
    Bright,
    Underline,
    Reverse,
    Reset,
    Blink,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BgBlack,
    BgRed,
    BgGreen,
    BgYellow,
    BgBlue,
    BgMagenta,
    BgCyan,
    BgWhite,
    // Semantic tags for game objects
    Living,
    Player,
    Item,
    Exit,
    Location,
}

impl StyleTag {
    /// Every tag, in table order. Substitution walks this order.
    pub const ALL: [StyleTag; 28] = [
        StyleTag::Dim,
        StyleTag::Normal,
        StyleTag::Bright,
        StyleTag::Underline,
        StyleTag::Reverse,
        StyleTag::Reset,
        StyleTag::Blink,
        StyleTag::Black,
        StyleTag::Red,
        StyleTag::Green,
        StyleTag::Yellow,
        StyleTag::Blue,
        StyleTag::Magenta,
        StyleTag::Cyan,
        StyleTag::White,
        StyleTag::BgBlack,
        StyleTag::BgRed,
        StyleTag::BgGreen,
        StyleTag::BgYellow,
        StyleTag::BgBlue,
        StyleTag::BgMagenta,
        StyleTag::BgCyan,
        StyleTag::BgWhite,
        StyleTag::Living,
        StyleTag::Player,
        StyleTag::Item,
        StyleTag::Exit,
        StyleTag::Location,
    ];

    /// The identifier written between the brackets.
    pub fn name(self) -> &'static str {
        match self {
            StyleTag::Dim => "dim",
            StyleTag::Normal => "normal",
            StyleTag::Bright => "bright",
            StyleTag::Underline => "ul",
            StyleTag::Reverse => "rev",
            StyleTag::Reset => "/",
            StyleTag::Blink => "blink",
            StyleTag::Black => "black",
            StyleTag::Red => "red",
            StyleTag::Green => "green",
            StyleTag::Yellow => "yellow",
            StyleTag::Blue => "blue",
            StyleTag::Magenta => "magenta",
            StyleTag::Cyan => "cyan",
            StyleTag::White => "white",
            StyleTag::BgBlack => "bg:black",
            StyleTag::BgRed => "bg:red",
            StyleTag::BgGreen => "bg:green",
            StyleTag::BgYellow => "bg:yellow",
            StyleTag::BgBlue => "bg:blue",
            StyleTag::BgMagenta => "bg:magenta",
            StyleTag::BgCyan => "bg:cyan",
            StyleTag::BgWhite => "bg:white",
            StyleTag::Living => "living",
            StyleTag::Player => "player",
            StyleTag::Item => "item",
            StyleTag::Exit => "exit",
            StyleTag::Location => "location",
        }
    }

    /// Looks up a tag by its bracketed identifier.
    pub fn from_name(name: &str) -> Option<StyleTag> {
        StyleTag::ALL.iter().copied().find(|tag| tag.name() == name)
    }

    /// The tag as it appears in text, e.g. `<bg:red>`.
    pub fn markup(self) -> String {
        format!("<{}>", self.name())
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

/// Names of all recognized tags.
pub fn all_style_tags() -> impl Iterator<Item = &'static str> {
    StyleTag::ALL.iter().map(|tag| tag.name())
}

/// If a recognized tag starts at byte `pos` of `text`, returns its byte length.
pub fn tag_len_at(text: &str, pos: usize) -> Option<usize> {
    let rest = &text[pos..];
    if !rest.starts_with('<') {
        return None;
    }
    let close = rest.find('>')?;
    StyleTag::from_name(&rest[1..close]).map(|_| close + 1)
}

/// Removes every recognized style tag. Unknown bracketed words (`<quit>`)
/// are left alone.
pub fn strip_text_styles(text: &str) -> Cow<'_, str> {
    if !text.contains('<') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while pos < text.len() {
        if let Some(len) = tag_len_at(text, pos) {
            pos += len;
            continue;
        }
        let ch = text[pos..].chars().next().unwrap_or_default();
        out.push(ch);
        pos += ch.len_utf8().max(1);
    }
    Cow::Owned(out)
}

/// Display width in terminal columns, with tags counting as zero.
pub fn visible_width(text: &str) -> usize {
    strip_text_styles(text).width()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_lookup() {
        for tag in StyleTag::ALL {
            assert_eq!(StyleTag::from_name(tag.name()), Some(tag));
        }
        assert_eq!(StyleTag::from_name("quit"), None);
    }

    #[test]
    fn test_tag_names_are_unique() {
        let mut names: Vec<&str> = all_style_tags().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StyleTag::ALL.len());
    }

    #[test]
    fn test_strip_removes_every_tag() {
        for tag in StyleTag::ALL {
            let text = format!("a {}b</> c", tag.markup());
            assert_eq!(strip_text_styles(&text), "a b c");
        }
    }

    #[test]
    fn test_strip_keeps_unknown_brackets() {
        assert_eq!(
            strip_text_styles("Use <quit> to <bright>quit</>."),
            "Use <quit> to quit."
        );
        assert_eq!(strip_text_styles("a < b > c"), "a < b > c");
        assert_eq!(strip_text_styles("unterminated <bright"), "unterminated <bright");
    }

    #[test]
    fn test_strip_without_brackets_borrows() {
        assert!(matches!(strip_text_styles("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_strip_multibyte() {
        assert_eq!(strip_text_styles("<dim>≫</> café"), "≫ café");
    }

    #[test]
    fn test_visible_width_ignores_tags() {
        assert_eq!(visible_width("<location>Hall</>"), 4);
        assert_eq!(visible_width("<bg:red>ab</>cd"), 4);
    }

    #[test]
    fn test_tag_len_at() {
        assert_eq!(tag_len_at("<bg:red>x", 0), Some(8));
        assert_eq!(tag_len_at("x</>", 1), Some(3));
        assert_eq!(tag_len_at("<nope>", 0), None);
        assert_eq!(tag_len_at("x", 0), None);
    }

    #[test]
    fn test_display_is_markup() {
        assert_eq!(StyleTag::BgCyan.to_string(), "<bg:cyan>");
        assert_eq!(StyleTag::Reset.markup(), "</>");
    }
}
