use std::fmt;
use std::io;

/// Errors raised by the console adapter.
#[derive(Debug)]
pub enum ConsoleError {
    /// Reading from or writing to the terminal failed.
    Io(io::Error),
    /// The user pressed Ctrl+C while a read was waiting.
    Interrupted,
    /// Input was closed (Ctrl+D, end of a script).
    EndOfInput,
    /// A configured color override names a tag that does not exist.
    UnknownStyleTag(String),
    /// A configured color override uses a color name we don't know.
    InvalidStyleValue { tag: String, value: String },
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Io(e) => write!(f, "console I/O error: {e}"),
            ConsoleError::Interrupted => write!(f, "input interrupted"),
            ConsoleError::EndOfInput => write!(f, "end of input"),
            ConsoleError::UnknownStyleTag(tag) => write!(f, "unknown style tag <{tag}>"),
            ConsoleError::InvalidStyleValue { tag, value } => {
                write!(f, "invalid color {value:?} for style tag <{tag}>")
            }
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConsoleError {
    fn from(e: io::Error) -> Self {
        ConsoleError::Io(e)
    }
}
