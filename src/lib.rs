//! Tale console library exports

use clap::ValueEnum;

pub mod console;
pub mod core;

#[cfg(test)]
pub mod test_support;

pub use console::{ConsoleError, ConsoleIo, Paragraph};
pub use crate::core::{Player, PlayerSession, StyleTag};

/// How the driver gets its input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DriverMode {
    /// Each read blocks the main loop.
    #[default]
    Command,
    /// A background thread reads while the main loop keeps running.
    Timer,
}
