//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::console::{AnsiPalette, ColorBackend, ConsoleIo, ReadOutcome, ScriptedLines};

/// An in-memory terminal screen that stays readable after being handed
/// to a `ConsoleIo`.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console with no scripted input, writing into the returned buffer.
pub fn test_console(with_colors: bool) -> (ConsoleIo, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let colors = with_colors.then(|| Box::new(AnsiPalette::new()) as Box<dyn ColorBackend>);
    let console = ConsoleIo::new(
        Box::new(ScriptedLines::default()),
        Box::new(buffer.clone()),
        colors,
    );
    (console, buffer)
}

/// Colorless console that replays `outcomes` as its input.
pub fn scripted_console(
    outcomes: impl IntoIterator<Item = ReadOutcome>,
    buffer: SharedBuffer,
) -> ConsoleIo {
    ConsoleIo::new(
        Box::new(ScriptedLines::new(outcomes)),
        Box::new(buffer),
        None,
    )
}
