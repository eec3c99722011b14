//! # Player
//!
//! The console only needs two things from a player: a name to log against,
//! and somewhere to drop the line that was typed. [`Player`] is that seam.
//! [`PlayerSession`] is the session-side implementation the driver polls.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::debug;

use crate::core::signal::Signal;

pub trait Player: Send + Sync {
    /// Identity used for routing and logging.
    fn name(&self) -> &str;

    /// Appends one line of typed input to the player's command buffer.
    fn store_input_line(&self, line: &str);
}

/// A player's input buffer plus a signal the driver can wait on.
#[derive(Debug)]
pub struct PlayerSession {
    name: String,
    input_lines: Mutex<VecDeque<String>>,
    input_available: Signal,
}

impl PlayerSession {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_lines: Mutex::new(VecDeque::new()),
            input_available: Signal::new(),
        }
    }

    fn lines(&self) -> MutexGuard<'_, VecDeque<String>> {
        match self.input_lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Drains everything typed so far, oldest first.
    pub fn get_pending_input(&self) -> Vec<String> {
        let mut lines = self.lines();
        self.input_available.clear();
        lines.drain(..).collect()
    }

    pub fn has_pending_input(&self) -> bool {
        !self.lines().is_empty()
    }

    /// Waits until a line arrives or `timeout` passes.
    pub fn wait_for_input(&self, timeout: Duration) -> bool {
        self.input_available.wait_timeout(timeout)
    }
}

impl Player for PlayerSession {
    fn name(&self) -> &str {
        &self.name
    }

    fn store_input_line(&self, line: &str) {
        let line = line.trim();
        debug!("{} typed {:?}", self.name, line);
        let mut lines = self.lines();
        lines.push_back(line.to_string());
        self.input_available.set();
    }
}
