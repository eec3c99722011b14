//! Background line reader for timer-mode.
//!
//! In timer-mode the driver's main loop keeps ticking while the player
//! types, so the blocking read runs on its own thread. The thread sleeps
//! until the driver arms it with `enable()`, reads exactly one line into the
//! player's buffer, disarms itself and goes back to sleep.
//!
//! ```text
//!   disabled ──enable()──▶ enabled ──one read──▶ disabled
//!       │                                           │
//!       └────────────stop() / "quit"────────────────┴──▶ stopped
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};

use crate::console::ConsoleIo;
use crate::console::error::ConsoleError;
use crate::core::player::Player;
use crate::core::signal::Signal;

/// Handle to the background input thread of one player session.
pub struct AsyncConsoleInput {
    enabled: Arc<Signal>,
    stop_requested: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<(), ConsoleError>>>,
    player_name: String,
}

impl AsyncConsoleInput {
    pub(crate) fn start(io: Arc<ConsoleIo>, player: Arc<dyn Player>) -> Result<Self, ConsoleError> {
        let enabled = Arc::new(Signal::new());
        let stop_requested = Arc::new(AtomicBool::new(false));
        let player_name = player.name().to_string();

        let thread = {
            let enabled = Arc::clone(&enabled);
            let stop_requested = Arc::clone(&stop_requested);
            thread::Builder::new()
                .name(format!("input-{player_name}"))
                .spawn(move || read_loop(&io, player.as_ref(), &enabled, &stop_requested))?
        };
        debug!("Async input started for {}", player_name);

        Ok(Self {
            enabled,
            stop_requested,
            thread: Some(thread),
            player_name,
        })
    }

    /// Arms the thread for its next read. Idempotent.
    pub fn enable(&self) {
        self.enabled.set();
    }

    /// Disarms the thread. A read already in progress is not affected.
    pub fn disable(&self) {
        self.enabled.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.is_set()
    }

    /// Waits for the current read to finish and the thread to disarm.
    /// Call before re-arming so the thread's own clear can't swallow the
    /// new `enable()`.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.enabled.wait_cleared(timeout)
    }

    /// True once the read loop has ended (player quit, stop, or error).
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stops the loop and waits for the thread to exit.
    ///
    /// If a read is in flight this blocks until that read completes. Returns
    /// the error that ended the loop, if there was one.
    pub fn stop(mut self) -> Result<(), ConsoleError> {
        self.request_stop();
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        let result = thread
            .join()
            .unwrap_or_else(|_| Err(ConsoleError::Io(io::Error::other("input thread panicked"))));
        info!("Async input for {} stopped", self.player_name);
        result
    }

    fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.enabled.set();
    }
}

impl Drop for AsyncConsoleInput {
    fn drop(&mut self) {
        // No join: the thread may be stuck in a terminal read.
        if self.thread.is_some() {
            self.request_stop();
        }
    }
}

fn read_loop(
    io: &ConsoleIo,
    player: &dyn Player,
    enabled: &Signal,
    stop_requested: &AtomicBool,
) -> Result<(), ConsoleError> {
    loop {
        enabled.wait();
        if stop_requested.load(Ordering::SeqCst) {
            debug!("Async input for {} asked to stop", player.name());
            return Ok(());
        }
        // The line lands in the player's buffer before the flag is cleared.
        let result = io.input_line(player);
        enabled.clear();
        match result {
            // A stop that arrived mid-read had its wake-up wiped by the clear.
            Ok(true) if stop_requested.load(Ordering::SeqCst) => {
                debug!("Async input for {} stopped after its last read", player.name());
                return Ok(());
            }
            Ok(true) => {}
            Ok(false) => {
                info!("{} quit, async input loop ends", player.name());
                return Ok(());
            }
            Err(e) => {
                error!("Async input for {} failed: {}", player.name(), e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{LineSource, ReadOutcome};
    use crate::core::PlayerSession;
    use std::sync::mpsc;
    use crate::test_support::{SharedBuffer, scripted_console, test_console};
    use std::time::Instant;

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_starts_disabled_and_reads_nothing() {
        let io = Arc::new(scripted_console(
            [ReadOutcome::Line("look\n".into())],
            SharedBuffer::default(),
        ));
        let player = Arc::new(PlayerSession::new("julie"));
        let input = Arc::clone(&io).get_async_input(player.clone()).unwrap();

        assert!(!input.is_enabled());
        assert!(!player.wait_for_input(Duration::from_millis(20)));
        input.stop().unwrap();
        assert!(!player.has_pending_input());
    }

    #[test]
    fn test_one_read_per_enable() {
        let io = Arc::new(scripted_console(
            [
                ReadOutcome::Line("look\n".into()),
                ReadOutcome::Line("north\n".into()),
            ],
            SharedBuffer::default(),
        ));
        let player = Arc::new(PlayerSession::new("julie"));
        let input = Arc::clone(&io).get_async_input(player.clone()).unwrap();

        input.enable();
        assert!(player.wait_for_input(Duration::from_secs(5)));
        assert!(input.wait_idle(Duration::from_secs(5)));
        assert_eq!(player.get_pending_input(), vec!["look"]);

        // Not re-armed, so the second line stays unread
        assert!(!player.wait_for_input(Duration::from_millis(20)));

        input.enable();
        assert!(player.wait_for_input(Duration::from_secs(5)));
        assert!(input.wait_idle(Duration::from_secs(5)));
        assert_eq!(player.get_pending_input(), vec!["north"]);
        input.stop().unwrap();
    }

    #[test]
    fn test_quit_ends_the_loop() {
        let io = Arc::new(scripted_console(
            [ReadOutcome::Line("quit\n".into())],
            SharedBuffer::default(),
        ));
        let player = Arc::new(PlayerSession::new("julie"));
        let input = Arc::clone(&io).get_async_input(player.clone()).unwrap();

        input.enable();
        assert!(wait_until(|| input.is_finished()));
        assert_eq!(player.get_pending_input(), vec!["quit"]);
        input.stop().unwrap();
    }

    #[test]
    fn test_stop_joins_the_thread() {
        let io = Arc::new(test_console(false).0);
        let player = Arc::new(PlayerSession::new("julie"));
        let input = Arc::clone(&io).get_async_input(player.clone()).unwrap();

        input.stop().unwrap();
        // The thread's clones are gone, so it has fully exited
        assert_eq!(Arc::strong_count(&io), 1);
        assert_eq!(Arc::strong_count(&player), 1);
    }

    /// Blocks each read until the test hands it an outcome.
    struct GatedSource {
        started: mpsc::Sender<()>,
        release: mpsc::Receiver<ReadOutcome>,
    }

    impl LineSource for GatedSource {
        fn read_line(&mut self) -> io::Result<ReadOutcome> {
            let _ = self.started.send(());
            Ok(self.release.recv().unwrap_or(ReadOutcome::EndOfInput))
        }
    }

    #[test]
    fn test_stop_during_read_returns_once_read_completes() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let io = Arc::new(ConsoleIo::new(
            Box::new(GatedSource {
                started: started_tx,
                release: release_rx,
            }),
            Box::new(SharedBuffer::default()),
            None,
        ));
        let player = Arc::new(PlayerSession::new("julie"));
        let input = Arc::clone(&io).get_async_input(player.clone()).unwrap();

        input.enable();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let stopper = thread::spawn(move || {
            let _ = done_tx.send(input.stop());
        });
        thread::sleep(Duration::from_millis(20));
        release_tx.send(ReadOutcome::Line("look\n".into())).unwrap();

        let stopped = done_rx.recv_timeout(Duration::from_secs(5));
        assert!(matches!(stopped, Ok(Ok(()))), "stop did not return: {stopped:?}");
        stopper.join().unwrap();
        assert_eq!(player.get_pending_input(), vec!["look"]);
        assert_eq!(Arc::strong_count(&io), 1);
    }

    #[test]
    fn test_disable_before_read_keeps_thread_idle() {
        let io = Arc::new(scripted_console(
            [ReadOutcome::Line("look\n".into())],
            SharedBuffer::default(),
        ));
        let player = Arc::new(PlayerSession::new("julie"));
        let input = Arc::clone(&io).get_async_input(player.clone()).unwrap();

        input.disable();
        assert!(!input.is_enabled());
        assert!(!player.wait_for_input(Duration::from_millis(20)));
        input.stop().unwrap();
    }
}
