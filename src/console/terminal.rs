//! Where typed lines come from.
//!
//! A [`LineSource`] performs one blocking read and says how it ended: a
//! line, a Ctrl+C, or the end of input. [`StdinLines`] reads the real
//! terminal; [`ScriptedLines`] replays a prepared list, which is how command
//! scripts and tests drive the console.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use log::{debug, warn};

/// How one blocking read ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line as typed, line terminator included if there was one.
    Line(String),
    /// The user pressed Ctrl+C while the read was waiting.
    Interrupted,
    /// Input is closed.
    EndOfInput,
}

pub trait LineSource: Send {
    /// Blocks until a line is available, the user interrupts, or input ends.
    fn read_line(&mut self) -> io::Result<ReadOutcome>;
}

// ============================================================================
// Stdin
// ============================================================================

enum StdinEvent {
    Read(io::Result<Option<String>>),
    Interrupt,
}

/// Line reader over the process's stdin.
///
/// A helper thread does the actual blocking `read_line`, one per request, so
/// that a Ctrl+C can end the wait without killing the process. The helper
/// never reads ahead: a request is only sent when the previous one has been
/// answered.
pub struct StdinLines {
    requests: Sender<()>,
    events: Receiver<StdinEvent>,
    /// A read request is out and its answer hasn't arrived yet.
    pending: bool,
    /// Kept alive for its SIGINT registration; dropped with the reader.
    #[cfg(unix)]
    _interrupts: InterruptListener,
}

impl StdinLines {
    pub fn new() -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<()>();
        let (event_tx, event_rx) = mpsc::channel();

        #[cfg(unix)]
        let interrupts = InterruptListener::install(event_tx.clone())?;

        thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                let stdin = io::stdin();
                for () in request_rx {
                    let mut line = String::new();
                    let result = match stdin.lock().read_line(&mut line) {
                        Ok(0) => Ok(None),
                        Ok(_) => Ok(Some(line)),
                        Err(e) => Err(e),
                    };
                    if event_tx.send(StdinEvent::Read(result)).is_err() {
                        break;
                    }
                }
                debug!("stdin reader exiting");
            })?;

        Ok(Self {
            requests: request_tx,
            events: event_rx,
            pending: false,
            #[cfg(unix)]
            _interrupts: interrupts,
        })
    }

    fn finish_read(&mut self, result: io::Result<Option<String>>) -> io::Result<ReadOutcome> {
        self.pending = false;
        Ok(match result? {
            Some(line) => ReadOutcome::Line(line),
            None => ReadOutcome::EndOfInput,
        })
    }
}

fn reader_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "stdin reader thread is gone")
}

impl LineSource for StdinLines {
    fn read_line(&mut self) -> io::Result<ReadOutcome> {
        // Anything that arrived between reads: a late answer is returned,
        // a Ctrl+C pressed while nobody was reading is dropped.
        loop {
            match self.events.try_recv() {
                Ok(StdinEvent::Read(result)) => return self.finish_read(result),
                Ok(StdinEvent::Interrupt) => debug!("Dropping Ctrl+C received outside a read"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(reader_gone()),
            }
        }

        if !self.pending {
            self.requests.send(()).map_err(|_| reader_gone())?;
            self.pending = true;
        }

        match self.events.recv().map_err(|_| reader_gone())? {
            StdinEvent::Read(result) => self.finish_read(result),
            // The read stays pending; its line is picked up next time.
            StdinEvent::Interrupt => Ok(ReadOutcome::Interrupted),
        }
    }
}

/// Turns SIGINT into an `Interrupt` event instead of terminating.
#[cfg(unix)]
struct InterruptListener {
    handle: signal_hook::iterator::Handle,
    thread: Option<thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl InterruptListener {
    fn install(events: Sender<StdinEvent>) -> io::Result<Self> {
        use signal_hook::consts::SIGINT;
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT])?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("sigint-listener".into())
            .spawn(move || {
                for _ in signals.forever() {
                    if events.send(StdinEvent::Interrupt).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for InterruptListener {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("SIGINT listener thread panicked");
            }
        }
    }
}

// ============================================================================
// Scripted
// ============================================================================

/// Replays a fixed sequence of outcomes, then reports end of input forever.
#[derive(Debug, Default, Clone)]
pub struct ScriptedLines {
    outcomes: VecDeque<ReadOutcome>,
}

impl ScriptedLines {
    pub fn new(outcomes: impl IntoIterator<Item = ReadOutcome>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
        }
    }

    /// One `Line` per line of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(|line| ReadOutcome::Line(format!("{line}\n"))))
    }

    /// Commands from a file, one per line.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    pub fn remaining(&self) -> usize {
        self.outcomes.len()
    }
}

impl LineSource for ScriptedLines {
    fn read_line(&mut self) -> io::Result<ReadOutcome> {
        Ok(self.outcomes.pop_front().unwrap_or(ReadOutcome::EndOfInput))
    }
}
