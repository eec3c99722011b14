//! A one-room game loop for trying the console from a shell.
//!
//! Command-mode reads on the main thread; timer-mode hands reads to the
//! background input thread and keeps ticking while the player thinks.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tale_console::console::{AsyncConsoleInput, ConsoleError, ConsoleIo, Paragraph};
use tale_console::core::config::ResolvedConfig;
use tale_console::{Player, PlayerSession, StyleTag};

/// How long the timer-mode loop waits for input per tick.
const TICK: Duration = Duration::from_millis(250);
/// Idle ticks between ambient messages in timer-mode (about 30 s).
const AMBIENT_EVERY: u32 = 120;

const ROOM: &str = "You are standing in the <location>Wine Cellar</>. Racks of dusty \
    bottles line the walls, and a single <item>oil lamp</> hangs from a hook in the \
    low ceiling. It flickers. Somewhere behind the racks, water drips. \
    A <exit>narrow staircase</> leads up.";

const HELP: &str = "look     describe the room again\n\
                    styles   show every style tag\n\
                    plain    toggle colored output\n\
                    quit     leave the game";

/// Asks for the player's name before any session exists. Ctrl+C or closed
/// input fall back to a default.
pub fn ask_name(io: &ConsoleIo) -> Result<String, ConsoleError> {
    match io.input(Some("\n<bright>What is your name, adventurer?</> ")) {
        Ok(name) if !name.is_empty() => Ok(name),
        Ok(_) | Err(ConsoleError::Interrupted) | Err(ConsoleError::EndOfInput) => {
            Ok("stranger".to_string())
        }
        Err(e) => Err(e),
    }
}

pub struct Driver {
    io: Arc<ConsoleIo>,
    player: Arc<PlayerSession>,
    config: ResolvedConfig,
    turns: u32,
}

impl Driver {
    pub fn new(io: Arc<ConsoleIo>, player: Arc<PlayerSession>, config: ResolvedConfig) -> Self {
        Self {
            io,
            player,
            config,
            turns: 0,
        }
    }

    /// Renders paragraphs and writes them one paced line at a time.
    fn show(&self, paragraphs: &[Paragraph]) -> Result<(), ConsoleError> {
        let Some(text) = self
            .io
            .render_output(paragraphs, self.config.indent, self.config.width)
        else {
            return Ok(());
        };
        for line in text.lines() {
            self.io.output([line])?;
            self.io.output_delay();
        }
        Ok(())
    }

    fn intro(&self) -> Result<(), ConsoleError> {
        self.show(&[
            Paragraph::formatted(format!(
                "Welcome, <player>{}</>. Type <bright>help</> if you get lost.",
                self.player.name()
            )),
            Paragraph::formatted(ROOM),
        ])
    }

    /// Runs one command. Returns `false` when the game should end.
    fn handle(&mut self, cmd: &str) -> Result<bool, ConsoleError> {
        debug!("Turn {}: {:?}", self.turns, cmd);
        if cmd.is_empty() {
            return Ok(true);
        }
        self.turns += 1;
        match cmd {
            "look" | "l" => self.show(&[Paragraph::formatted(ROOM)])?,
            "help" | "?" => self.show(&[Paragraph::unformatted(HELP)])?,
            "styles" => {
                let lines: Vec<String> = StyleTag::ALL
                    .iter()
                    .map(|tag| format!("{:<10} {}sample text</>", tag.name(), tag.markup()))
                    .collect();
                self.show(&[Paragraph::unformatted(lines.join("\n"))])?;
            }
            "plain" => {
                let styled = !self.io.do_styles();
                self.io.set_do_styles(styled);
                let state = if styled { "<bright>on</>" } else { "off" };
                self.show(&[Paragraph::formatted(format!("Styles are now {state}."))])?;
            }
            "quit" => {
                self.show(&[Paragraph::formatted(format!(
                    "Goodbye, <player>{}</>. You played {} turns.",
                    self.player.name(),
                    self.turns
                ))])?;
                return Ok(false);
            }
            other => self.show(&[Paragraph::formatted(format!(
                "You don't know how to <bright>{other}</>."
            ))])?,
        }
        Ok(true)
    }

    pub fn run_command_mode(&mut self) -> Result<(), ConsoleError> {
        info!("Command-mode session for {}", self.player.name());
        self.intro()?;
        loop {
            let keep_going = self.io.input_line(self.player.as_ref())?;
            for cmd in self.player.get_pending_input() {
                if !self.handle(&cmd)? {
                    return Ok(());
                }
            }
            if !keep_going {
                return Ok(());
            }
            if self.io.at_end_of_input() {
                info!("Input closed, ending session");
                return Ok(());
            }
        }
    }

    pub fn run_timer_mode(&mut self) -> Result<(), ConsoleError> {
        info!("Timer-mode session for {}", self.player.name());
        self.intro()?;
        let input = Arc::clone(&self.io).get_async_input(self.player.clone())?;
        let result = self.timer_loop(&input);
        // The reader's own failure matters less than the loop's.
        let stopped = input.stop();
        result.and(stopped)
    }

    fn timer_loop(&mut self, input: &AsyncConsoleInput) -> Result<(), ConsoleError> {
        let mut idle_ticks = 0u32;
        loop {
            // A read that ended in Ctrl+C disarms the reader without storing
            // anything, so re-arm whenever it is idle.
            if !input.is_enabled() && !input.is_finished() {
                input.enable();
            }
            if self.player.wait_for_input(TICK) {
                idle_ticks = 0;
                for cmd in self.player.get_pending_input() {
                    if !self.handle(&cmd)? {
                        return Ok(());
                    }
                }
                input.wait_idle(Duration::from_secs(1));
                continue;
            }
            if input.is_finished() || self.io.at_end_of_input() {
                info!("Input closed, ending session");
                return Ok(());
            }
            idle_ticks += 1;
            if idle_ticks % AMBIENT_EVERY == 0 {
                self.io
                    .output(["", "  <dim>A cold draught moves through the cellar.</>"])?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::mpsc;
    use std::thread;
    use tale_console::console::{ReadOutcome, ScriptedLines};

    fn quiet_driver(outcomes: Vec<ReadOutcome>) -> Driver {
        let config = ResolvedConfig {
            output_line_delay: 0,
            ..Default::default()
        };
        let io = ConsoleIo::new(
            Box::new(ScriptedLines::new(outcomes)),
            Box::new(io::sink()),
            None,
        );
        io.configure(&config);
        Driver::new(Arc::new(io), Arc::new(PlayerSession::new("julie")), config)
    }

    fn line(text: &str) -> ReadOutcome {
        ReadOutcome::Line(format!("{text}\n"))
    }

    #[test]
    fn test_timer_mode_keeps_reading_after_ctrl_c() {
        let mut driver = quiet_driver(vec![ReadOutcome::Interrupted, line("look"), line("quit")]);
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let result = driver.run_timer_mode();
            let _ = done_tx.send((result, driver.turns));
        });

        let (result, turns) = done_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("timer-mode session did not finish");
        assert!(result.is_ok());
        assert_eq!(turns, 2);
    }

    #[test]
    fn test_timer_mode_ends_when_input_closes() {
        let mut driver = quiet_driver(vec![line("look")]);
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let result = driver.run_timer_mode();
            let _ = done_tx.send((result, driver.turns));
        });

        let (result, turns) = done_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("timer-mode session did not finish");
        assert!(result.is_ok());
        assert_eq!(turns, 1);
    }

    #[test]
    fn test_command_mode_runs_until_quit() {
        let mut driver = quiet_driver(vec![line("help"), line("styles"), line("quit"), line("look")]);
        driver.run_command_mode().unwrap();
        assert_eq!(driver.turns, 3);
        assert!(!driver.io.at_end_of_input());
    }
}
