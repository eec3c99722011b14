mod driver;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use tale_console::console::{ConsoleIo, LineSource, ScriptedLines, StdinLines};
use tale_console::core::config::{self, CliOverrides};
use tale_console::{DriverMode, PlayerSession};

use crate::driver::{Driver, ask_name};

#[derive(Parser)]
#[command(name = "tale-console", about = "Text console for Tale interactive fiction")]
struct Args {
    /// How input is read
    #[arg(short, long, default_value_t, value_enum)]
    mode: DriverMode,

    /// Print plain text, style tags stripped
    #[arg(long)]
    no_styles: bool,

    /// Milliseconds between paced output lines
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Wrap column
    #[arg(long, value_name = "COLS")]
    width: Option<usize>,

    /// Left margin in spaces
    #[arg(long)]
    indent: Option<usize>,

    /// Read commands from a file instead of the keyboard
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Player name (asked for when omitted)
    #[arg(short, long)]
    name: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to tale-console.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("tale-console.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    log::info!("tale-console starting in {:?} mode", args.mode);

    let file_config = config::load_config()?;
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            output_line_delay: args.delay,
            no_styles: args.no_styles,
            width: args.width,
            indent: args.indent,
        },
    );

    let input: Box<dyn LineSource> = match &args.script {
        Some(path) => {
            log::info!("Reading commands from {}", path.display());
            Box::new(ScriptedLines::from_file(path)?)
        }
        None => Box::new(StdinLines::new()?),
    };
    let io = Arc::new(ConsoleIo::for_terminal(&resolved, input)?);

    let name = match args.name {
        Some(name) => name,
        None => ask_name(&io)?,
    };
    let player = Arc::new(PlayerSession::new(name));

    let mut driver = Driver::new(io, player, resolved);
    match args.mode {
        DriverMode::Command => driver.run_command_mode()?,
        DriverMode::Timer => driver.run_timer_mode()?,
    }
    log::info!("tale-console exiting");
    Ok(())
}
