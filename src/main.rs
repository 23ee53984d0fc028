//! tern - a slim terminal emulator
//!
//! The binary runs a session headless: it spawns the child on a PTY, keeps
//! the screen model current, and exits with the child's status. Window
//! backends embed `app::Session` with a real `Surface` instead.

mod app;
mod config;
mod headless;

use anyhow::Context;
use clap::Parser;

use app::Session;
use config::Config;
use headless::HeadlessSurface;
use tern_core::pty::PtyConfig;
use tern_core::term::Terminal;

/// A slim terminal emulator
#[derive(Parser, Debug)]
#[command(name = "tern", version, about)]
struct Cli {
    /// Command to run instead of the default shell
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::default();

    let status = match run(cli, config) {
        Ok(status) => status,
        Err(err) => {
            eprintln!("tern: {err:#}");
            1
        }
    };
    std::process::exit(status);
}

fn run(cli: Cli, config: Config) -> anyhow::Result<i32> {
    let pty_config = PtyConfig {
        command: cli.command,
        term: config.term.clone(),
        ..Default::default()
    };

    let term = Terminal::with_child(config.cols, config.rows, &pty_config)
        .context("failed to start child process")?;
    log::debug!("started {}x{} session", config.cols, config.rows);

    let surface = HeadlessSurface::new(config.metrics);
    let session = Session::new(term, surface, config.scroll_lines);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    // The window collaborator would feed this channel; the headless binary
    // keeps it open but never sends.
    let (_events_tx, events_rx) = tokio::sync::mpsc::channel(64);
    runtime.block_on(session.run(events_rx))
}
