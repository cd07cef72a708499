#![warn(clippy::pedantic)]

pub mod settings;
pub mod shell;

use anyhow::Result as AnyResult;
use std::io::{BufRead, Write};

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    let settings = settings::Settings::get();
    let composer = composer_core::composer::Composer::new(settings.export_writer());
    let mut shell = shell::Shell::new(composer);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // A single optional arg, the folder to open at startup.
    // Paths are OSStrings, let the system handle character encoding restrictions.
    if let Some(folder) = std::env::args_os().nth(1) {
        let folder = std::path::PathBuf::from(folder);
        if let Err(e) = shell.execute(shell::Command::Open(folder.clone()), &mut out) {
            log::error!("failed to open folder {folder:?}: {e:#}");
            writeln!(out, "! {e}")?;
        }
    }

    let prompt = |out: &mut std::io::StdoutLock| -> std::io::Result<()> {
        if has_term {
            write!(out, "> ")?;
            out.flush()?;
        }
        Ok(())
    };

    prompt(&mut out)?;
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            prompt(&mut out)?;
            continue;
        }
        let result = line
            .parse::<shell::Command>()
            .map_err(anyhow::Error::from)
            .and_then(|command| Ok(shell.execute(command, &mut out)?));
        match result {
            Ok(shell::Flow::Quit) => break,
            Ok(shell::Flow::Continue) => (),
            // Nothing a user types is fatal.
            Err(e) => {
                log::warn!("{line:?} failed: {e:#}");
                writeln!(out, "! {e:#}")?;
            }
        }
        prompt(&mut out)?;
    }
    Ok(())
}
