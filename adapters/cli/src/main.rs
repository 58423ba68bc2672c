#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the Medusa Tower through text input.

mod config;
mod render;
mod session;

use std::{
    fs,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use medusa_tower_persistence::SaveCodec;
use medusa_tower_world::query;

use config::Config;
use session::{Input, Session};

#[derive(Parser, Debug)]
#[command(name = "medusa-tower")]
#[command(about = "Climb the Medusa Tower from the terminal")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save file location
    #[arg(long)]
    save: Option<PathBuf>,

    /// Do not write the save file after each line
    #[arg(long)]
    no_autosave: bool,

    /// Log filter passed to env_logger
    #[arg(long)]
    log_level: Option<String>,

    /// Simulated milliseconds advanced per line
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Read input lines from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,
}

impl Cli {
    fn merge(self, mut config: Config) -> Config {
        if let Some(save) = self.save {
            config.save_path = save;
        }
        if self.no_autosave {
            config.autosave = false;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if self.script.is_some() {
            config.script = self.script;
        }
        config
    }
}

fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    let _ = builder.parse_filters(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        let _ = builder.parse_filters(&filters);
    }
    builder.init();
}

fn load_save(session: &mut Session, path: &Path) -> Result<()> {
    if !path.exists() {
        log::info!("no save at {}, starting fresh", path.display());
        return Ok(());
    }
    let line = fs::read_to_string(path)
        .with_context(|| format!("failed to read save file {}", path.display()))?;
    let _ = session.restore(SaveCodec::decode_or_fresh(&line));
    log::info!("restored save from {}", path.display());
    Ok(())
}

fn write_save(session: &Session, path: &Path) -> Result<()> {
    if let Some(line) = session.save_line()? {
        fs::write(path, line)
            .with_context(|| format!("failed to write save file {}", path.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let config = cli.merge(config);
    init_logging(&config.log_level);

    let mut session = Session::new(Duration::from_millis(config.tick_ms));
    load_save(&mut session, &config.save_path)?;

    let reader: Box<dyn BufRead> = match &config.script {
        Some(path) => Box::new(BufReader::new(
            fs::File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    println!("{}", query::welcome_banner(session.world()));
    print!("{}", render::floor(session.world()));

    for line in reader.lines() {
        let line = line.context("failed to read input line")?;
        let input = match Input::parse(&line) {
            Ok(input) => input,
            Err(error) => {
                println!("? {error}");
                continue;
            }
        };
        if input == Input::Quit {
            break;
        }

        let events = session.handle(input);
        for event in &events {
            log::debug!("{event:?}");
        }
        print!("{}", render::floor(session.world()));

        if config.autosave {
            write_save(&session, &config.save_path)?;
        }
    }

    if config.autosave {
        write_save(&session, &config.save_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let cli = Cli::parse_from([
            "medusa-tower",
            "--save",
            "other.save",
            "--no-autosave",
            "--tick-ms",
            "40",
        ]);
        let file = Config {
            log_level: "debug".to_owned(),
            ..Config::default()
        };
        let merged = cli.merge(file);
        assert_eq!(merged.save_path, PathBuf::from("other.save"));
        assert!(!merged.autosave);
        assert_eq!(merged.tick_ms, 40);
        assert_eq!(merged.log_level, "debug");
        assert_eq!(merged.script, None);
    }
}
