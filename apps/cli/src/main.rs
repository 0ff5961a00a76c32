#![deny(warnings)]

//! Terminal front-end for Baker: restores or starts a game, then runs the
//! weekly decision loop on stdin/stdout.

mod repl;
mod view;

use anyhow::Result;
use baker_core::GameConfig;
use baker_econ::SeededCustomers;
use baker_runtime::Session;
use persistence::{FileStore, SnapshotStore};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    save: Option<PathBuf>,
    seed: Option<u64>,
    weeks: Option<u32>,
    reset: bool,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--save" => args.save = it.next().map(PathBuf::from),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--weeks" => args.weeks = it.next().and_then(|s| s.parse().ok()),
            "--reset" => args.reset = true,
            "--version" | "-V" => args.version = true,
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    // Logging setup; stdout is reserved for the game itself.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = parse_args();
    if args.version {
        println!(
            "baker {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(?args, "starting CLI");

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let mut store = match &args.save {
        Some(path) => FileStore::new(path),
        None => FileStore::default(),
    };
    info!(path = %store.path().display(), "save slot");
    if args.reset {
        store.clear()?;
    }
    let customers = match args.seed {
        Some(seed) => SeededCustomers::new(seed),
        None => SeededCustomers::from_entropy(),
    };
    let mut session = Session::open(&config, store, customers)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.weeks {
        Some(weeks) => {
            let mut cursor = 0;
            for _ in 0..weeks {
                session.skip_week()?;
            }
            repl::flush_messages(&session, &mut out, &mut cursor)?;
            write!(out, "{}", view::render_status(session.state()))?;
        }
        None => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            repl::run(&mut session, &mut input, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}
