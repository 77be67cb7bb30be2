//! Tramline simulator
//!
//! Replays navigation scripts against an in-memory browser and prints what
//! the router wrote to history.

mod script;
mod session;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use tramline_core::{parse_url, RouterConfig};

use crate::script::parse_script;
use crate::session::{Session, SessionOptions};

#[derive(Debug, Parser)]
#[command(name = "tramline-sim")]
#[command(about = "Replay navigation scripts against an in-memory browser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a navigation script and print the session report as JSON.
    Run {
        /// Script file, or `-` for stdin.
        script: PathBuf,

        /// URL the browser starts at.
        #[arg(long, default_value = "http://localhost/")]
        start: String,

        /// Route the store holds at startup (defaults to the start URL's path).
        #[arg(long)]
        server_route: Option<String>,

        /// Router configuration file (JSON).
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Simulate a browser without pushState.
        #[arg(long)]
        legacy: bool,

        /// Named route, repeatable.
        #[arg(long = "route", value_name = "NAME=PATTERN")]
        routes: Vec<String>,
    },

    /// Parse a URL and print its parts as JSON.
    Parse {
        url: String,
    },
}

fn parse_route(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((name, pattern)) if !name.is_empty() => Ok((name.to_string(), pattern.to_string())),
        _ => bail!("invalid route '{}', expected NAME=PATTERN", arg),
    }
}

fn read_script(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            script,
            start,
            server_route,
            config,
            legacy,
            routes,
        } => {
            let config = match config {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading config {}", path.display()))?;
                    RouterConfig::from_json(&json)?
                }
                None => RouterConfig::default(),
            };
            tracing::debug!("loaded config: {:?}", config);

            let steps = parse_script(&read_script(&script)?)?;
            let options = SessionOptions {
                start_url: start,
                server_route,
                legacy,
                routes: routes
                    .iter()
                    .map(|arg| parse_route(arg))
                    .collect::<Result<_>>()?,
                config,
            };

            let report = Session::new(options)?.run(&steps)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Parse { url } => {
            let parsed = parse_url(url.as_str()).context("url could not be parsed")?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
    }

    Ok(())
}

fn main() {
    tramline_core::init_logging();

    if let Err(err) = run() {
        eprintln!("tramline-sim error: {:#}", err);
        std::process::exit(1);
    }
}
