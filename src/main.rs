use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fixturegen::config::expand_path;
use fixturegen::logger::{error, info, init};
use fixturegen::{Generator, GeneratorConfig};

#[derive(Parser, Debug)]
#[command(name = "fixturegen", version)]
#[command(about = "Generate SQLite fixture databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a new database to <working-dir>/build
    Generate {
        /// Directory holding tmp/ and build/ (default: current directory)
        #[arg(long)]
        working_dir: Option<PathBuf>,

        /// YAML file with names, tags and row counts
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override desired_user_entries
        #[arg(long)]
        users: Option<usize>,

        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Also append log lines to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

fn generate(
    working_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    users: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let working_dir = match working_dir {
        Some(dir) => expand_path(&dir).ok_or_else(|| anyhow::anyhow!("cannot expand file path"))?,
        None => std::env::current_dir().context("failed to read current directory")?,
    };

    let (mut cfg, source) = GeneratorConfig::load(config.as_deref(), &working_dir)?;
    match source {
        Some(path) => info(&format!("using config {}", path.display())),
        None => info("using built-in config"),
    }
    if let Some(users) = users {
        cfg.desired_user_entries = users;
    }
    if seed.is_some() {
        cfg.seed = seed;
    }

    let mut generator = Generator::new(cfg)?;
    let destination = generator.execute(&working_dir)?;
    println!("{}", destination.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate {
            working_dir,
            config,
            users,
            seed,
            log_file,
        } => {
            if let Some(path) = log_file {
                if let Err(err) = init(&path) {
                    eprintln!("failed to open log file {}: {err}", path.display());
                }
            }
            generate(working_dir, config, users, seed)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error(&format!("fatal error: {err:?}"));
            ExitCode::FAILURE
        }
    }
}
