use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage;

pub mod commands;

use self::commands::{AddArgs, ListArgs, ResetArgs, ServeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "todompa",
    version,
    about = "Server-rendered todo list for htmx clients"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over TODOMPA_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over TODOMPA_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the web application (default)
    Serve(ServeArgs),
    /// Add a todo from the command line
    Add(AddArgs),
    /// Print todos, optionally filtered
    List(ListArgs),
    /// Delete every todo and restart numbering
    Reset(ResetArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let loader = ConfigLoader::discover()?;
    let config = loader.load_or_init()?;
    let storage = storage::init(&config.storage)?;

    let command = cli.command.unwrap_or(Commands::Serve(ServeArgs::default()));
    match command {
        Commands::Serve(args) => {
            let bind: SocketAddr = args.bind.unwrap_or(config.server.bind_address);
            commands::serve(storage, bind)
        }
        Commands::Add(args) => commands::add_todo(&storage, args),
        Commands::List(args) => commands::list_todos(&storage, args),
        Commands::Reset(args) => commands::reset_todos(&storage, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
