// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use hlscache::Config;

mod cli;
use cli::{
    CacheCommand, CommandContext, ConfigCommand, HistoryCommand, KeyCommand, OutputFormat,
    ProcessCommand,
};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "hlscache")]
#[command(about = "Rewrite, repair and cache remote HLS playlists for local playback")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (hlscache_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a playlist URL and print the URI to hand to the player
    Process {
        url: String,
        /// Fail instead of falling back to the remote URL
        #[arg(long)]
        strict: bool,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the cache key derived from a playlist URL
    Key { url: String },

    /// Remove cached playlists older than the retention window
    Cleanup,

    /// Manage cached playlists
    #[command(subcommand)]
    Cache(CacheSubcommand),

    /// Inspect and edit watch history
    #[command(subcommand)]
    History(HistorySubcommand),

    /// Show or create the config file
    #[command(subcommand)]
    Config(ConfigSubcommand),
}

#[derive(Subcommand)]
enum CacheSubcommand {
    /// List cached playlists, newest first
    List {
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Remove every cached playlist
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the cache directory
    Path,
}

#[derive(Subcommand)]
enum HistorySubcommand {
    /// List watched titles, most recent first
    List {
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show saved progress for a title
    Show { title: String },
    /// Save playback progress for a title
    Record {
        title: String,
        /// Playback position in seconds
        #[arg(long)]
        position: f64,
        /// Total duration in seconds
        #[arg(long)]
        duration: f64,
        #[arg(long)]
        episode: Option<String>,
        #[arg(long)]
        server: Option<String>,
    },
    /// Forget a title
    Remove { title: String },
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to disk
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.debug_log {
        let file = File::create("hlscache_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("hlscache=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }

    // Load configuration
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    let context = CommandContext::new(config, config_path);

    match cli.command {
        Commands::Process {
            url,
            strict,
            format,
        } => {
            let cmd = ProcessCommand {
                url,
                strict,
                format: OutputFormat::from_str(&format)?,
            };
            cmd.execute(context).await?;
        }

        Commands::Key { url } => KeyCommand { url }.execute(context)?,

        Commands::Cleanup => CacheCommand::Cleanup.execute(context).await?,

        Commands::Cache(cache_cmd) => {
            let cmd = match cache_cmd {
                CacheSubcommand::List { format } => CacheCommand::List {
                    format: OutputFormat::from_str(&format)?,
                },
                CacheSubcommand::Clear { yes } => CacheCommand::Clear { yes },
                CacheSubcommand::Path => CacheCommand::Path,
            };
            cmd.execute(context).await?;
        }

        Commands::History(history_cmd) => {
            let cmd = match history_cmd {
                HistorySubcommand::List { format } => HistoryCommand::List {
                    format: OutputFormat::from_str(&format)?,
                },
                HistorySubcommand::Show { title } => HistoryCommand::Show { title },
                HistorySubcommand::Record {
                    title,
                    position,
                    duration,
                    episode,
                    server,
                } => HistoryCommand::Record {
                    title,
                    position_secs: position,
                    duration_secs: duration,
                    episode,
                    server,
                },
                HistorySubcommand::Remove { title } => HistoryCommand::Remove { title },
            };
            cmd.execute(context)?;
        }

        Commands::Config(config_cmd) => {
            let cmd = match config_cmd {
                ConfigSubcommand::Show => ConfigCommand::Show,
                ConfigSubcommand::Init { force } => ConfigCommand::Init { force },
            };
            cmd.execute(context)?;
        }
    }

    Ok(())
}
