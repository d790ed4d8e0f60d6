use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use artifact_linker::config::{LinkerConfig, config_path, log_path};
use artifact_linker::engine::Catalog;
use artifact_linker::logging::{LogTarget, init_logging};
use artifact_linker::storage::DropboxBackend;

#[derive(Parser)]
#[command(name = "artifact-linker")]
#[command(version, about = "Resolve release archives to shared download links")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/artifact-linker/config.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage access token, overriding the config file
    #[arg(long, global = true, env = "DROPBOX_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    log_stderr: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available architectures
    Arches,
    /// List software published for an architecture
    Software { arch: String },
    /// List version channels
    Channels,
    /// List tags available for a software and version channel
    Targets {
        arch: String,
        software: String,
        version: String,
    },
    /// Print the share link for a target (use "latest" for the newest build)
    Link {
        arch: String,
        software: String,
        version: String,
        tag: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = cli.config.unwrap_or_else(config_path);
    let mut config = LinkerConfig::load(&path)?;
    if let Some(token) = cli.token {
        config.storage.access_token = token;
    }

    let log_file = log_path();
    let target = if cli.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::File(&log_file)
    };
    let _guard = init_logging(&config.logging, target)?;
    info!("Loaded configuration from {:?}", path);

    let storage = &config.storage;
    let backend = DropboxBackend::new(&storage.api_base_url, &storage.access_token)
        .context("failed to create storage client")?;
    let catalog = Catalog::new(Arc::new(backend), &config);

    let output = match cli.command {
        Command::Arches => serde_json::to_string_pretty(&catalog.list_architectures().await)?,
        Command::Software { arch } => {
            serde_json::to_string_pretty(&catalog.list_software(&arch).await)?
        }
        Command::Channels => serde_json::to_string_pretty(&catalog.list_version_channels())?,
        Command::Targets {
            arch,
            software,
            version,
        } => {
            let targets = catalog.list_targets(&arch, &software, &version).await;
            serde_json::to_string_pretty(&targets)?
        }
        Command::Link {
            arch,
            software,
            version,
            tag,
        } => catalog.resolve_link(&arch, &software, &version, &tag).await?,
    };

    println!("{}", output);
    Ok(())
}
