//! Overlay Library - browse, install, and publish content packs

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use library_core::config::LibraryConfig;

mod author_cli;
mod catalog_cli;
mod pack_cli;
mod runtime;

use runtime::Runtime;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "overlay-library",
    about = "Install and distribute glossary content packs",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Structured JSON logs with full engine tracing
    #[clap(long, global = true)]
    trace: bool,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Tenant to operate on (overrides tenant_id in the config file)
    #[clap(long, global = true)]
    tenant: Option<String>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Browse the pack catalog
    Catalog {
        #[clap(subcommand)]
        command: catalog_cli::CatalogCommand,
    },

    /// Compare a pack with the tenant's glossary without changing anything
    Analyze {
        /// Pack id
        pack: String,

        /// Only show rows matching this text
        #[clap(long)]
        filter: Option<String>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Install a pack into the tenant's glossary
    Install {
        #[clap(flatten)]
        args: pack_cli::InstallArgs,
    },

    /// Remove every entry a pack installed
    Uninstall {
        /// Pack id
        pack: String,

        /// Skip the confirmation prompt
        #[clap(long, short)]
        yes: bool,
    },

    /// List installed packs and their status
    Installed {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List installed packs that differ from the catalog
    Outdated {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Build and distribute libraries from the tenant's own content
    Author {
        #[clap(subcommand)]
        command: author_cli::AuthorCommand,
    },

    /// Manage the configuration file
    Config {
        #[clap(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Parser, Debug)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a configuration file with defaults
    Init {
        /// Overwrite an existing file
        #[clap(long)]
        force: bool,
    },
}

fn initialize_tracing(log_level: &LogLevel, trace: bool) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    if trace {
        if let Ok(directive) = "library_core=trace".parse() {
            filter = filter.add_directive(directive);
        }

        // JSON output for structured tracing, on stderr
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();

        tracing::info!("Library engine tracing enabled");
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.trace);

    let config_path = match cli.config {
        Some(path) => path,
        None => LibraryConfig::default_config_path()?,
    };

    let tenant = cli.tenant;
    let runtime = || Runtime::load(&config_path, tenant.clone());

    match cli.command {
        Command::Catalog { command } => command.execute(&runtime()?).await,
        Command::Analyze { pack, filter, json } => {
            pack_cli::analyze_command(&runtime()?, &pack, filter.as_deref(), json).await
        }
        Command::Install { args } => pack_cli::install_command(&runtime()?, args).await,
        Command::Uninstall { pack, yes } => {
            pack_cli::uninstall_command(&runtime()?, &pack, yes).await
        }
        Command::Installed { json } => pack_cli::installed_command(&runtime()?, json).await,
        Command::Outdated { json } => pack_cli::outdated_command(&runtime()?, json).await,
        Command::Author { command } => command.execute(&runtime()?).await,
        Command::Config { command } => config_command(command, &config_path, tenant.clone()),
    }
}

fn config_command(command: ConfigCommand, path: &Path, tenant: Option<String>) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let mut config = LibraryConfig::load_from_path(path)?;
            if tenant.is_some() {
                config.tenant_id = tenant;
            }

            println!("# {}", path.display());
            print!(
                "{}",
                serde_yaml_ng::to_string(&config).context("Failed to render config")?
            );
            println!("# ledger_dir resolves to {}", config.resolved_ledger_dir()?.display());
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config already exists at {}. Use --force to overwrite",
                    path.display()
                );
            }

            let config = LibraryConfig {
                tenant_id: tenant,
                ..Default::default()
            };
            config.save_to_path(path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
