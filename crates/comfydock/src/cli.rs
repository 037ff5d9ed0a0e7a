use crate::backend::LocalBackend;
use crate::commands::{self, CommandContext};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

/// ComfyDock CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new ComfyUI environment
    Create {
        /// Environment name
        #[arg(long)]
        name: Option<String>,

        /// Docker image to create the environment from
        #[arg(long)]
        image: Option<String>,

        /// ComfyUI release to target when no image is given
        #[arg(long)]
        release: Option<String>,

        /// Local ComfyUI installation path
        #[arg(long, value_name = "PATH")]
        comfyui_path: Option<String>,

        /// Host port for the ComfyUI server
        #[arg(long)]
        port: Option<u16>,

        /// Mount preset, e.g. Default, Default+Workflows, Isolated
        #[arg(long, value_name = "TYPE")]
        environment_type: Option<String>,

        /// Startup command override
        #[arg(long)]
        command: Option<String>,

        /// Folder to assign the new environment to
        #[arg(long, value_name = "ID")]
        folder: Option<String>,
    },

    /// Duplicate an existing environment
    Duplicate {
        /// Id of the environment to duplicate
        id: String,

        /// Name for the copy (defaults to "<source>-copy")
        #[arg(long)]
        name: Option<String>,

        /// Mount preset, e.g. Auto, Default, Isolated
        #[arg(long, value_name = "TYPE")]
        environment_type: Option<String>,

        /// Host port for the ComfyUI server
        #[arg(long)]
        port: Option<u16>,

        /// Folder to assign the copy to
        #[arg(long, value_name = "ID")]
        folder: Option<String>,
    },

    /// Delete an environment (restorable up to the retention limit)
    Delete {
        /// Id of the environment to delete
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Restore a deleted environment
    Restore {
        /// Id of the environment to restore
        id: String,
    },

    /// List environments
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Show deleted environments still within the retention window
        #[arg(long)]
        deleted: bool,
    },

    /// List available ComfyUI releases
    Releases {
        /// Discard any cached release list and fetch a fresh one
        #[arg(long)]
        refresh: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change user settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
}

/// Settings subcommands
#[derive(Debug, Subcommand)]
pub enum SettingsCommands {
    /// Print the current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update one or more settings
    Set {
        /// Default local ComfyUI installation path
        #[arg(long, value_name = "PATH")]
        comfyui_path: Option<String>,

        /// Default host port
        #[arg(long)]
        port: Option<u16>,

        /// Default container runtime, e.g. nvidia or none
        #[arg(long)]
        runtime: Option<String>,

        /// Default startup command
        #[arg(long)]
        command: Option<String>,

        /// How many deleted environments to keep for restore
        #[arg(long)]
        max_deleted_environments: Option<u32>,

        /// Add a folder with the given name (can be repeated)
        #[arg(long, value_name = "NAME")]
        add_folder: Vec<String>,

        /// Remove the folder with the given id (can be repeated)
        #[arg(long, value_name = "ID")]
        remove_folder: Vec<String>,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version,
    about = "ComfyUI environment manager",
    long_about = "ComfyUI environment manager\n\nCreates and duplicates Docker-based ComfyUI environments with configurable directory mounts.",
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    /// Log format (text or json, defaults to text, can be set via COMFYDOCK_LOG_FORMAT env var)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Data directory for environment records and settings
    #[arg(long, global = true, value_name = "PATH", env = "COMFYDOCK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to the container runtime executable
    #[arg(long, global = true, default_value = "docker")]
    pub runtime_path: String,

    /// Never prompt; pull missing images automatically and skip the ComfyUI
    /// install step
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .context("Cannot determine home directory; pass --data-dir")?;
        Ok(PathBuf::from(home).join(".comfydock"))
    }

    /// Initialize logging from the global options, build the local backend,
    /// and execute the selected subcommand.
    pub async fn dispatch(self) -> Result<()> {
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None, // Let logging module check environment variable
        };

        let log_level = match self.log_level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        comfydock_core::logging::init_with_level(
            log_format,
            Some(&format!(
                "comfydock={},comfydock_core={}",
                log_level, log_level
            )),
        )?;
        tracing::debug!("CLI initialized with log level: {}", log_level);

        let data_dir = self.resolve_data_dir()?;
        tracing::debug!("Using data directory: {:?}", data_dir);
        let ctx = CommandContext {
            backend: LocalBackend::new(data_dir, self.runtime_path),
            non_interactive: self.non_interactive,
        };

        match self.command {
            Some(Commands::Create {
                name,
                image,
                release,
                comfyui_path,
                port,
                environment_type,
                command,
                folder,
            }) => {
                commands::create::execute(
                    ctx,
                    commands::create::CreateArgs {
                        name,
                        image,
                        release,
                        comfyui_path,
                        port,
                        environment_type,
                        command,
                        folder,
                    },
                )
                .await
            }
            Some(Commands::Duplicate {
                id,
                name,
                environment_type,
                port,
                folder,
            }) => {
                commands::duplicate::execute(
                    ctx,
                    commands::duplicate::DuplicateArgs {
                        id,
                        name,
                        environment_type,
                        port,
                        folder,
                    },
                )
                .await
            }
            Some(Commands::Delete { id, yes }) => commands::delete::execute(ctx, id, yes).await,
            Some(Commands::Restore { id }) => commands::restore::execute(ctx, id).await,
            Some(Commands::List { json, deleted }) => {
                commands::list::execute(ctx, json, deleted).await
            }
            Some(Commands::Releases { refresh, json }) => {
                commands::releases::execute(ctx, refresh, json).await
            }
            Some(Commands::Settings { action }) => commands::settings::execute(ctx, action).await,
            None => {
                println!("ComfyDock - ComfyUI environment manager");
                println!("Run 'comfydock --help' for usage information.");
                Ok(())
            }
        }
    }
}
