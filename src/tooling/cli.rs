//! CLI Tooling
//!
//! Command-line interface for codepack. Every command runs against one
//! workspace: its configuration and its artifact store.

use crate::collaborator::LocalFs;
use crate::concat::ConcatenatedArtifact;
use crate::config::{CodepackConfig, ConfigLoader};
use crate::error::{ApiError, StorageError};
use crate::logging::{LogFormat, LogOutput, LoggingConfig};
use crate::session::PackSession;
use crate::store::{ArtifactKey, StorageRecord, TieredStore};
use crate::tooling::format::{format_pack_summary, format_store_status_text, format_tree_text};
use crate::tree::DirectoryTreeBuilder;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::info;

/// codepack - select files from a tree and pack them into one text artifact
#[derive(Parser)]
#[command(name = "codepack")]
#[command(about = "Select files from a directory tree and pack them into one text artifact")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply logging flags on top of the configured settings.
    pub fn logging_config(&self, base: &LoggingConfig) -> Result<LoggingConfig, ApiError> {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
            config.output = LogOutput::Stderr;
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.parse::<LogFormat>()?;
        }
        if let Some(output) = &self.log_output {
            config.output = output.parse::<LogOutput>()?;
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        Ok(config)
    }
}

/// Output format for commands with a machine-readable form
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Acquire a directory tree and print it
    Tree {
        /// Root directory
        root: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Select files, concatenate them and store the artifact
    Pack {
        /// Root directory
        root: PathBuf,
        /// Node to toggle, relative to the root (repeatable; default: the root)
        #[arg(long = "select", short = 's')]
        select: Vec<PathBuf>,
        /// Write the artifact to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Do not persist the artifact
        #[arg(long)]
        no_store: bool,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Inspect or modify the artifact store
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum StoreCommands {
    /// Print a stored value
    Get { key: String },
    /// Store a value read from a file or stdin
    Put {
        key: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List stored keys with tier and size
    Status {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Remove every stored value
    Reset,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}

/// Resolved workspace, configuration and store for one invocation.
pub struct CliContext {
    workspace_root: PathBuf,
    config: CodepackConfig,
    store: Arc<TieredStore>,
}

impl CliContext {
    /// Load configuration for `workspace_root` and open its store.
    pub fn load(workspace_root: PathBuf, config_path: Option<&Path>) -> Result<Self, ApiError> {
        let config = ConfigLoader::resolve(&workspace_root, config_path)?;
        Self::new(workspace_root, config)
    }

    pub fn new(workspace_root: PathBuf, config: CodepackConfig) -> Result<Self, ApiError> {
        let store_path = config.storage.resolve_store_path(&workspace_root)?;
        let store = TieredStore::open(&store_path, config.storage.fast_tier_threshold_bytes)?;
        Ok(Self {
            workspace_root,
            config,
            store: Arc::new(store),
        })
    }

    pub fn config(&self) -> &CodepackConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn store(&self) -> &Arc<TieredStore> {
        &self.store
    }

    fn local_fs(&self) -> Arc<LocalFs> {
        Arc::new(LocalFs::new().follow_symlinks(self.config.tree.follow_symlinks))
    }

    /// Run `command` and return what should be printed.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::Tree { root, format } => self.handle_tree(root, *format).await,
            Commands::Pack {
                root,
                select,
                output,
                no_store,
                format,
            } => {
                self.handle_pack(root, select, output.as_deref(), *no_store, *format)
                    .await
            }
            Commands::Store { command } => self.handle_store(command).await,
            Commands::Config {
                command: ConfigCommands::Show,
            } => self.config.to_toml(),
        };
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn handle_tree(&self, root: &Path, format: OutputFormat) -> Result<String, ApiError> {
        let root = self.resolve_root(root)?;
        let built = DirectoryTreeBuilder::new(self.local_fs())
            .with_config(self.config.builder_config())
            .build(&root)
            .await?;

        match format {
            OutputFormat::Text => Ok(format_tree_text(&built.tree, &built.failures)),
            OutputFormat::Json => to_json(&json!({
                "root": built.tree.root(),
                "stats": built.tree.stats(),
                "failures": built.failures,
            })),
        }
    }

    async fn handle_pack(
        &self,
        root: &Path,
        select: &[PathBuf],
        output: Option<&Path>,
        no_store: bool,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let root = self.resolve_root(root)?;
        let session = PackSession::with_options(
            self.local_fs(),
            Arc::clone(&self.store),
            self.config.session_options(),
        );
        session.load_root(&root).await?;

        if select.is_empty() {
            session.toggle(&root).await?;
        }
        for path in select {
            session.toggle(&resolve_selection(&root, path)).await?;
        }

        let artifact = session.concatenate().await?;
        let record = if no_store {
            None
        } else {
            Some(session.persist_artifact(&artifact).await?)
        };

        let rendered = match format {
            OutputFormat::Text => artifact.render(),
            OutputFormat::Json => to_json(&PackOutput {
                artifact: &artifact,
                text: artifact.render(),
                stored: record.as_ref(),
            })?,
        };

        match output {
            Some(path) => {
                tokio::fs::write(path, rendered.as_bytes())
                    .await
                    .map_err(StorageError::from)?;
                Ok(format_pack_summary(&artifact, record.as_ref(), path))
            }
            None => Ok(rendered),
        }
    }

    async fn handle_store(&self, command: &StoreCommands) -> Result<String, ApiError> {
        match command {
            StoreCommands::Get { key } => match self.store.get(key).await? {
                Some(value) => Ok(value),
                None => Err(ApiError::KeyNotFound(key.clone())),
            },
            StoreCommands::Put { key, file } => {
                let value = match file {
                    Some(path) => tokio::fs::read_to_string(path)
                        .await
                        .map_err(StorageError::from)?,
                    None => {
                        let mut buf = String::new();
                        tokio::io::stdin()
                            .read_to_string(&mut buf)
                            .await
                            .map_err(StorageError::from)?;
                        buf
                    }
                };
                let record = self.store.put(key, &value).await?;
                Ok(format!(
                    "Stored {} ({} bytes, {} tier)",
                    record.key,
                    record.size_bytes,
                    record.tier.as_str()
                ))
            }
            StoreCommands::Status { format } => {
                let records = self.store.records().await?;
                match format {
                    OutputFormat::Text => {
                        Ok(format_store_status_text(&records, self.store.threshold()))
                    }
                    OutputFormat::Json => to_json(&json!({
                        "threshold_bytes": self.store.threshold(),
                        "records": records,
                        "known_keys": ArtifactKey::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
                    })),
                }
            }
            StoreCommands::Reset => {
                let removed = self.store.clear().await?;
                Ok(format!("Removed {} stored value(s)", removed))
            }
        }
    }

    /// Relative roots resolve against the workspace.
    fn resolve_root(&self, root: &Path) -> Result<PathBuf, ApiError> {
        let joined = self.workspace_root.join(root);
        dunce::canonicalize(&joined).map_err(|e| ApiError::DirectoryUnreadable {
            path: joined,
            reason: e.to_string(),
        })
    }
}

#[derive(Serialize)]
struct PackOutput<'a> {
    artifact: &'a ConcatenatedArtifact,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stored: Option<&'a StorageRecord>,
}

/// Selections are relative to the tree root unless absolute.
pub fn resolve_selection(root: &Path, selection: &Path) -> PathBuf {
    if selection.as_os_str().is_empty() || selection == Path::new(".") {
        return root.to_path_buf();
    }
    let joined = root.join(selection);
    dunce::canonicalize(&joined).unwrap_or(joined)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::StorageError(StorageError::Encoding(e.to_string())))
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Tree { .. } => "tree",
        Commands::Pack { .. } => "pack",
        Commands::Store { command } => match command {
            StoreCommands::Get { .. } => "store get",
            StoreCommands::Put { .. } => "store put",
            StoreCommands::Status { .. } => "store status",
            StoreCommands::Reset => "store reset",
        },
        Commands::Config { .. } => "config show",
    }
}
