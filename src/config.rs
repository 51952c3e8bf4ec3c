//! Plugin configuration
//!
//! The project root is fixed at startup: it is the parent of the plugin's own
//! directory, and the plugin directory's name is hidden from every listing and read.

use clap::Parser;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default listening port (matches the documented uvicorn invocation)
pub const DEFAULT_PORT: u16 = 3333;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Environment variable consulted when `--port` is not given
pub const PORT_ENV_VAR: &str = "READONLY_PLUGIN_PORT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Plugin directory {path:?} is not accessible: {source}")]
    PluginDir { path: PathBuf, source: io::Error },
    #[error("Project root {path:?} is not accessible: {source}")]
    ProjectRoot { path: PathBuf, source: io::Error },
    #[error("Plugin directory {0:?} has no parent directory")]
    NoParent(PathBuf),
    #[error("Plugin directory {0:?} has no usable directory name")]
    NoName(PathBuf),
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "readonly-plugin",
    version,
    about = "Expose a local project for read-only inspection over HTTP",
    long_about = None,
    after_help = "The project root is the parent of the plugin directory (default: the current directory).\n\
The plugin directory itself is never listed or read."
)]
pub struct Opts {
    #[arg(
        long,
        value_name = "PATH",
        help = "The plugin's own directory. Defaults to the current working directory."
    )]
    pub plugin_dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Project root to expose. Defaults to the parent of the plugin directory."
    )]
    pub project_root: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Directory served under /static. Defaults to the plugin directory."
    )]
    pub static_dir: Option<PathBuf>,
    #[arg(long, value_name = "HOST", help = "Address to bind on.")]
    pub host: Option<String>,
    #[arg(
        short,
        long,
        value_name = "PORT",
        help = "Port to listen on. Falls back to READONLY_PLUGIN_PORT, then 3333."
    )]
    pub port: Option<u16>,
    #[arg(long, help = "Emit logs as JSON lines.")]
    pub log_json: bool,
}

/// Immutable process-wide configuration, shared by every request
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Canonical absolute project root
    pub project_root: PathBuf,
    /// Directory name hidden from listings and reads
    pub exclusion_name: String,
    pub static_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl PluginConfig {
    /// Build a config for an explicit root, canonicalizing it
    pub fn new(
        project_root: &Path,
        exclusion_name: impl Into<String>,
        static_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let project_root =
            project_root
                .canonicalize()
                .map_err(|source| ConfigError::ProjectRoot {
                    path: project_root.to_path_buf(),
                    source,
                })?;

        Ok(Self {
            project_root,
            exclusion_name: exclusion_name.into(),
            static_dir: static_dir.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        })
    }

    /// Derive the config from command-line options
    ///
    /// The port comes from `--port`, then `READONLY_PLUGIN_PORT`, then the default.
    pub fn from_opts(opts: &Opts) -> Result<Self, ConfigError> {
        let plugin_dir = match &opts.plugin_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir().map_err(|source| ConfigError::PluginDir {
                path: PathBuf::from("."),
                source,
            })?,
        };
        let plugin_dir = plugin_dir
            .canonicalize()
            .map_err(|source| ConfigError::PluginDir {
                path: plugin_dir.clone(),
                source,
            })?;

        let exclusion_name = plugin_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConfigError::NoName(plugin_dir.clone()))?
            .to_string();

        let project_root = match &opts.project_root {
            Some(root) => root.clone(),
            None => plugin_dir
                .parent()
                .ok_or_else(|| ConfigError::NoParent(plugin_dir.clone()))?
                .to_path_buf(),
        };

        let static_dir = opts.static_dir.clone().unwrap_or_else(|| plugin_dir.clone());

        let mut config = Self::new(&project_root, exclusion_name, static_dir)?;
        config.port = opts
            .port
            .or_else(|| env::var(PORT_ENV_VAR).ok().and_then(|p| p.parse::<u16>().ok()))
            .unwrap_or(DEFAULT_PORT);
        if let Some(host) = &opts.host {
            config.host = host.clone();
        }

        Ok(config)
    }

    /// `host:port` string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
