//! CLI definitions for pipdock.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pipdock_config::Config;

/// pipdock CLI.
#[derive(Parser)]
#[command(name = "pipdock")]
#[command(about = "Detach web videos into a placed popup window and drive them into Picture-in-Picture")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path. A missing file means built-in defaults.
    #[arg(short, long, default_value = "config/pipdock.toml", global = true)]
    pub config: PathBuf,

    /// Overrides for the default run (no subcommand).
    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the controller and its HTTP API in the foreground (default)
    Run(RunArgs),

    /// Validate the configuration file and exit
    CheckConfig,
}

/// Config overrides accepted by `run` and by the bare command.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RunArgs {
    /// Override `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    pub port: Option<u16>,

    /// Override `browser.endpoint`
    #[arg(long, env = "PIPDOCK_BROWSER")]
    pub browser: Option<String>,
}

impl RunArgs {
    /// Fill unset values from `fallback`.
    pub fn or(self, fallback: RunArgs) -> RunArgs {
        RunArgs {
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            browser: self.browser.or(fallback.browser),
        }
    }

    pub fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(browser) = self.browser {
            config.browser.endpoint = browser;
        }
    }
}
