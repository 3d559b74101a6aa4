//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. Global flags are merged over the configuration file and
//! environment variables through the figment `Provider` impl below.

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use figment::{
    providers::Serialized,
    value::{Dict, Map},
    Error, Figment, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Send one notification through every configured delivery channel.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Logging filter, e.g. "debug" or "notifyhub=trace".
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Dispatch to all backends in parallel.
    #[arg(long, global = true)]
    pub concurrent: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Send a message to a destination through every enabled backend.
    Send {
        /// Destination address (email address, phone number, user name...).
        #[arg(short, long)]
        to: String,

        /// Message body.
        #[arg(short, long)]
        message: String,

        /// Run each backend's validation before sending through it.
        #[arg(long)]
        validate: bool,
    },
    /// List the capabilities of every enabled backend.
    Capabilities,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut figment = Figment::new();

        if let Some(level) = &self.log_level {
            figment = figment.merge(Serialized::default("log_level", level));
        }

        // Flags only ever switch features on; absence leaves the file value.
        if self.concurrent {
            figment = figment.merge(Serialized::default("dispatch.concurrent", true));
        }
        if self.json {
            figment = figment.merge(Serialized::default("output.format", OutputFormat::Json));
        }

        figment.data()
    }
}
