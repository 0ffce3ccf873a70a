use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{generate_command, inspect_command, replay_command};

#[derive(Parser, Debug)]
#[command(name = "specgen")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate factory modules from a declaration manifest
    #[command(visible_alias = "g")]
    Generate {
        /// Path to the JSON declaration manifest
        manifest: PathBuf,

        /// Directory the generated modules are written to
        #[arg(short, long, default_value = "generated")]
        output: PathBuf,

        /// Configuration file (defaults to the nearest .specgen.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the generated modules without writing them
        #[arg(short, long)]
        dry_run: bool,

        /// Format the generated modules with rustfmt
        #[arg(long)]
        rustfmt: bool,
    },
    /// List the declarations found in a manifest
    #[command(visible_alias = "i")]
    Inspect {
        /// Path to the JSON declaration manifest
        manifest: PathBuf,

        /// Print the declarations as JSON
        #[arg(long)]
        json: bool,

        /// Configuration file (defaults to the nearest .specgen.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Rebuild a command spec from the generated code and print it as JSON
    #[command(visible_alias = "r")]
    Replay {
        /// Path to the JSON declaration manifest
        manifest: PathBuf,

        /// Element id of the command to rebuild (e.g. demo.Hello)
        element: String,

        /// Configuration file (defaults to the nearest .specgen.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate {
                manifest,
                output,
                config,
                dry_run,
                rustfmt,
            } => generate_command(&manifest, &output, config.as_deref(), dry_run, rustfmt),
            Commands::Inspect {
                manifest,
                json,
                config,
            } => inspect_command(&manifest, json, config.as_deref()),
            Commands::Replay {
                manifest,
                element,
                config,
            } => replay_command(&manifest, &element, config.as_deref()),
        }
    }
}
