//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::config::OutputFormat;

#[derive(Parser)]
#[command(
    name = "variant-viewer",
    version,
    about = "Inspect and drive variant configurations of a scene description"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// RON configuration file.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (overrides the configuration file).
    #[arg(long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    /// Reject variant sets with more than one default variant.
    #[arg(long, global = true)]
    pub strict: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the observed state of every variant set.
    State {
        /// Scene description (.ron or .json).
        file: PathBuf,
    },

    /// List variant sets and their variants.
    List {
        /// Scene description (.ron or .json).
        file: PathBuf,
    },

    /// Activate variants in order and report every notification.
    Activate {
        /// Scene description (.ron or .json).
        file: PathBuf,

        /// `SET=VARIANT` pairs; names or indices.
        #[arg(required = true, value_name = "SET=VARIANT")]
        targets: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
    Ron,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Ron => OutputFormat::Ron,
        }
    }
}
