//! Command-line argument definitions.

use clap::Parser;
use std::path::PathBuf;

use super::BindModeArg;

/// Run a windowed SQL query over an NDJSON tuple stream.
#[derive(Parser, Debug)]
#[command(name = "stagesql")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// NDJSON event file (stdin if omitted)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Config file with sources, query and operator settings
    #[arg(short = 'c', long = "config", value_name = "CONFIG")]
    pub config: PathBuf,

    /// Window query, overriding the one in the config file
    #[arg(short = 'e', long = "query", value_name = "SQL")]
    pub query: Option<String>,

    /// How values are bound (overrides the config file)
    #[arg(long = "bind-mode", value_enum)]
    pub bind_mode: Option<BindModeArg>,

    /// Fail on record fields that name no column
    #[arg(long = "reject-unmapped")]
    pub reject_unmapped: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
