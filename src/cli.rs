mod help_text;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Content fingerprints for incremental builds
#[derive(Parser, Debug)]
#[command(name = "hashsum", version, about, long_about = help_text::ROOT_LONG_ABOUT)]
pub struct Cli {
    /// Change to DIRECTORY before doing anything
    #[arg(short = 'C', value_name = "DIRECTORY", global = true)]
    pub directory: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Set the log level explicitly (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Digest every project and write its digest file
    #[command(long_about = help_text::CALCULATE_LONG_ABOUT)]
    Calculate {
        /// Use this algorithm instead of the configured one
        #[arg(long, value_name = "ALGORITHM")]
        algorithm: Option<String>,

        /// Run projects one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },

    /// Print the declared inputs and outputs of every project
    #[command(long_about = help_text::INPUTS_LONG_ABOUT)]
    Inputs {
        /// Task to describe (calculate or calculate<ALGORITHM>)
        #[arg(value_name = "TASK", default_value = "calculate")]
        task: String,
    },

    /// Infer the algorithm family of a digest file from its length
    Identify {
        /// Digest file to inspect
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    // calculate<ALGORITHM>, e.g. calculateMD5
    #[command(external_subcommand)]
    Rule(Vec<String>),
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
