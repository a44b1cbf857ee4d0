//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Wrap shell commands through a chain of encoders and run them.
#[derive(Parser, Debug)]
#[command(name = "cmdrunner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Load this session file before starting
    #[arg(short, long, value_name = "PATH")]
    pub session: Option<PathBuf>,

    /// Execute a single command and exit
    #[arg(short, long, value_name = "CMD")]
    pub command: Option<String>,

    /// Read configuration from PATH instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Runner for a fresh session, overriding the configured default
    #[arg(long, value_name = "NAME")]
    pub runner: Option<String>,

    /// Log to stderr at debug level
    #[arg(short, long)]
    pub verbose: bool,
}
