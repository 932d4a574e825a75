//! Command line argument definitions.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(author, version, about = "IPv4<->IPv6 address translation helper", long_about = None)]
pub struct Args {
    /// Path to the configuration file
    pub config_file: PathBuf,

    /// Enable verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}
