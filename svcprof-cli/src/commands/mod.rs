//! Command line surface

pub mod profile;

use clap::{Parser, Subcommand};

use crate::config::GlobalConfig;

pub use profile::{ProfileArgs, handle_profile_command};

#[derive(Debug, Parser)]
#[command(
    name = "svcprof",
    version,
    about = "Generate service mesh ServiceProfile resources"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalConfig,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Output service profile config for Kubernetes
    Profile(ProfileArgs),
}
