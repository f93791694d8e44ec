use std::path::PathBuf;

use clap::Args;

use crate::collectors::catalog::{CatalogSource, FileSource, StdinSource};
use crate::core::gravity::{GravityModel, OpsMode};
use crate::core::orbit::PropagationSettings;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// TLE text or catalog JSON file; standard input when omitted
    #[arg(short, long, env = "TLEPROP_INPUT", global = true)]
    pub input: Option<PathBuf>,

    /// Gravity model: wgs72old, wgs72 or wgs84
    #[arg(long, env = "TLEPROP_GRAVITY", default_value_t = GravityModel::Wgs72, global = true)]
    pub gravity: GravityModel,

    /// Operation mode: improved or afspc
    #[arg(long, env = "TLEPROP_OPSMODE", default_value_t = OpsMode::Improved, global = true)]
    pub opsmode: OpsMode,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "TLEPROP_LOG", default_value = "info", global = true)]
    pub log_level: String,
}

impl Config {
    pub fn settings(&self) -> PropagationSettings {
        PropagationSettings { gravity: self.gravity, opsmode: self.opsmode }
    }

    pub fn source(&self) -> Box<dyn CatalogSource> {
        match &self.input {
            Some(path) => Box::new(FileSource::new(path)),
            None => Box::new(StdinSource),
        }
    }
}
