//! User configuration (`~/.routewatch/config.ini`).

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{BackendSettings, ConfigFile, GpsdSettings, MapSettings, TrackingSettings};
