//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use clap::Subcommand;
use routewatch::config::{config_file_path, ConfigFile, ENV_API_URL, ENV_TOKEN};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration (file plus environment overrides)
    Show,

    /// Write a commented configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init { force } => run_init(force),
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load_from(&path)?.with_env_overrides();

    println!("Configuration ({})", path.display());
    println!("======================");
    println!();
    println!("[backend]");
    println!("  url = {}", config.backend.url.as_deref().unwrap_or("(not set)"));
    println!("  token = {}", mask(config.backend.token.as_deref()));
    println!("  request_timeout = {} s", config.backend.request_timeout);
    println!();
    println!("[tracking]");
    println!(
        "  reliability_threshold = {} m",
        config.tracking.reliability_threshold
    );
    println!("  first_fix_zoom = {}", config.tracking.first_fix_zoom);
    println!();
    println!("[map]");
    println!("  fit_padding = {} px", config.map.fit_padding);
    println!("  fit_duration = {} ms", config.map.fit_duration);
    println!("  default_zoom = {}", config.map.default_zoom);
    println!();
    println!("[gpsd]");
    println!("  host = {}", config.gpsd.host);
    println!("  port = {}", config.gpsd.port);

    let overridden: Vec<&str> = [ENV_API_URL, ENV_TOKEN]
        .into_iter()
        .filter(|var| std::env::var(var).is_ok_and(|v| !v.trim().is_empty()))
        .collect();
    if !overridden.is_empty() {
        println!();
        println!("Environment overrides: {}", overridden.join(", "));
    }

    Ok(())
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Show only that a secret is set, plus its last four characters.
fn mask(secret: Option<&str>) -> String {
    match secret {
        None => "(not set)".to_string(),
        Some(s) if s.chars().count() <= 4 => "****".to_string(),
        Some(s) => {
            let chars: Vec<char> = s.chars().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("****{}", tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(None), "(not set)");
        assert_eq!(mask(Some("abc")), "****");
        assert_eq!(mask(Some("secret-token-9f3a")), "****9f3a");
    }
}
