use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigError, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "blog_site")]
#[command(version)]
#[command(about = "Multi-user blog server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "serve")]
    #[command(about = "Start the blog server")]
    Serve(ServerArgs),

    #[command(name = "init")]
    #[command(about = "Write a default configuration file")]
    Init(ServerArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ServerArgs {
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl Cli {
    /// The command to run; no subcommand means `serve` with defaults.
    pub fn into_command(self) -> Commands {
        self.command
            .unwrap_or_else(|| Commands::Serve(ServerArgs::default()))
    }
}

/// Write the default configuration to `path`. Refuses to overwrite.
///
/// Secrets are never written; they come from the environment.
pub fn init_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::Invalid(format!(
            "'{}' already exists",
            path.display()
        )));
    }

    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    println!("Set SECRET_KEY, EMAIL and EMAIL_PASS in the environment before serving.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_serves() {
        let cli = Cli::try_parse_from(["blog_site"]).unwrap();
        match cli.into_command() {
            Commands::Serve(args) => assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_init_with_config_path() {
        let cli = Cli::try_parse_from(["blog_site", "init", "--config", "site.toml"]).unwrap();
        match cli.into_command() {
            Commands::Init(args) => assert_eq!(args.config, PathBuf::from("site.toml")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let path = std::env::temp_dir().join(format!("blog_site_init_{}.toml", uuid::Uuid::new_v4()));

        init_config(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[server]"));
        assert!(!written.contains("secret_key"));

        assert!(matches!(init_config(&path), Err(ConfigError::Invalid(_))));

        std::fs::remove_file(&path).ok();
    }
}
