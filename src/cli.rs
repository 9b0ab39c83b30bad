//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// SurveyHub - survey distribution backend
#[derive(Parser, Debug)]
#[command(name = "surveyhub")]
#[command(version)]
#[command(about = "Survey distribution backend with quota enforcement and outcome tracking", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Create an admin account
    CreateAdmin {
        /// Admin username
        username: String,

        /// Password (if not provided, will prompt interactively)
        #[arg(long)]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Reset an admin's password
    ResetPassword {
        /// Admin username
        username: String,

        /// New password (if not provided, will prompt interactively)
        #[arg(long)]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["surveyhub"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
    }

    #[test]
    fn test_create_admin_with_config() {
        let cli = Cli::try_parse_from([
            "surveyhub",
            "-c",
            "prod.toml",
            "create-admin",
            "root",
            "--password",
            "secret123",
        ])
        .unwrap();
        assert_eq!(cli.config, "prod.toml");
        match cli.command {
            Some(Commands::CreateAdmin {
                username,
                password,
                stdin,
            }) => {
                assert_eq!(username, "root");
                assert_eq!(password.as_deref(), Some("secret123"));
                assert!(!stdin);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_generate() {
        let cli = Cli::try_parse_from(["surveyhub", "config", "generate", "out.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommands::Generate { .. }
            })
        ));
    }
}
