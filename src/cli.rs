//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Restaurant SOP service: bilingual procedures, staff training and translations
#[derive(Parser, Debug)]
#[command(name = "sop-manager")]
#[command(version)]
#[command(about = "Multi-tenant restaurant SOP service", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML); `SOP__*` environment variables override it
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Create a restaurant and its first admin account
    Bootstrap {
        /// Restaurant display name (English)
        #[arg(long)]
        name: String,

        /// Restaurant display name (Thai)
        #[arg(long)]
        name_th: Option<String>,

        /// IANA timezone of the restaurant
        #[arg(long, default_value = "Asia/Bangkok")]
        timezone: String,

        /// Admin login email
        #[arg(long)]
        admin_email: String,

        /// Admin full name
        #[arg(long)]
        admin_name: String,

        /// Admin PIN; prompted interactively when omitted
        #[arg(long)]
        pin: Option<String>,
    },

    /// Write a sample configuration file
    ConfigGen {
        /// Output path
        #[arg(default_value = "config.example.toml")]
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// `serve` when no subcommand is given
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::parse_from(["sop-manager"]);
        assert_eq!(cli.command(), &Commands::Serve);
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_parse_bootstrap() {
        let cli = Cli::parse_from([
            "sop-manager",
            "-c",
            "/etc/sop.toml",
            "bootstrap",
            "--name",
            "Baan Thai",
            "--admin-email",
            "owner@example.com",
            "--admin-name",
            "Somchai",
        ]);
        assert_eq!(cli.config, "/etc/sop.toml");
        match cli.command() {
            Commands::Bootstrap {
                name,
                timezone,
                pin,
                ..
            } => {
                assert_eq!(name, "Baan Thai");
                assert_eq!(timezone, "Asia/Bangkok");
                assert!(pin.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_gen() {
        let cli = Cli::parse_from(["sop-manager", "config-gen", "out.toml", "--force"]);
        assert_eq!(
            cli.command(),
            &Commands::ConfigGen {
                path: "out.toml".to_string(),
                force: true
            }
        );
    }
}
