mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use oembed_providers_core::{
    bootstrap::{init_services, load_config},
    logging,
};

#[derive(Parser, Debug)]
#[command(name = "oembed-providers")]
#[command(about = "oEmbed provider registry", long_about = None)]
pub(crate) struct Cli {
    /// Configuration file (defaults to OEMBED_CONFIG_PATH or ./config.yaml)
    #[arg(long, short, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// List providers of the merged set
    List {
        /// Only providers on the allow-list
        #[arg(long)]
        allowed: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a single provider
    Show { name: String },
    /// Drop cached provider sets and rebuild
    Refresh,
    /// Module settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Custom providers
    #[command(subcommand)]
    Custom(CustomCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum SettingsCommand {
    /// Print the stored settings
    Show,
    /// Set the provider database URL
    Url { url: String },
    /// Turn fetching of the provider database on or off
    ExternalFetch {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Replace the allow-list
    Allow { names: Vec<String> },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CustomCommand {
    /// List stored custom providers
    List,
    /// Create or update a custom provider from a YAML file
    Import { file: String },
    /// Delete a custom provider by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.logging)?;
    info!(data_dir = %config.storage.data_dir, redis = config.uses_redis(), "Configuration loaded");

    let services = init_services(&config).await?;
    if let Err(e) = commands::run(&services, cli.command).await {
        error!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("oembed-providers").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse(&["list", "--allowed"]),
            Command::List {
                allowed: true,
                json: false
            }
        );
        assert_eq!(
            parse(&["settings", "external-fetch", "false"]),
            Command::Settings(SettingsCommand::ExternalFetch { enabled: false })
        );
        assert_eq!(
            parse(&["settings", "allow", "Vimeo", "YouTube"]),
            Command::Settings(SettingsCommand::Allow {
                names: vec!["Vimeo".to_string(), "YouTube".to_string()]
            })
        );
        assert_eq!(
            parse(&["custom", "delete", "acme"]),
            Command::Custom(CustomCommand::Delete { id: "acme".to_string() })
        );
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["oembed-providers", "refresh", "--config", "/etc/oembed.yaml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/etc/oembed.yaml"));
        assert_eq!(cli.command, Command::Refresh);
    }
}
