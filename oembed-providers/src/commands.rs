//! Subcommand handlers
//!
//! Output goes to the given writer; logs go to stderr.

use anyhow::{Context, Result};
use std::io::Write;

use oembed_providers_core::{
    bootstrap::Services,
    service::AllowListState,
    storage::CustomProvider,
    Provider, ProviderMap, ProviderRepository,
};

use crate::{Command, CustomCommand, SettingsCommand};

pub async fn run(services: &Services, command: Command) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    execute(services, command, &mut stdout).await
}

pub(crate) async fn execute(services: &Services, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::List { allowed, json } => {
            let providers = if allowed {
                if services.allowed_filter.state().await? == AllowListState::Unconfigured {
                    writeln!(out, "No providers are allowed yet; use `settings allow` to choose some")?;
                    return Ok(());
                }
                services.allowed_filter.active().await?
            } else {
                services.repository.get_all().await?
            };

            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&providers)?)?;
            } else {
                print_table(&providers, out)?;
            }
        }
        Command::Show { name } => {
            let provider = services.repository.get(&name).await?;
            print_provider(&provider, out)?;
        }
        Command::Refresh => {
            services.repository.invalidate().await?;
            services.default_repository.invalidate().await?;
            let providers = services.repository.get_all().await?;
            writeln!(out, "Rebuilt provider set with {} providers", providers.len())?;
        }
        Command::Settings(command) => settings(services, command, out).await?,
        Command::Custom(command) => custom(services, command, out).await?,
    }
    Ok(())
}

async fn settings(services: &Services, command: SettingsCommand, out: &mut impl Write) -> Result<()> {
    let settings = match command {
        SettingsCommand::Show => services.settings_service.settings().await?,
        SettingsCommand::Url { url } => services.settings_service.save_providers_url(&url).await?,
        SettingsCommand::ExternalFetch { enabled } => services.settings_service.set_external_fetch(enabled).await?,
        SettingsCommand::Allow { names } => services.settings_service.save_allowed_providers(names).await?,
    };
    write!(out, "{}", serde_yaml::to_string(&settings)?)?;
    Ok(())
}

async fn custom(services: &Services, command: CustomCommand, out: &mut impl Write) -> Result<()> {
    match command {
        CustomCommand::List => {
            for provider in services.custom_provider_service.list().await? {
                writeln!(out, "{}\t{}\t{}", provider.id, provider.label, provider.provider_url)?;
            }
        }
        CustomCommand::Import { file } => {
            let contents = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {file}"))?;
            let provider: CustomProvider =
                serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {file}"))?;
            let provider = services.custom_provider_service.upsert(provider).await?;
            writeln!(out, "Saved custom provider '{}'", provider.id)?;
        }
        CustomCommand::Delete { id } => {
            services.custom_provider_service.delete(&id).await?;
            writeln!(out, "Deleted custom provider '{id}'")?;
        }
    }
    Ok(())
}

fn print_table(providers: &ProviderMap, out: &mut impl Write) -> Result<()> {
    for provider in providers.values() {
        writeln!(out, "{}\t{}\t{} endpoint(s)", provider.name(), provider.url(), provider.endpoints().len())?;
    }
    Ok(())
}

fn print_provider(provider: &Provider, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{} <{}>", provider.name(), provider.url())?;
    for endpoint in provider.endpoints() {
        let formats: Vec<_> = endpoint.formats().iter().map(|f| f.as_str()).collect();
        writeln!(out, "  {} [{}]", endpoint.url(), formats.join(", "))?;
        if endpoint.supports_discovery() {
            writeln!(out, "    discovery")?;
        }
        for scheme in endpoint.schemes() {
            writeln!(out, "    {scheme}")?;
        }
    }
    Ok(())
}
