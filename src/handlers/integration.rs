use crate::config::types::Config;
use crate::config::{load_config, save_config};
use crate::error::KubeSweepError;
use crate::handlers::filters::seed_active_filters;
use crate::integration::{Integration, catalog, find};
use colored::Colorize;
use std::path::Path;

fn lookup(name: &str) -> crate::Result<&'static dyn Integration> {
    find(name).ok_or_else(|| KubeSweepError::UnknownIntegration {
        name: name.to_string(),
        available: catalog().iter().map(|i| i.name().to_string()).collect(),
    })
}

/// Mark an integration active and add its filters to the active list.
pub fn activate(config: &mut Config, name: &str) -> crate::Result<&'static dyn Integration> {
    let integration = lookup(name)?;
    if !config
        .integrations
        .active
        .iter()
        .any(|a| a == integration.name())
    {
        config.integrations.active.push(integration.name().to_string());
    }

    seed_active_filters(config);
    for filter in integration.owned_filters() {
        if !config.analysis.active_filters.iter().any(|f| f == filter) {
            config.analysis.active_filters.push(filter.to_string());
        }
    }
    Ok(integration)
}

/// Mark an integration inactive and drop its filters from the active list.
pub fn deactivate(config: &mut Config, name: &str) -> crate::Result<&'static dyn Integration> {
    let integration = lookup(name)?;
    config
        .integrations
        .active
        .retain(|a| !a.eq_ignore_ascii_case(integration.name()));
    let owned = integration.owned_filters();
    config
        .analysis
        .active_filters
        .retain(|f| !owned.contains(&f.as_str()));
    Ok(integration)
}

pub fn handle_integration_list(config: &Config) {
    for integration in catalog() {
        let active = config
            .integrations
            .active
            .iter()
            .any(|a| a.eq_ignore_ascii_case(integration.name()));
        let status = if active {
            "active".green()
        } else {
            "inactive".dimmed()
        };
        println!(
            "{:<10} {:<10} {}",
            integration.name().bold(),
            status,
            integration.description()
        );
    }
}

pub fn handle_integration_activate(name: &str, config_path: Option<&Path>) -> crate::Result<()> {
    let mut config = load_config(config_path)?;
    let integration = activate(&mut config, name)?;
    save_config(&config, config_path)?;
    println!(
        "Activated {} (filters: {})",
        integration.name().green(),
        integration.owned_filters().join(", ")
    );
    Ok(())
}

pub fn handle_integration_deactivate(name: &str, config_path: Option<&Path>) -> crate::Result<()> {
    let mut config = load_config(config_path)?;
    let integration = deactivate(&mut config, name)?;
    save_config(&config, config_path)?;
    println!("Deactivated {}", integration.name().yellow());
    Ok(())
}
