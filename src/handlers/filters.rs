use crate::analyzer::{build_analyzer_map, list_filters};
use crate::config::types::Config;
use crate::config::{load_config, save_config};
use crate::error::KubeSweepError;
use crate::integration::active_integrations;
use colored::Colorize;
use std::path::Path;

/// Every filter name `filters add` accepts: core, additional and active integrations.
pub fn known_filters(config: &Config) -> Vec<String> {
    let (core, additional) = list_filters();
    let mut known: Vec<String> = core.into_iter().chain(additional).collect();
    for integration in active_integrations(&config.integrations.active) {
        known.extend(integration.owned_filters().into_iter().map(str::to_string));
    }
    known.sort();
    known.dedup();
    known
}

/// Replace an empty active list with every filter it currently stands for:
/// core, additional and active integrations.
pub(crate) fn seed_active_filters(config: &mut Config) {
    if config.analysis.active_filters.is_empty() {
        let integrations = active_integrations(&config.integrations.active);
        config.analysis.active_filters = build_analyzer_map(&integrations).names();
    }
}

/// Add filters to the active list. Returns the names that were newly added.
pub fn add_filters(config: &mut Config, names: &[String]) -> crate::Result<Vec<String>> {
    let known = known_filters(config);
    if let Some(unknown) = names.iter().find(|n| !known.contains(n)) {
        return Err(KubeSweepError::UnknownFilter {
            name: unknown.clone(),
            known,
        });
    }

    seed_active_filters(config);
    let mut added = Vec::new();
    for name in names {
        if !config.analysis.active_filters.contains(name) {
            config.analysis.active_filters.push(name.clone());
            added.push(name.clone());
        }
    }
    Ok(added)
}

/// Remove filters from the active list. Every name must currently be active.
pub fn remove_filters(config: &mut Config, names: &[String]) -> crate::Result<()> {
    seed_active_filters(config);
    if let Some(missing) = names
        .iter()
        .find(|n| !config.analysis.active_filters.contains(n))
    {
        return Err(KubeSweepError::FilterNotActive(missing.clone()));
    }
    config
        .analysis
        .active_filters
        .retain(|f| !names.contains(f));
    Ok(())
}

pub fn handle_filters_list(config: &Config) {
    let (core, additional) = list_filters();
    let active = &config.analysis.active_filters;
    // An empty active list means every registered filter runs.
    let is_active = |name: &str| active.is_empty() || active.iter().any(|a| a == name);

    let print_group = |title: &str, names: &[String]| {
        if names.is_empty() {
            return;
        }
        println!("{}", title.bold());
        for name in names {
            if is_active(name) {
                println!("  {} {}", "●".green(), name);
            } else {
                println!("  {} {}", "○".dimmed(), name.dimmed());
            }
        }
    };

    print_group("Core filters:", &core);
    print_group("Additional filters:", &additional);
    for integration in active_integrations(&config.integrations.active) {
        let names: Vec<String> = integration
            .owned_filters()
            .into_iter()
            .map(str::to_string)
            .collect();
        print_group(&format!("Integration filters ({}):", integration.name()), &names);
    }
}

pub fn handle_filters_add(names: &[String], config_path: Option<&Path>) -> crate::Result<()> {
    let mut config = load_config(config_path)?;
    let added = add_filters(&mut config, names)?;
    save_config(&config, config_path)?;
    if added.is_empty() {
        println!("All given filters are already active");
    } else {
        println!("Added filter(s): {}", added.join(", ").green());
    }
    Ok(())
}

pub fn handle_filters_remove(names: &[String], config_path: Option<&Path>) -> crate::Result<()> {
    let mut config = load_config(config_path)?;
    remove_filters(&mut config, names)?;
    save_config(&config, config_path)?;
    println!("Removed filter(s): {}", names.join(", ").yellow());
    Ok(())
}
