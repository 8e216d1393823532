//! Optional analyzer packs backed by third-party operators.
//!
//! An integration contributes analyzers for custom resources written by an
//! operator running in the cluster. Built-in integrations live in a static
//! catalog; which of them are active is persisted in the config file.

pub mod kyverno;
pub mod trivy;

use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::registry::AnalyzerEntry;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind};
use log::warn;
use std::sync::OnceLock;

/// A named pack of analyzers.
pub trait Integration: Send + Sync {
    /// Name used on the command line and in the config file.
    fn name(&self) -> &'static str;

    /// One-line description for listings.
    fn description(&self) -> &'static str;

    /// Filters this integration adds to the active list when activated.
    fn owned_filters(&self) -> Vec<&'static str>;

    /// Analyzers contributed to the registry while active.
    fn analyzers(&self) -> Vec<AnalyzerEntry>;
}

static CATALOG: OnceLock<Vec<Box<dyn Integration>>> = OnceLock::new();

/// Every built-in integration, in display order.
pub fn catalog() -> &'static [Box<dyn Integration>] {
    CATALOG.get_or_init(|| {
        let integrations: Vec<Box<dyn Integration>> =
            vec![Box::new(trivy::Trivy), Box::new(kyverno::Kyverno)];
        integrations
    })
}

/// Look up a built-in integration by name.
pub fn find(name: &str) -> Option<&'static dyn Integration> {
    catalog()
        .iter()
        .find(|i| i.name().eq_ignore_ascii_case(name))
        .map(|i| i.as_ref())
}

/// Resolve the persisted list of active integration names.
///
/// Unknown names are skipped with a warning.
pub fn active_integrations(names: &[String]) -> Vec<&'static dyn Integration> {
    let mut active: Vec<&'static dyn Integration> = Vec::new();
    for name in names {
        match find(name) {
            Some(integration) if !active.iter().any(|a| a.name() == integration.name()) => {
                active.push(integration)
            }
            Some(_) => {}
            None => warn!("Ignoring unknown integration '{}' in config", name),
        }
    }
    active
}

/// Api over a custom resource kind, scoped to the run's namespace if one is set.
pub(crate) fn dynamic_api(
    ctx: &AnalyzerContext,
    group: &str,
    version: &str,
    kind: &str,
) -> Result<Api<DynamicObject>, AnalyzerError> {
    let resource = ApiResource::from_gvk(&GroupVersionKind::gvk(group, version, kind));
    let client = ctx.client()?.clone();
    Ok(match ctx.namespace() {
        Some(ns) => Api::namespaced_with(client, ns, &resource),
        None => Api::all_with(client, &resource),
    })
}
