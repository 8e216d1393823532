//! Service analyzer.
//!
//! Endpoints are read from `discovery.k8s.io/v1` EndpointSlices, matched to
//! their service through the `kubernetes.io/service-name` label.

use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::ResourceExt;
use kube::api::{Api, ListParams};
use std::collections::HashMap;

const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

pub struct ServiceAnalyzer;

#[async_trait]
impl Analyzer for ServiceAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let services: Api<Service> = ctx.namespaced_api()?;
        let services = services.list(&ctx.list_params()).await?;

        // Slices carry their own labels, so the run's selector does not apply to them.
        let slices: Api<EndpointSlice> = ctx.namespaced_api()?;
        let slices = slices.list(&ListParams::default()).await?;
        let mut by_service: HashMap<(String, String), Vec<EndpointSlice>> = HashMap::new();
        for slice in slices.items {
            let Some(service) = slice.labels().get(SERVICE_NAME_LABEL).cloned() else {
                continue;
            };
            let namespace = slice.namespace().unwrap_or_default();
            by_service.entry((namespace, service)).or_default().push(slice);
        }

        let doc = ctx.field_doc("Service", "spec.selector");
        let mut results = Vec::new();
        for service in &services.items {
            ctx.check_cancelled()?;
            let key = (service.namespace().unwrap_or_default(), service.name_any());
            let slices = by_service.get(&key).map(Vec::as_slice).unwrap_or_default();
            let failures = diagnose(service, slices, doc.clone());
            if failures.is_empty() {
                continue;
            }
            let name = object_id(service);
            results.push(
                AnalysisResult::new("Service", name.clone())
                    .with_failures(failures)
                    .with_parent(name),
            );
        }
        Ok(results)
    }
}

/// Failures for a service given the endpoint slices that belong to it.
pub fn diagnose(service: &Service, slices: &[EndpointSlice], doc: Option<String>) -> Vec<Failure> {
    let selector = service
        .spec
        .as_ref()
        .and_then(|s| s.selector.clone())
        .unwrap_or_default();
    if selector.is_empty() {
        return Vec::new();
    }

    let endpoints: Vec<_> = slices.iter().flat_map(|s| s.endpoints.iter()).collect();
    if endpoints.is_empty() {
        return selector
            .iter()
            .map(|(key, value)| {
                Failure::new(format!(
                    "Service has no endpoints, expected label {}={}",
                    key, value
                ))
                .with_documentation_opt(doc.clone())
                .with_sensitive(key.clone())
                .with_sensitive(value.clone())
            })
            .collect();
    }

    let not_ready: Vec<String> = endpoints
        .iter()
        .filter(|e| e.conditions.as_ref().and_then(|c| c.ready) == Some(false))
        .map(|e| match e.target_ref.as_ref().and_then(|t| t.name.clone()) {
            Some(name) => name,
            None => e.addresses.join(","),
        })
        .collect();
    if not_ready.is_empty() {
        return Vec::new();
    }

    vec![Failure::new(format!(
        "Service has not ready endpoints, pods: [{}], expected {}",
        not_ready.join(", "),
        endpoints.len()
    ))]
}
