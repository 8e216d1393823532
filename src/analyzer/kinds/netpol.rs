use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::{object_id, selector};
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::ResourceExt;
use kube::api::{Api, ListParams};
use std::collections::{BTreeMap, HashMap};

pub struct NetworkPolicyAnalyzer;

#[async_trait]
impl Analyzer for NetworkPolicyAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<NetworkPolicy> = ctx.namespaced_api()?;
        let policies = api.list(&ctx.list_params()).await?;

        let mut pod_labels: HashMap<String, Vec<BTreeMap<String, String>>> = HashMap::new();
        let mut results = Vec::new();
        for policy in &policies.items {
            ctx.check_cancelled()?;
            let namespace = policy.namespace().unwrap_or_default();
            if !pod_labels.contains_key(&namespace) {
                let pods: Api<Pod> = ctx.api_in(&namespace)?;
                let labels = pods
                    .list_metadata(&ListParams::default())
                    .await?
                    .items
                    .into_iter()
                    .map(|p| p.metadata.labels.unwrap_or_default())
                    .collect();
                pod_labels.insert(namespace.clone(), labels);
            }
            let labels = pod_labels.get(&namespace).map(Vec::as_slice).unwrap_or_default();

            let failures = diagnose(policy, labels, ctx);
            if failures.is_empty() {
                continue;
            }
            let name = object_id(policy);
            results.push(
                AnalysisResult::new("NetworkPolicy", name.clone())
                    .with_failures(failures)
                    .with_parent(name),
            );
        }
        Ok(results)
    }
}

/// Failures for a policy given the labels of every pod in its namespace.
pub fn diagnose(
    policy: &NetworkPolicy,
    pod_labels: &[BTreeMap<String, String>],
    ctx: &AnalyzerContext,
) -> Vec<Failure> {
    let name = policy.name_any();
    let Some(spec) = &policy.spec else {
        return Vec::new();
    };
    let pod_selector: Option<LabelSelector> = spec.pod_selector.clone().into();
    let pod_selector = pod_selector.unwrap_or_default();
    let doc = ctx.field_doc("NetworkPolicy", "spec.podSelector");

    if selector::is_empty(&pod_selector) {
        let allows_all = spec
            .ingress
            .iter()
            .flatten()
            .any(|rule| rule.from.as_ref().is_none_or(|from| from.is_empty()));
        if allows_all {
            return vec![
                Failure::new(format!("Network policy allows traffic to all pods: {}", name))
                    .with_documentation_opt(doc)
                    .with_sensitive(name),
            ];
        }
        return Vec::new();
    }

    let applied = pod_labels
        .iter()
        .any(|labels| selector::matches(&pod_selector, labels));
    if applied {
        return Vec::new();
    }
    vec![
        Failure::new(format!("Network policy is not applied to any pods: {}", name))
            .with_documentation_opt(doc)
            .with_sensitive(name),
    ]
}
