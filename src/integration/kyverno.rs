//! Kyverno integration: failing results of `wgpolicyk8s.io/v1alpha2` PolicyReports.

use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::registry::{Analyzer, AnalyzerEntry};
use crate::analyzer::types::{AnalysisResult, Failure, namespaced_name};
use crate::integration::{Integration, dynamic_api};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;
use std::sync::Arc;

pub struct Kyverno;

impl Integration for Kyverno {
    fn name(&self) -> &'static str {
        "kyverno"
    }

    fn description(&self) -> &'static str {
        "Policy violations reported by Kyverno"
    }

    fn owned_filters(&self) -> Vec<&'static str> {
        vec!["PolicyReport"]
    }

    fn analyzers(&self) -> Vec<AnalyzerEntry> {
        vec![("PolicyReport", Arc::new(PolicyReportAnalyzer))]
    }
}

pub struct PolicyReportAnalyzer;

#[async_trait]
impl Analyzer for PolicyReportAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api = dynamic_api(ctx, "wgpolicyk8s.io", "v1alpha2", "PolicyReport")?;
        let reports = api.list(&ctx.list_params()).await?;

        let mut results = Vec::new();
        for report in &reports.items {
            let failures = policy_failures(&report.data);
            if failures.is_empty() {
                continue;
            }
            let name = namespaced_name(report.namespace().as_deref(), &report.name_any());
            let parent = scope_of(&report.data).unwrap_or_else(|| name.clone());
            results.push(
                AnalysisResult::new("PolicyReport", name)
                    .with_failures(failures)
                    .with_parent(parent),
            );
        }
        Ok(results)
    }
}

/// `Kind/name` of the object a report is scoped to.
pub fn scope_of(data: &Value) -> Option<String> {
    let kind = data.pointer("/scope/kind")?.as_str()?;
    let name = data.pointer("/scope/name")?.as_str()?;
    Some(format!("{}/{}", kind, name))
}

/// One failure per result with outcome `fail` or `error`.
pub fn policy_failures(data: &Value) -> Vec<Failure> {
    data["results"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|r| matches!(r["result"].as_str(), Some("fail") | Some("error")))
        .map(|r| {
            let policy = r["policy"].as_str().unwrap_or_default();
            let rule = r["rule"].as_str().unwrap_or_default();
            let message = r["message"].as_str().unwrap_or_default();
            let text = if rule.is_empty() {
                format!("{}: {}", policy, message)
            } else {
                format!("{}/{}: {}", policy, rule, message)
            };
            let mut failure = Failure::new(text);
            for resource in r["resources"].as_array().into_iter().flatten() {
                if let Some(name) = resource["name"].as_str() {
                    failure = failure.with_sensitive(name);
                }
            }
            failure
        })
        .collect()
}
