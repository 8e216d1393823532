//! Trivy Operator integration.
//!
//! Reads `VulnerabilityReport` and `ConfigAuditReport` objects from
//! `aquasecurity.github.io/v1alpha1`. Each report is attached to the workload
//! it was generated for through the operator's resource labels.

use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::registry::{Analyzer, AnalyzerEntry};
use crate::analyzer::types::{AnalysisResult, Failure, namespaced_name};
use crate::integration::{Integration, dynamic_api};
use async_trait::async_trait;
use kube::ResourceExt;
use kube::api::DynamicObject;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const GROUP: &str = "aquasecurity.github.io";
const VERSION: &str = "v1alpha1";
const KIND_LABEL: &str = "trivy-operator.resource.kind";
const NAME_LABEL: &str = "trivy-operator.resource.name";

pub struct Trivy;

impl Integration for Trivy {
    fn name(&self) -> &'static str {
        "trivy"
    }

    fn description(&self) -> &'static str {
        "Vulnerability and configuration audit reports from the Trivy Operator"
    }

    fn owned_filters(&self) -> Vec<&'static str> {
        vec!["VulnerabilityReport", "ConfigAuditReport"]
    }

    fn analyzers(&self) -> Vec<AnalyzerEntry> {
        vec![
            ("VulnerabilityReport", Arc::new(VulnerabilityReportAnalyzer)),
            ("ConfigAuditReport", Arc::new(ConfigAuditReportAnalyzer)),
        ]
    }
}

pub struct VulnerabilityReportAnalyzer;

#[async_trait]
impl Analyzer for VulnerabilityReportAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api = dynamic_api(ctx, GROUP, VERSION, "VulnerabilityReport")?;
        let reports = api.list(&ctx.list_params()).await?;
        Ok(reports
            .items
            .iter()
            .filter_map(|r| to_result("VulnerabilityReport", r, vulnerability_failures(&r.data)))
            .collect())
    }
}

pub struct ConfigAuditReportAnalyzer;

#[async_trait]
impl Analyzer for ConfigAuditReportAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api = dynamic_api(ctx, GROUP, VERSION, "ConfigAuditReport")?;
        let reports = api.list(&ctx.list_params()).await?;
        Ok(reports
            .items
            .iter()
            .filter_map(|r| to_result("ConfigAuditReport", r, config_audit_failures(&r.data)))
            .collect())
    }
}

fn to_result(kind: &str, report: &DynamicObject, failures: Vec<Failure>) -> Option<AnalysisResult> {
    if failures.is_empty() {
        return None;
    }
    let name = namespaced_name(report.namespace().as_deref(), &report.name_any());
    let parent = parent_from_labels(report.labels()).unwrap_or_else(|| name.clone());
    Some(
        AnalysisResult::new(kind, name)
            .with_failures(failures)
            .with_parent(parent),
    )
}

/// `Kind/name` of the scanned workload, taken from the operator's labels.
pub fn parent_from_labels(labels: &BTreeMap<String, String>) -> Option<String> {
    match (labels.get(KIND_LABEL), labels.get(NAME_LABEL)) {
        (Some(kind), Some(name)) => Some(format!("{}/{}", kind, name)),
        _ => None,
    }
}

/// One failure per CRITICAL vulnerability in a report's data.
pub fn vulnerability_failures(data: &Value) -> Vec<Failure> {
    data.pointer("/report/vulnerabilities")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|v| v["severity"].as_str() == Some("CRITICAL"))
        .map(|v| {
            let id = v["vulnerabilityID"].as_str().unwrap_or("unknown");
            let mut text = format!("critical Vulnerability found ID: {}", id);
            if let Some(link) = v["primaryLink"].as_str().filter(|l| !l.is_empty()) {
                text.push_str(&format!(" (learn more at: {})", link));
            }
            Failure::new(text)
        })
        .collect()
}

/// One failure per unsuccessful check in a config audit report's data.
pub fn config_audit_failures(data: &Value) -> Vec<Failure> {
    data.pointer("/report/checks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|c| c["success"].as_bool() == Some(false))
        .map(|c| {
            let mut text = format!(
                "[{}] {} {}",
                c["severity"].as_str().unwrap_or("UNKNOWN"),
                c["checkID"].as_str().unwrap_or_default(),
                c["title"].as_str().unwrap_or_default()
            );
            let messages: Vec<&str> = c["messages"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .collect();
            if !messages.is_empty() {
                text.push_str(&format!(": {}", messages.join("; ")));
            }
            Failure::new(text)
        })
        .collect()
}
