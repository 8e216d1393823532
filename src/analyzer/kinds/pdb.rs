use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use kube::api::Api;

pub struct PdbAnalyzer;

#[async_trait]
impl Analyzer for PdbAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<PodDisruptionBudget> = ctx.namespaced_api()?;
        let budgets = api.list(&ctx.list_params()).await?;

        Ok(budgets
            .items
            .iter()
            .filter_map(|pdb| {
                let failures = diagnose(pdb, ctx);
                (!failures.is_empty()).then(|| {
                    let name = object_id(pdb);
                    AnalysisResult::new("PodDisruptionBudget", name.clone())
                        .with_failures(failures)
                        .with_parent(name)
                })
            })
            .collect())
    }
}

/// One failure per expected selector label while disruptions are not allowed.
pub fn diagnose(pdb: &PodDisruptionBudget, ctx: &AnalyzerContext) -> Vec<Failure> {
    let blocked = pdb
        .status
        .iter()
        .flat_map(|s| s.conditions.iter().flatten())
        .find(|c| c.type_ == "DisruptionAllowed" && c.status == "False");
    let Some(condition) = blocked else {
        return Vec::new();
    };

    let doc = ctx.field_doc("PodDisruptionBudget", "spec.selector");
    let labels = pdb
        .spec
        .as_ref()
        .and_then(|s| s.selector.as_ref())
        .and_then(|s| s.match_labels.clone())
        .unwrap_or_default();

    if labels.is_empty() {
        return vec![
            Failure::new(format!("{}: {}", condition.reason, condition.message))
                .with_documentation_opt(doc),
        ];
    }

    labels
        .iter()
        .map(|(key, value)| {
            Failure::new(format!(
                "{}, expected pdb pod label {}={}",
                condition.reason, key, value
            ))
            .with_documentation_opt(doc.clone())
            .with_sensitive(key.clone())
            .with_sensitive(value.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kinds::from_yaml;

    fn pdb(selector: &str, allowed: &str) -> PodDisruptionBudget {
        from_yaml(&format!(
            r#"
metadata:
  name: web
  namespace: shop
spec:
  minAvailable: 1
{}
status:
  currentHealthy: 0
  desiredHealthy: 1
  disruptionsAllowed: 0
  expectedPods: 0
  conditions:
  - type: DisruptionAllowed
    status: "{}"
    reason: InsufficientPods
    message: ""
    lastTransitionTime: "2024-01-01T00:00:00Z"
"#,
            selector, allowed
        ))
    }

    #[test]
    fn test_blocked_budget_lists_expected_labels() {
        let failures = diagnose(
            &pdb("  selector:\n    matchLabels:\n      app: web", "False"),
            &AnalyzerContext::offline(),
        );
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].text, "InsufficientPods, expected pdb pod label app=web");
        assert_eq!(failures[0].sensitive_values.len(), 2);
    }

    #[test]
    fn test_blocked_budget_without_labels() {
        let failures = diagnose(&pdb("", "False"), &AnalyzerContext::offline());
        assert_eq!(failures[0].text, "InsufficientPods: ");
    }

    #[test]
    fn test_allowed_budget() {
        assert!(diagnose(&pdb("", "True"), &AnalyzerContext::offline()).is_empty());
    }
}
