use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, PersistentVolumeClaim};
use kube::ResourceExt;
use kube::api::Api;

/// Flags pending claims whose provisioning failed.
pub struct PvcAnalyzer;

#[async_trait]
impl Analyzer for PvcAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<PersistentVolumeClaim> = ctx.namespaced_api()?;
        let claims = api.list(&ctx.list_params()).await?;

        let mut results = Vec::new();
        for claim in claims.items {
            ctx.check_cancelled()?;
            if !is_pending(&claim) {
                continue;
            }
            let namespace = claim.namespace().unwrap_or_default();
            let event = ctx
                .latest_event(&namespace, "PersistentVolumeClaim", &claim.name_any())
                .await?;
            let failures = diagnose(&claim, event.as_ref());
            if failures.is_empty() {
                continue;
            }
            let name = object_id(&claim);
            results.push(
                AnalysisResult::new("PersistentVolumeClaim", name.clone())
                    .with_failures(failures)
                    .with_parent(name),
            );
        }
        Ok(results)
    }
}

fn is_pending(claim: &PersistentVolumeClaim) -> bool {
    claim.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Pending")
}

/// Failures for a claim given the latest event recorded against it.
pub fn diagnose(claim: &PersistentVolumeClaim, latest_event: Option<&Event>) -> Vec<Failure> {
    if !is_pending(claim) {
        return Vec::new();
    }
    latest_event
        .filter(|e| e.reason.as_deref() == Some("ProvisioningFailed"))
        .and_then(|e| e.message.as_deref())
        .filter(|m| !m.is_empty())
        .map(|m| vec![Failure::new(m)])
        .unwrap_or_default()
}
