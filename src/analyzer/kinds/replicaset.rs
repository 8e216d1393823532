use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::owner::resolve_parent;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::ReplicaSet;
use kube::api::Api;

/// Flags replica sets that failed to create any pod.
pub struct ReplicaSetAnalyzer;

#[async_trait]
impl Analyzer for ReplicaSetAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<ReplicaSet> = ctx.namespaced_api()?;
        let client = ctx.client()?;
        let sets = api.list(&ctx.list_params()).await?;

        let mut results = Vec::new();
        for set in sets.items {
            ctx.check_cancelled()?;
            let failures = diagnose(&set);
            if failures.is_empty() {
                continue;
            }
            let parent = resolve_parent(client, &set.metadata).await;
            results.push(
                AnalysisResult::new("ReplicaSet", object_id(&set))
                    .with_failures(failures)
                    .with_parent(parent.identity),
            );
        }
        Ok(results)
    }
}

pub fn diagnose(set: &ReplicaSet) -> Vec<Failure> {
    let Some(status) = &set.status else {
        return Vec::new();
    };
    if status.replicas != 0 {
        return Vec::new();
    }

    status
        .conditions
        .iter()
        .flatten()
        .filter(|c| c.type_ == "ReplicaFailure" && c.reason.as_deref() == Some("FailedCreate"))
        .map(|c| {
            Failure::new(format!(
                "{} has condition of type {}, reason {}: {}",
                set.metadata.name.as_deref().unwrap_or_default(),
                c.type_,
                c.reason.as_deref().unwrap_or_default(),
                c.message.as_deref().unwrap_or_default()
            ))
        })
        .collect()
}
