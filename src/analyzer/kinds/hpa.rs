use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::core::v1::{Container, PodTemplateSpec, ReplicationController};
use kube::ResourceExt;
use kube::api::Api;

/// What the scale target of an autoscaler resolved to.
#[derive(Debug, Clone)]
pub enum ScaleTarget {
    /// The target kind cannot be scaled by an autoscaler.
    Unsupported,
    /// The target does not exist.
    Missing,
    /// The target exists; these are its pod template containers.
    Found(Vec<Container>),
}

pub struct HpaAnalyzer;

#[async_trait]
impl Analyzer for HpaAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<HorizontalPodAutoscaler> = ctx.namespaced_api()?;
        let autoscalers = api.list(&ctx.list_params()).await?;

        let mut results = Vec::new();
        for hpa in autoscalers.items {
            ctx.check_cancelled()?;
            let target = fetch_target(ctx, &hpa).await?;
            let failures = diagnose(&hpa, &target, ctx);
            if failures.is_empty() {
                continue;
            }
            let name = object_id(&hpa);
            results.push(
                AnalysisResult::new("HorizontalPodAutoscaler", name.clone())
                    .with_failures(failures)
                    .with_parent(name),
            );
        }
        Ok(results)
    }
}

async fn fetch_target(
    ctx: &AnalyzerContext,
    hpa: &HorizontalPodAutoscaler,
) -> Result<ScaleTarget, AnalyzerError> {
    let Some(spec) = &hpa.spec else {
        return Ok(ScaleTarget::Missing);
    };
    let namespace = hpa.namespace().unwrap_or_default();
    let target = &spec.scale_target_ref;

    let template: Option<PodTemplateSpec> = match target.kind.as_str() {
        "Deployment" => ctx
            .api_in::<Deployment>(&namespace)?
            .get_opt(&target.name)
            .await?
            .and_then(|d| d.spec)
            .map(|s| s.template),
        "ReplicaSet" => ctx
            .api_in::<ReplicaSet>(&namespace)?
            .get_opt(&target.name)
            .await?
            .and_then(|r| r.spec)
            .and_then(|s| s.template),
        "StatefulSet" => ctx
            .api_in::<StatefulSet>(&namespace)?
            .get_opt(&target.name)
            .await?
            .and_then(|s| s.spec)
            .map(|s| s.template),
        "ReplicationController" => ctx
            .api_in::<ReplicationController>(&namespace)?
            .get_opt(&target.name)
            .await?
            .and_then(|r| r.spec)
            .and_then(|s| s.template),
        _ => return Ok(ScaleTarget::Unsupported),
    };

    Ok(match template {
        Some(template) => {
            ScaleTarget::Found(template.spec.map(|s| s.containers).unwrap_or_default())
        }
        None => ScaleTarget::Missing,
    })
}

pub fn diagnose(
    hpa: &HorizontalPodAutoscaler,
    target: &ScaleTarget,
    ctx: &AnalyzerContext,
) -> Vec<Failure> {
    let Some(spec) = &hpa.spec else {
        return Vec::new();
    };
    let target_ref = &spec.scale_target_ref;
    let namespace = hpa.namespace().unwrap_or_default();
    let doc = ctx.field_doc("HorizontalPodAutoscaler", "spec.scaleTargetRef");
    let mut failures = Vec::new();

    match target {
        ScaleTarget::Unsupported => failures.push(
            Failure::new(format!(
                "HorizontalPodAutoscaler uses {} as ScaleTargetRef which is not an option.",
                target_ref.kind
            ))
            .with_documentation_opt(doc),
        ),
        ScaleTarget::Missing => failures.push(
            Failure::new(format!(
                "HorizontalPodAutoscaler uses {}/{} as ScaleTargetRef which does not exist.",
                target_ref.kind, target_ref.name
            ))
            .with_documentation_opt(doc)
            .with_sensitive(target_ref.name.clone()),
        ),
        ScaleTarget::Found(containers) => {
            if containers.iter().any(|c| !has_resources(c)) {
                failures.push(
                    Failure::new(format!(
                        "{} {}/{} does not have resource configured.",
                        target_ref.kind, namespace, target_ref.name
                    ))
                    .with_sensitive(namespace.clone())
                    .with_sensitive(target_ref.name.clone()),
                );
            }
        }
    }

    let conditions = hpa.status.iter().flat_map(|s| s.conditions.iter().flatten());
    for condition in conditions {
        if condition.type_ == "ScalingActive" && condition.status == "False" {
            failures.push(Failure::new(format!(
                "HorizontalPodAutoscaler cannot scale: {}: {}",
                condition.reason.as_deref().unwrap_or_default(),
                condition.message.as_deref().unwrap_or_default()
            )));
        }
    }

    failures
}

fn has_resources(container: &Container) -> bool {
    let Some(resources) = &container.resources else {
        return false;
    };
    let requests = resources.requests.as_ref().is_some_and(|r| !r.is_empty());
    let limits = resources.limits.as_ref().is_some_and(|l| !l.is_empty());
    requests && limits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kinds::from_yaml;

    fn hpa(kind: &str, status: &str) -> HorizontalPodAutoscaler {
        from_yaml(&format!(
            r#"
metadata:
  name: web
  namespace: shop
spec:
  minReplicas: 1
  maxReplicas: 5
  scaleTargetRef:
    apiVersion: apps/v1
    kind: {}
    name: web
{}
"#,
            kind, status
        ))
    }

    fn container(resources: &str) -> Container {
        from_yaml(&format!("name: web\nimage: web:1\n{}", resources))
    }

    #[test]
    fn test_unsupported_and_missing_targets() {
        let ctx = AnalyzerContext::offline();
        let failures = diagnose(&hpa("DaemonSet", ""), &ScaleTarget::Unsupported, &ctx);
        assert_eq!(
            failures[0].text,
            "HorizontalPodAutoscaler uses DaemonSet as ScaleTargetRef which is not an option."
        );

        let failures = diagnose(&hpa("Deployment", ""), &ScaleTarget::Missing, &ctx);
        assert_eq!(
            failures[0].text,
            "HorizontalPodAutoscaler uses Deployment/web as ScaleTargetRef which does not exist."
        );
    }

    #[test]
    fn test_target_without_resources() {
        let target = ScaleTarget::Found(vec![
            container("resources:\n  requests:\n    cpu: 100m\n  limits:\n    cpu: 200m"),
            container("resources:\n  requests:\n    cpu: 100m"),
        ]);
        let failures = diagnose(&hpa("Deployment", ""), &target, &AnalyzerContext::offline());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].text, "Deployment shop/web does not have resource configured.");
    }

    #[test]
    fn test_scaling_inactive() {
        let status = r#"status:
  desiredReplicas: 1
  conditions:
  - type: ScalingActive
    status: "False"
    reason: FailedGetResourceMetric
    message: missing request for cpu"#;
        let target = ScaleTarget::Found(vec![container(
            "resources:\n  requests:\n    cpu: 100m\n  limits:\n    cpu: 200m",
        )]);
        let failures = diagnose(&hpa("Deployment", status), &target, &AnalyzerContext::offline());
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].text,
            "HorizontalPodAutoscaler cannot scale: FailedGetResourceMetric: missing request for cpu"
        );
    }
}
