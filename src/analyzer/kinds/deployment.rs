use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use kube::api::Api;

/// Flags deployments whose ready replica count does not match the desired count.
pub struct DeploymentAnalyzer;

#[async_trait]
impl Analyzer for DeploymentAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<Deployment> = ctx.namespaced_api()?;
        let deployments = api.list(&ctx.list_params()).await?;
        let doc = ctx.field_doc("Deployment", "spec.replicas");

        Ok(deployments
            .items
            .iter()
            .filter_map(|deployment| {
                let failures = diagnose(deployment, doc.clone());
                (!failures.is_empty()).then(|| {
                    let name = object_id(deployment);
                    AnalysisResult::new("Deployment", name.clone())
                        .with_failures(failures)
                        .with_parent(name)
                })
            })
            .collect())
    }
}

pub fn diagnose(deployment: &Deployment, doc: Option<String>) -> Vec<Failure> {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let status = deployment.status.clone().unwrap_or_default();
    let ready = status.ready_replicas.unwrap_or(0);
    let current = status.replicas.unwrap_or(0);

    if desired == ready {
        return Vec::new();
    }

    let namespace = deployment.namespace().unwrap_or_default();
    let name = deployment.name_any();
    let text = if current > desired {
        format!(
            "Deployment {}/{} has {} replicas in spec but {} replicas in status because status field is not updated yet after scaling and {} replicas are available with status running",
            namespace, name, desired, current, ready
        )
    } else {
        format!(
            "Deployment {}/{} has {} replicas but {} are available with status running",
            namespace, name, desired, ready
        )
    };

    vec![
        Failure::new(text)
            .with_documentation_opt(doc)
            .with_sensitive(namespace)
            .with_sensitive(name),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kinds::from_yaml;

    fn deployment(spec_replicas: i32, status: &str) -> Deployment {
        from_yaml(&format!(
            r#"
metadata:
  name: web
  namespace: shop
spec:
  replicas: {}
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
status:
{}
"#,
            spec_replicas, status
        ))
    }

    #[test]
    fn test_ready_deployment_passes() {
        let d = deployment(3, "  replicas: 3\n  readyReplicas: 3");
        assert!(diagnose(&d, None).is_empty());
    }

    #[test]
    fn test_unavailable_replicas() {
        let d = deployment(3, "  replicas: 3\n  readyReplicas: 1");
        let failures = diagnose(&d, Some("replicas doc".to_string()));
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].text,
            "Deployment shop/web has 3 replicas but 1 are available with status running"
        );
        assert_eq!(failures[0].documentation_reference.as_deref(), Some("replicas doc"));
        let unmasked: Vec<&str> = failures[0]
            .sensitive_values
            .iter()
            .map(|s| s.unmasked.as_str())
            .collect();
        assert_eq!(unmasked, vec!["shop", "web"]);
    }

    #[test]
    fn test_scaling_down_in_progress() {
        let d = deployment(1, "  replicas: 3\n  readyReplicas: 3");
        let failures = diagnose(&d, None);
        assert!(failures[0].text.contains("status field is not updated yet"));
    }
}
