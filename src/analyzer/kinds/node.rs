use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, NodeCondition};
use kube::ResourceExt;
use kube::api::Api;

/// Conditions that indicate trouble when they are `True`.
const PRESSURE_CONDITIONS: &[&str] = &[
    "MemoryPressure",
    "DiskPressure",
    "PIDPressure",
    "NetworkUnavailable",
];

pub struct NodeAnalyzer;

#[async_trait]
impl Analyzer for NodeAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<Node> = ctx.cluster_api()?;
        let nodes = api.list(&ctx.list_params()).await?;

        Ok(nodes
            .items
            .iter()
            .filter_map(|node| {
                let failures = diagnose(node);
                (!failures.is_empty()).then(|| {
                    AnalysisResult::new("Node", node.name_any())
                        .with_failures(failures)
                        .with_parent(node.name_any())
                })
            })
            .collect())
    }
}

pub fn diagnose(node: &Node) -> Vec<Failure> {
    let name = node.name_any();
    node.status
        .iter()
        .flat_map(|s| s.conditions.iter().flatten())
        .filter(|c| is_unhealthy(c))
        .map(|c| {
            Failure::new(format!(
                "{} has condition of type {}, reason {}: {}",
                name,
                c.type_,
                c.reason.as_deref().unwrap_or_default(),
                c.message.as_deref().unwrap_or_default()
            ))
            .with_sensitive(name.clone())
        })
        .collect()
}

fn is_unhealthy(condition: &NodeCondition) -> bool {
    match condition.type_.as_str() {
        "Ready" => condition.status != "True",
        kind if PRESSURE_CONDITIONS.contains(&kind) => condition.status == "True",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kinds::from_yaml;

    #[test]
    fn test_not_ready_and_pressure() {
        let node: Node = from_yaml(
            r#"
metadata:
  name: worker-2
status:
  conditions:
  - type: MemoryPressure
    status: "True"
    reason: KubeletHasInsufficientMemory
    message: kubelet has insufficient memory available
  - type: DiskPressure
    status: "False"
  - type: Ready
    status: Unknown
    reason: NodeStatusUnknown
    message: Kubelet stopped posting node status.
"#,
        );
        let failures = diagnose(&node);
        assert_eq!(failures.len(), 2);
        assert_eq!(
            failures[0].text,
            "worker-2 has condition of type MemoryPressure, reason KubeletHasInsufficientMemory: kubelet has insufficient memory available"
        );
        assert!(failures[1].text.starts_with("worker-2 has condition of type Ready"));
    }

    #[test]
    fn test_healthy_node() {
        let node: Node = from_yaml(
            r#"
metadata:
  name: worker-1
status:
  conditions:
  - type: Ready
    status: "True"
  - type: PIDPressure
    status: "False"
"#,
        );
        assert!(diagnose(&node).is_empty());
    }
}
