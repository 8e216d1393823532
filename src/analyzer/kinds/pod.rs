//! Pod analyzer.
//!
//! Reports pods that cannot be scheduled, containers stuck waiting in an error
//! state, and containers that were last killed for running out of memory.

use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::owner::resolve_parent;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ContainerStatus, Pod};
use kube::api::Api;

/// Waiting reasons that indicate the container cannot start.
const WAITING_ERROR_REASONS: &[&str] = &[
    "CrashLoopBackOff",
    "ImagePullBackOff",
    "ErrImagePull",
    "ErrImageNeverPull",
    "InvalidImageName",
    "ImageInspectError",
    "CreateContainerConfigError",
    "CreateContainerError",
    "PreCreateHookError",
    "PreStartHookError",
    "RunContainerError",
];

pub struct PodAnalyzer;

#[async_trait]
impl Analyzer for PodAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<Pod> = ctx.namespaced_api()?;
        let client = ctx.client()?;
        let pods = api.list(&ctx.list_params()).await?;

        let mut results = Vec::new();
        for pod in pods.items {
            ctx.check_cancelled()?;
            let failures = diagnose(&pod);
            if failures.is_empty() {
                continue;
            }
            let parent = resolve_parent(client, &pod.metadata).await;
            results.push(
                AnalysisResult::new("Pod", object_id(&pod))
                    .with_failures(failures)
                    .with_parent(parent.identity),
            );
        }
        Ok(results)
    }
}

/// Failures for a single pod.
pub fn diagnose(pod: &Pod) -> Vec<Failure> {
    let Some(status) = &pod.status else {
        return Vec::new();
    };
    let mut failures = Vec::new();

    if status.phase.as_deref() == Some("Pending") {
        for condition in status.conditions.iter().flatten() {
            if condition.type_ == "PodScheduled"
                && condition.reason.as_deref() == Some("Unschedulable")
            {
                if let Some(message) = condition.message.as_deref().filter(|m| !m.is_empty()) {
                    failures.push(Failure::new(message));
                }
            }
        }
    }

    let containers = status
        .init_container_statuses
        .iter()
        .flatten()
        .chain(status.container_statuses.iter().flatten());
    for container in containers {
        failures.extend(diagnose_container(container));
    }

    failures
}

fn diagnose_container(status: &ContainerStatus) -> Vec<Failure> {
    let mut failures = Vec::new();

    let waiting = status.state.as_ref().and_then(|s| s.waiting.as_ref());
    if let Some(waiting) = waiting {
        let reason = waiting.reason.as_deref().unwrap_or_default();
        if WAITING_ERROR_REASONS.contains(&reason) {
            let text = match waiting.message.as_deref().filter(|m| !m.is_empty()) {
                Some(message) => message.to_string(),
                None => format!("the container {} is in {} state", status.name, reason),
            };
            failures.push(Failure::new(text));
        }
    }

    let last_terminated = status.last_state.as_ref().and_then(|s| s.terminated.as_ref());
    if let Some(terminated) = last_terminated {
        if terminated.reason.as_deref() == Some("OOMKilled") {
            failures.push(Failure::new(format!(
                "the last termination reason of container {} is OOMKilled (restarted {} times)",
                status.name, status.restart_count
            )));
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kinds::from_yaml;

    #[test]
    fn test_crashloop_detected() {
        let pod: Pod = from_yaml(
            r#"
apiVersion: v1
kind: Pod
metadata:
  name: crashloop-pod
  namespace: default
status:
  phase: Running
  containerStatuses:
  - name: x
    image: busybox
    imageID: ""
    ready: false
    restartCount: 7
    state:
      waiting:
        reason: CrashLoopBackOff
        message: back-off 5m0s restarting failed container=x pod=crashloop-pod
"#,
        );
        let failures = diagnose(&pod);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].text.contains("back-off 5m0s"));
    }

    #[test]
    fn test_waiting_without_message_uses_reason() {
        let pod: Pod = from_yaml(
            r#"
metadata:
  name: bad-image
status:
  phase: Pending
  initContainerStatuses:
  - name: init
    image: nope
    imageID: ""
    ready: false
    restartCount: 0
    state:
      waiting:
        reason: InvalidImageName
"#,
        );
        let failures = diagnose(&pod);
        assert_eq!(failures[0].text, "the container init is in InvalidImageName state");
    }

    #[test]
    fn test_unschedulable_and_oom() {
        let pod: Pod = from_yaml(
            r#"
metadata:
  name: hungry
status:
  phase: Pending
  conditions:
  - type: PodScheduled
    status: "False"
    reason: Unschedulable
    message: "0/3 nodes are available: 3 Insufficient memory."
  containerStatuses:
  - name: app
    image: app
    imageID: ""
    ready: false
    restartCount: 2
    lastState:
      terminated:
        exitCode: 137
        reason: OOMKilled
"#,
        );
        let failures = diagnose(&pod);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].text.contains("Insufficient memory"));
        assert!(failures[1].text.contains("OOMKilled"));
    }

    #[test]
    fn test_healthy_pod() {
        let pod: Pod = from_yaml(
            r#"
metadata:
  name: fine
status:
  phase: Running
  containerStatuses:
  - name: app
    image: app
    imageID: ""
    ready: true
    restartCount: 0
    state:
      running: {}
"#,
        );
        assert!(diagnose(&pod).is_empty());
    }

    #[tokio::test]
    async fn test_offline_context_errors() {
        let err = PodAnalyzer.analyze(&AnalyzerContext::offline()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::NoClusterConnection));
    }
}
