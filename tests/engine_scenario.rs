//! End-to-end sweeps through the public API with in-memory analyzers.

use async_trait::async_trait;
use kubesweep::analyzer::{
    AnalysisResult, Analyzer, AnalyzerContext, AnalyzerError, AnalyzerMap, Failure, Report,
    Status, render, run_analysis,
};
use std::sync::Arc;

struct BrokenPods;

#[async_trait]
impl Analyzer for BrokenPods {
    async fn analyze(&self, _ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        Ok(vec![
            AnalysisResult::new("Pod", "default/web-5d9-abc")
                .with_failure("back-off 5m0s restarting failed container=web")
                .with_parent("Deployment/web"),
        ])
    }
}

struct EmptyService;

#[async_trait]
impl Analyzer for EmptyService {
    async fn analyze(&self, _ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        Ok(vec![
            AnalysisResult::new("Service", "default/api")
                .with_failure(
                    Failure::new("Service has no endpoints, expected label app=api")
                        .with_sensitive("app")
                        .with_sensitive("api"),
                )
                .with_parent("default/api"),
        ])
    }
}

struct Forbidden;

#[async_trait]
impl Analyzer for Forbidden {
    async fn analyze(&self, _ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        Err(AnalyzerError::Other("nodes is forbidden".to_string()))
    }
}

struct CrashLoopPod;

#[async_trait]
impl Analyzer for CrashLoopPod {
    async fn analyze(&self, _ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        Ok(vec![
            AnalysisResult::new("Pod", "default/crashloop-pod")
                .with_failure("back-off 5m0s restarting failed container=app"),
        ])
    }
}

struct HealthyServices;

#[async_trait]
impl Analyzer for HealthyServices {
    async fn analyze(&self, _ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        Ok(Vec::new())
    }
}

fn analyzers() -> AnalyzerMap {
    let mut map = AnalyzerMap::new();
    map.insert("Pod", Arc::new(BrokenPods));
    map.insert("Service", Arc::new(EmptyService));
    map.insert("Node", Arc::new(Forbidden));
    map
}

#[tokio::test]
async fn sweep_reports_problems_and_warnings() {
    let outcome = run_analysis(&[], &[], &analyzers(), &AnalyzerContext::offline(), 4).await;
    assert_eq!(outcome.analyzers_run, vec!["Node", "Pod", "Service"]);

    let report = Report::new("", outcome.results.clone(), outcome.warnings());
    assert_eq!(report.status, Status::ProblemDetected);
    assert_eq!(report.problem_count, 2);
    assert_eq!(report.warnings, vec!["Node: Analysis failed: nodes is forbidden"]);

    let text = String::from_utf8(render(&report, "text").unwrap()).unwrap();
    assert!(text.contains("0: Pod default/web-5d9-abc(Deployment/web)"));
    assert!(text.contains("1: Service default/api(default/api)"));
    assert!(text.contains("- Error: Service has no endpoints, expected label app=api"));
    assert!(text.contains("nodes is forbidden"));

    let json = render(&report, "json").unwrap();
    let decoded: Report = serde_json::from_slice(&json).unwrap();
    assert_eq!(decoded, report);
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["status"], "ProblemDetected");
    assert_eq!(value["results"][1]["failures"][0]["sensitiveValues"][0]["unmasked"], "app");
}

#[tokio::test]
async fn persisted_filters_restrict_the_sweep() {
    let persisted = vec!["Service".to_string()];
    let outcome = run_analysis(&[], &persisted, &analyzers(), &AnalyzerContext::offline(), 1).await;
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].kind, "Service");
}

#[tokio::test]
async fn clean_sweep_is_ok() {
    let explicit = vec!["NoSuchKind".to_string()];
    let outcome = run_analysis(&explicit, &[], &analyzers(), &AnalyzerContext::offline(), 2).await;
    let warnings = outcome.warnings();
    let report = Report::new("", outcome.results, warnings);
    assert!(report.is_ok());

    let text = String::from_utf8(render(&report, "text").unwrap()).unwrap();
    assert!(text.contains("No problems detected"));

    let err = render(&report, "yaml").unwrap_err();
    assert!(err.to_string().contains("json, text"));
}

#[tokio::test]
async fn only_failing_objects_are_reported() {
    let mut map = AnalyzerMap::new();
    map.insert("Pod", Arc::new(CrashLoopPod));
    map.insert("Service", Arc::new(HealthyServices));

    let outcome = run_analysis(&[], &[], &map, &AnalyzerContext::offline(), 2).await;
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.analyzers_run, vec!["Pod", "Service"]);

    let warnings = outcome.warnings();
    let report = Report::new("", outcome.results, warnings);
    assert_eq!(report.status, Status::ProblemDetected);
    assert_eq!(report.problem_count, 1);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].kind, "Pod");
    assert_eq!(report.results[0].name, "default/crashloop-pod");

    let value: serde_json::Value = serde_json::from_slice(&render(&report, "json").unwrap()).unwrap();
    assert_eq!(value["problemCount"], 1);
    assert_eq!(value["results"].as_array().map(Vec::len), Some(1));
}
