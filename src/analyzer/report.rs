//! Run-level report and status derivation.

use crate::analyzer::types::AnalysisResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall health of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    ProblemDetected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ProblemDetected => "ProblemDetected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concatenate per-analyzer outputs in order. Nothing is merged or deduplicated.
pub fn aggregate(per_analyzer: Vec<Vec<AnalysisResult>>) -> Vec<AnalysisResult> {
    per_analyzer.into_iter().flatten().collect()
}

/// Total number of failures across all results.
pub fn problem_count(results: &[AnalysisResult]) -> usize {
    results.iter().map(|r| r.failures.len()).sum()
}

/// `Ok` when no result carries a failure.
pub fn derive_status(results: &[AnalysisResult]) -> Status {
    if problem_count(results) == 0 {
        Status::Ok
    } else {
        Status::ProblemDetected
    }
}

/// The envelope rendered at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Explanation backend that filled `details`, empty when none was used.
    #[serde(default)]
    pub provider: String,
    pub status: Status,
    pub problem_count: usize,
    #[serde(default)]
    pub results: Vec<AnalysisResult>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Report {
    /// Build a report, deriving status and problem count from `results`.
    pub fn new(provider: impl Into<String>, results: Vec<AnalysisResult>, warnings: Vec<String>) -> Self {
        Self {
            provider: provider.into(),
            status: derive_status(&results),
            problem_count: problem_count(&results),
            results,
            warnings,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::Failure;
    use proptest::prelude::*;

    fn result(name: &str, failures: usize) -> AnalysisResult {
        AnalysisResult::new("Pod", name)
            .with_failures((0..failures).map(|i| Failure::new(format!("failure {}", i))).collect())
    }

    #[test]
    fn test_empty_is_ok() {
        assert_eq!(derive_status(&[]), Status::Ok);
        let report = Report::new("", vec![], vec![]);
        assert!(report.is_ok());
        assert_eq!(report.problem_count, 0);
    }

    #[test]
    fn test_problem_count_counts_failures_not_results() {
        let results = vec![result("default/a", 3), result("default/b", 1)];
        let report = Report::new("", results, vec![]);
        assert_eq!(report.problem_count, 4);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.status, Status::ProblemDetected);
    }

    #[test]
    fn test_aggregate_keeps_duplicates_across_analyzers() {
        let merged = aggregate(vec![
            vec![result("default/data", 1)],
            vec![],
            vec![result("default/data", 2)],
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].failures.len(), 2);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Status::Ok).unwrap(), "\"OK\"");
        assert_eq!(
            serde_json::to_string(&Status::ProblemDetected).unwrap(),
            "\"ProblemDetected\""
        );
    }

    proptest! {
        #[test]
        fn prop_status_idempotent_and_count_exact(counts in proptest::collection::vec(0usize..4, 0..12)) {
            let results: Vec<AnalysisResult> = counts
                .iter()
                .enumerate()
                .map(|(i, n)| result(&format!("ns/obj-{}", i), *n))
                .collect();
            let first = derive_status(&results);
            prop_assert_eq!(first, derive_status(&results));
            let total: usize = counts.iter().sum();
            prop_assert_eq!(problem_count(&results), total);
            prop_assert_eq!(first == Status::Ok, total == 0);
        }
    }
}
