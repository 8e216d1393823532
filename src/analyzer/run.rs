//! Orchestration of a sweep: filter selection and analyzer execution.

use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::registry::AnalyzerMap;
use crate::analyzer::report::aggregate;
use crate::analyzer::types::AnalysisResult;
use futures_util::stream::{self, StreamExt};
use log::{debug, warn};
use std::collections::HashSet;
use std::fmt;

/// An analyzer that could not complete.
#[derive(Debug)]
pub struct AnalyzerFailure {
    /// Filter name of the analyzer.
    pub filter: String,
    /// What went wrong.
    pub error: AnalyzerError,
}

impl fmt::Display for AnalyzerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filter, self.error)
    }
}

/// Everything produced by one sweep, before rendering.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Results of every analyzer that ran, partitioned in selection order.
    pub results: Vec<AnalysisResult>,
    /// Analyzers that failed. Their failure does not affect other results.
    pub errors: Vec<AnalyzerFailure>,
    /// Filters that were selected for this run.
    pub analyzers_run: Vec<String>,
}

impl RunOutcome {
    /// Run-level errors rendered as report warnings.
    pub fn warnings(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Decide which filters run.
///
/// Explicit filters win over the persisted active list, which wins over
/// "everything registered". Names missing from the map are dropped and each
/// name is kept once, in first-seen order.
pub fn select_filters(explicit: &[String], persisted: &[String], analyzers: &AnalyzerMap) -> Vec<String> {
    let requested = if !explicit.is_empty() {
        debug!("Using explicit filters: {:?}", explicit);
        explicit
    } else if !persisted.is_empty() {
        debug!("Using persisted active filters: {:?}", persisted);
        persisted
    } else {
        debug!("No filters selected; running all {} analyzers", analyzers.len());
        return analyzers.names();
    };

    let mut seen = HashSet::new();
    requested
        .iter()
        .filter(|name| {
            let known = analyzers.contains(name);
            if !known {
                debug!("Ignoring unknown filter '{}'", name);
            }
            known
        })
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Run the selected analyzers, at most `max_concurrency` at a time.
pub async fn run_analysis(
    explicit: &[String],
    persisted: &[String],
    analyzers: &AnalyzerMap,
    ctx: &AnalyzerContext,
    max_concurrency: usize,
) -> RunOutcome {
    let selected = select_filters(explicit, persisted, analyzers);
    let limit = max_concurrency.max(1);

    let outputs: Vec<(String, Result<Vec<AnalysisResult>, AnalyzerError>)> =
        stream::iter(selected.iter().cloned())
            .map(|name| async move {
                let output = invoke(analyzers, &name, ctx).await;
                (name, output)
            })
            .buffered(limit)
            .collect()
            .await;

    let mut partitions = Vec::with_capacity(outputs.len());
    let mut errors = Vec::new();
    for (filter, output) in outputs {
        match output {
            Ok(results) => partitions.push(results),
            Err(error) => {
                warn!("Analyzer '{}' failed: {}", filter, error);
                errors.push(AnalyzerFailure { filter, error });
            }
        }
    }

    RunOutcome {
        results: aggregate(partitions),
        errors,
        analyzers_run: selected,
    }
}

async fn invoke(
    analyzers: &AnalyzerMap,
    name: &str,
    ctx: &AnalyzerContext,
) -> Result<Vec<AnalysisResult>, AnalyzerError> {
    ctx.check_cancelled()?;
    let Some(analyzer) = analyzers.get(name) else {
        return Ok(Vec::new());
    };
    debug!("Running analyzer '{}'", name);
    let results = analyzer.analyze(ctx).await?;
    // Analyzers should not emit empty results, but never let one reach the report.
    let results: Vec<AnalysisResult> = results.into_iter().filter(|r| r.has_failures()).collect();
    debug!("Analyzer '{}' produced {} result(s)", name, results.len());
    Ok(results)
}
