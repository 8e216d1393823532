//! # Analyzer Module
//!
//! The diagnostic engine: a registry of per-kind analyzers, the run
//! orchestration that invokes them concurrently, owner-chain resolution, and
//! the report envelope with its formatters.
//!
//! A typical sweep:
//!
//! ```rust,no_run
//! use kubesweep::analyzer::{AnalyzerContext, Report, build_analyzer_map, render, run_analysis};
//!
//! # async fn sweep(client: kube::Client) -> Result<(), Box<dyn std::error::Error>> {
//! let analyzers = build_analyzer_map(&[]);
//! let ctx = AnalyzerContext::new(client).with_namespace(Some("default".to_string()));
//! let outcome = run_analysis(&[], &[], &analyzers, &ctx, 10).await;
//! let report = Report::new("", outcome.results.clone(), outcome.warnings());
//! print!("{}", String::from_utf8_lossy(&render(&report, "text")?));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod doc;
pub mod formatter;
pub mod kinds;
pub mod mask;
pub mod owner;
pub mod registry;
pub mod report;
pub mod run;
pub mod types;

pub use context::{AnalyzerContext, AnalyzerError, CancellationToken};
pub use formatter::{FormatError, OutputFormat, list_formats, render};
pub use owner::{OwnerLookup, OwnerResolver, Parent, resolve_parent};
pub use registry::{
    Analyzer, AnalyzerEntry, AnalyzerMap, additional_analyzers, build_analyzer_map,
    core_analyzers, list_filters,
};
pub use report::{Report, Status, derive_status};
pub use run::{AnalyzerFailure, RunOutcome, run_analysis, select_filters};
pub use types::{AnalysisResult, Failure, Sensitive};
