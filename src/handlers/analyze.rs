use crate::analyzer::formatter::{FormatError, OutputFormat, list_formats, render};
use crate::analyzer::{AnalyzerContext, CancellationToken, Report, build_analyzer_map, run_analysis};
use crate::cluster;
use crate::config::types::Config;
use crate::error::KubeSweepError;
use crate::integration::active_integrations;
use log::{info, warn};
use std::io::Write;

/// Options for the analyze command.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub filters: Vec<String>,
    pub namespace: Option<String>,
    pub selector: Option<String>,
    pub output: Option<String>,
    pub max_concurrency: Option<usize>,
    pub with_doc: bool,
    pub context: Option<String>,
    pub fail_on_problems: bool,
}

/// Pick the output format: the command line wins over the config file.
pub fn resolve_format(requested: Option<&str>, configured: &str) -> Result<OutputFormat, FormatError> {
    let name = requested.unwrap_or(configured);
    OutputFormat::parse(name).ok_or_else(|| FormatError::Unsupported {
        requested: name.to_string(),
        supported: list_formats().iter().map(|f| f.to_string()).collect(),
    })
}

pub async fn handle_analyze(options: AnalyzeOptions, config: &Config) -> crate::Result<()> {
    // Fail on a bad format before touching the cluster.
    let format = resolve_format(options.output.as_deref(), &config.analysis.output)?;

    let context = options
        .context
        .as_deref()
        .or(config.kubernetes.context.as_deref());
    let client = cluster::connect(context, config.kubernetes.kubeconfig.as_deref()).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; skipping remaining analyzers");
            on_interrupt.cancel();
        }
    });

    let ctx = AnalyzerContext::new(client)
        .with_namespace(options.namespace)
        .with_label_selector(options.selector)
        .with_doc(options.with_doc)
        .with_cancellation(cancel);

    let integrations = active_integrations(&config.integrations.active);
    let analyzers = build_analyzer_map(&integrations);
    let max_concurrency = options
        .max_concurrency
        .unwrap_or(config.analysis.max_concurrency);

    let outcome = run_analysis(
        &options.filters,
        &config.analysis.active_filters,
        &analyzers,
        &ctx,
        max_concurrency,
    )
    .await;
    info!(
        "Ran {} analyzer(s): {} result(s), {} error(s)",
        outcome.analyzers_run.len(),
        outcome.results.len(),
        outcome.errors.len()
    );

    let warnings = outcome.warnings();
    let report = Report::new("", outcome.results, warnings);
    let bytes = render(&report, format.as_str())?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;

    if options.fail_on_problems && !report.is_ok() {
        return Err(KubeSweepError::ProblemsDetected(report.problem_count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_format_wins_over_config() {
        assert_eq!(resolve_format(Some("json"), "text").unwrap(), OutputFormat::Json);
        assert_eq!(resolve_format(None, "text").unwrap(), OutputFormat::Text);
    }

    #[test]
    fn test_bad_configured_format() {
        let err = resolve_format(None, "yaml").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("yaml"));
        assert!(message.contains("json, text"));
    }
}
