//! Output formatters for sweep reports.

pub mod json;
pub mod text;

use crate::analyzer::report::Report;

/// Names accepted by [`render`], in display order.
const FORMATS: &[&str] = &["json", "text"];

/// Rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unsupported output format '{requested}'; supported formats: {}", .supported.join(", "))]
    Unsupported {
        requested: String,
        supported: Vec<String>,
    },

    #[error("failed to encode report as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-oriented multi-line summary.
    #[default]
    Text,
    /// Structural encoding of the report.
    Json,
}

impl OutputFormat {
    /// Parse from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

/// Supported format names, for CLI help and error messages.
pub fn list_formats() -> &'static [&'static str] {
    FORMATS
}

/// Render a report in the named format.
///
/// The whole output is built in memory, so a failure never leaves partial output behind.
pub fn render(report: &Report, format: &str) -> Result<Vec<u8>, FormatError> {
    let format = OutputFormat::parse(format).ok_or_else(|| FormatError::Unsupported {
        requested: format.to_string(),
        supported: FORMATS.iter().map(|f| f.to_string()).collect(),
    })?;
    match format {
        OutputFormat::Json => json::format(report),
        OutputFormat::Text => Ok(text::format(report).into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::AnalysisResult;

    fn sample() -> Report {
        Report::new(
            "",
            vec![
                AnalysisResult::new("Pod", "default/crashloop-pod")
                    .with_failure("container x is CrashLoopBackOff")
                    .with_parent("Deployment/web"),
            ],
            vec!["NetworkPolicy: Kubernetes API error: forbidden".to_string()],
        )
    }

    #[test]
    fn test_list_formats() {
        assert_eq!(list_formats(), &["json", "text"]);
        for name in list_formats() {
            assert_eq!(OutputFormat::parse(name).unwrap().as_str(), *name);
        }
    }

    #[test]
    fn test_unknown_format_names_request_and_supported_set() {
        let err = render(&sample(), "bogus").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bogus"));
        assert!(message.contains("json"));
        assert!(message.contains("text"));
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample();
        let bytes = render(&report, "json").unwrap();
        let decoded: Report = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.status, report.status);
        assert_eq!(decoded.problem_count, report.problem_count);
        assert_eq!(decoded.results.len(), report.results.len());
        assert_eq!(decoded, report);
    }

    #[test]
    fn test_format_name_case_insensitive() {
        assert!(render(&sample(), "JSON").is_ok());
    }
}
