//! JSON formatter.

use crate::analyzer::formatter::FormatError;
use crate::analyzer::report::Report;

/// Encode a report as pretty-printed JSON.
pub fn format(report: &Report) -> Result<Vec<u8>, FormatError> {
    let mut bytes = serde_json::to_vec_pretty(report)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::{AnalysisResult, Failure};

    #[test]
    fn test_field_names() {
        let report = Report::new(
            "",
            vec![AnalysisResult::new("Ingress", "default/web").with_failure(
                Failure::new("Ingress default/web does not specify an Ingress class.")
                    .with_documentation("ingressClassName: ..."),
            )],
            vec![],
        );
        let value: serde_json::Value = serde_json::from_slice(&format(&report).unwrap()).unwrap();
        assert_eq!(value["status"], "ProblemDetected");
        assert_eq!(value["problemCount"], 1);
        assert_eq!(value["provider"], "");
        assert_eq!(value["results"][0]["kind"], "Ingress");
        assert_eq!(
            value["results"][0]["failures"][0]["documentationReference"],
            "ingressClassName: ..."
        );
        assert!(value["warnings"].as_array().unwrap().is_empty());
    }
}
