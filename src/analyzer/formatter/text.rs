//! Plain text formatter.

use crate::analyzer::report::Report;

/// Format a report as a human-oriented summary.
pub fn format(report: &Report) -> String {
    let mut output = String::new();

    let provider = if report.provider.is_empty() {
        "none"
    } else {
        report.provider.as_str()
    };
    output.push_str(&format!("AI Provider: {}\n", provider));

    if !report.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &report.warnings {
            output.push_str(&format!("- {}\n", warning));
        }
    }

    if report.results.is_empty() {
        output.push_str("\nNo problems detected\n");
        return output;
    }

    for (index, result) in report.results.iter().enumerate() {
        let parent = if result.parent_object.is_empty() {
            String::new()
        } else {
            format!("({})", result.parent_object)
        };
        output.push_str(&format!("\n{}: {} {}{}\n", index, result.kind, result.name, parent));

        for failure in &result.failures {
            output.push_str(&format!("- Error: {}\n", failure.text));
            if let Some(ref doc) = failure.documentation_reference {
                output.push_str(&format!("  Kubernetes Doc: {}\n", doc));
            }
        }

        if let Some(ref details) = result.details {
            output.push_str(&format!("{}\n", details));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::{AnalysisResult, Failure};

    #[test]
    fn test_no_problems() {
        let output = format(&Report::new("", vec![], vec![]));
        assert!(output.starts_with("AI Provider: none\n"));
        assert!(output.contains("No problems detected"));
        assert!(!output.contains("Warnings:"));
    }

    #[test]
    fn test_result_blocks() {
        let mut result = AnalysisResult::new("Pod", "default/crashloop-pod")
            .with_failure(Failure::new("container x is CrashLoopBackOff").with_documentation("doc"))
            .with_parent("Deployment/web");
        result.details = Some("Check the container logs.".to_string());
        let report = Report::new(
            "openai",
            vec![result, AnalysisResult::new("Node", "node-1").with_failure("Ready is False")],
            vec!["Ingress: forbidden".to_string()],
        );
        let output = format(&report);

        assert!(output.contains("AI Provider: openai"));
        assert!(output.contains("Warnings:\n- Ingress: forbidden\n"));
        assert!(output.contains("0: Pod default/crashloop-pod(Deployment/web)\n"));
        assert!(output.contains("- Error: container x is CrashLoopBackOff\n  Kubernetes Doc: doc\n"));
        assert!(output.contains("Check the container logs.\n"));
        assert!(output.contains("1: Node node-1\n"));
        assert!(!output.contains("No problems detected"));
    }
}
