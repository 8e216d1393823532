//! CronJob analyzer.
//!
//! Schedules are checked against the standard five-field cron syntax the
//! CronJob controller accepts, including `@` macros and a `TZ=`/`CRON_TZ=`
//! prefix.

use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::CronJob;
use kube::ResourceExt;
use kube::api::Api;
use regex::Regex;
use std::sync::OnceLock;

pub struct CronJobAnalyzer;

#[async_trait]
impl Analyzer for CronJobAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<CronJob> = ctx.namespaced_api()?;
        let jobs = api.list(&ctx.list_params()).await?;

        Ok(jobs
            .items
            .iter()
            .filter_map(|job| {
                let failures = diagnose(job, ctx);
                (!failures.is_empty()).then(|| {
                    let name = object_id(job);
                    AnalysisResult::new("CronJob", name.clone())
                        .with_failures(failures)
                        .with_parent(name)
                })
            })
            .collect())
    }
}

pub fn diagnose(job: &CronJob, ctx: &AnalyzerContext) -> Vec<Failure> {
    let name = job.name_any();
    let Some(spec) = &job.spec else {
        return Vec::new();
    };
    let mut failures = Vec::new();

    if spec.suspend == Some(true) {
        failures.push(
            Failure::new(format!("CronJob {} is suspended", name))
                .with_documentation_opt(ctx.field_doc("CronJob", "spec.suspend"))
                .with_sensitive(name.clone()),
        );
        return failures;
    }

    if let Err(reason) = validate_schedule(&spec.schedule) {
        failures.push(
            Failure::new(format!(
                "CronJob {} has an invalid schedule: {}",
                name, reason
            ))
            .with_documentation_opt(ctx.field_doc("CronJob", "spec.schedule"))
            .with_sensitive(name.clone()),
        );
    }

    if spec.starting_deadline_seconds.is_some_and(|s| s < 0) {
        failures.push(
            Failure::new(format!(
                "CronJob {} has a negative starting deadline",
                name
            ))
            .with_documentation_opt(ctx.field_doc("CronJob", "spec.startingDeadlineSeconds"))
            .with_sensitive(name),
        );
    }

    failures
}

// ============================================================================
// Schedule validation
// ============================================================================

const MACROS: &[&str] = &[
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

const MONTHS: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAYS: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

struct Field {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
}

const FIELDS: [Field; 5] = [
    Field { name: "minute", min: 0, max: 59, names: &[] },
    Field { name: "hour", min: 0, max: 23, names: &[] },
    Field { name: "day of month", min: 1, max: 31, names: &[] },
    Field { name: "month", min: 1, max: 12, names: MONTHS },
    Field { name: "day of week", min: 0, max: 6, names: WEEKDAYS },
];

fn item_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:(\*|\?)|([0-9A-Za-z]+)(?:-([0-9A-Za-z]+))?)(?:/([0-9]+))?$").ok()
        })
        .as_ref()
}

fn every_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^@every\s+([0-9]+(\.[0-9]+)?(ns|us|µs|ms|s|m|h))+$").ok())
        .as_ref()
}

/// Check a cron schedule, returning a reason when it is not accepted.
pub fn validate_schedule(schedule: &str) -> Result<(), String> {
    let mut schedule = schedule.trim();
    if schedule.starts_with("TZ=") || schedule.starts_with("CRON_TZ=") {
        schedule = match schedule.split_once(char::is_whitespace) {
            Some((_, rest)) => rest.trim_start(),
            None => return Err("missing schedule after time zone".to_string()),
        };
    }
    if schedule.is_empty() {
        return Err("empty schedule".to_string());
    }

    if schedule.starts_with('@') {
        if MACROS.contains(&schedule) || every_pattern().is_some_and(|re| re.is_match(schedule)) {
            return Ok(());
        }
        return Err(format!("unrecognized descriptor: {}", schedule));
    }

    let fields: Vec<&str> = schedule.split_whitespace().collect();
    if fields.len() != FIELDS.len() {
        return Err(format!(
            "expected exactly {} fields, found {}: {}",
            FIELDS.len(),
            fields.len(),
            schedule
        ));
    }
    for (value, field) in fields.iter().zip(FIELDS.iter()) {
        validate_field(value, field)?;
    }
    Ok(())
}

fn validate_field(value: &str, field: &Field) -> Result<(), String> {
    for item in value.split(',') {
        let captures = item_pattern()
            .and_then(|re| re.captures(item))
            .ok_or_else(|| format!("invalid {} value: {}", field.name, item))?;

        if captures.get(1).is_none() {
            let start = parse_value(captures.get(2).map_or("", |m| m.as_str()), field)?;
            if let Some(end) = captures.get(3) {
                let end = parse_value(end.as_str(), field)?;
                if end < start {
                    return Err(format!(
                        "beginning of range ({}) beyond end of range ({}): {}",
                        start, end, item
                    ));
                }
            }
        }

        if let Some(step) = captures.get(4) {
            match step.as_str().parse::<u32>() {
                Ok(step) if step > 0 => {}
                _ => return Err(format!("step of range should be a positive number: {}", item)),
            }
        }
    }
    Ok(())
}

fn parse_value(raw: &str, field: &Field) -> Result<u32, String> {
    let position = field
        .names
        .iter()
        .position(|n| n.eq_ignore_ascii_case(raw));
    let value = match position {
        Some(index) => index as u32 + field.min,
        None => raw
            .parse::<u32>()
            .map_err(|_| format!("failed to parse {} value: {}", field.name, raw))?,
    };
    if value < field.min || value > field.max {
        return Err(format!(
            "{} value ({}) out of range [{}, {}]",
            field.name, value, field.min, field.max
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kinds::from_yaml;

    fn job(schedule: &str, extra: &str) -> CronJob {
        from_yaml(&format!(
            r#"
metadata:
  name: backup
  namespace: ops
spec:
  schedule: "{}"
{}
  jobTemplate:
    spec:
      template:
        spec:
          restartPolicy: OnFailure
          containers:
          - name: backup
            image: backup:1
"#,
            schedule, extra
        ))
    }

    #[test]
    fn test_valid_schedules() {
        for schedule in [
            "*/5 * * * *",
            "0 3 * * 1-5",
            "30 2 1,15 * *",
            "0 0 * JAN,jul SUN",
            "0 12 ? * MON-FRI",
            "@hourly",
            "@every 1h30m",
            "TZ=Europe/Berlin 0 6 * * *",
            "CRON_TZ=UTC @daily",
        ] {
            assert!(validate_schedule(schedule).is_ok(), "{} should be valid", schedule);
        }
    }

    #[test]
    fn test_invalid_schedules() {
        for schedule in [
            "",
            "* * * *",
            "60 * * * *",
            "* 24 * * *",
            "* * 0 * *",
            "* * * 13 *",
            "* * * * 7",
            "5-1 * * * *",
            "*/0 * * * *",
            "@fortnightly",
            "TZ=UTC",
            "every day",
        ] {
            assert!(validate_schedule(schedule).is_err(), "{} should be invalid", schedule);
        }
    }

    #[test]
    fn test_suspended_job() {
        let failures = diagnose(&job("0 * * * *", "  suspend: true"), &AnalyzerContext::offline());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].text, "CronJob backup is suspended");
        assert!(failures[0].documentation_reference.is_none());

        let ctx = AnalyzerContext::offline().with_doc(true);
        let failures = diagnose(&job("0 * * * *", "  suspend: true"), &ctx);
        let doc = failures[0].documentation_reference.as_deref().unwrap();
        assert!(doc.starts_with("suspend:"));
    }

    #[test]
    fn test_invalid_schedule_and_negative_deadline() {
        let ctx = AnalyzerContext::offline().with_doc(true);
        let failures = diagnose(&job("61 * * * *", "  startingDeadlineSeconds: -10"), &ctx);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].text.starts_with("CronJob backup has an invalid schedule: minute value (61)"));
        assert!(failures[0].documentation_reference.is_some());
        assert_eq!(failures[1].text, "CronJob backup has a negative starting deadline");
    }

    #[test]
    fn test_healthy_job() {
        assert!(diagnose(&job("0 2 * * *", ""), &AnalyzerContext::offline()).is_empty());
    }
}
