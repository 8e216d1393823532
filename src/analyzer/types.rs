//! Shared result vocabulary for every analyzer.
//!
//! - `Failure` - one diagnosed problem on a resource instance
//! - `Sensitive` - an (unmasked, masked) value pair carried for downstream redaction
//! - `AnalysisResult` - the per-instance diagnosis that ends up in the report

use serde::{Deserialize, Serialize};

/// A value inside a failure text that can be redacted before leaving the process.
///
/// The engine only carries these pairs; it never rewrites `Failure::text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensitive {
    /// The literal value as it appears in the failure text.
    pub unmasked: String,
    /// Replacement value of the same length.
    pub masked: String,
}

impl Sensitive {
    /// Pair a value with a freshly generated mask.
    pub fn masked(value: impl Into<String>) -> Self {
        let unmasked = value.into();
        let masked = crate::analyzer::mask::mask_string(&unmasked);
        Self { unmasked, masked }
    }
}

/// One problem found on a resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    /// Human-readable description.
    pub text: String,
    /// Documentation of the schema field the failure is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_reference: Option<String>,
    /// Values in `text` that downstream consumers may want to redact.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitive_values: Vec<Sensitive>,
}

impl Failure {
    /// Create a failure with just a text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            documentation_reference: None,
            sensitive_values: Vec::new(),
        }
    }

    /// Attach a documentation reference.
    pub fn with_documentation(mut self, reference: impl Into<String>) -> Self {
        self.documentation_reference = Some(reference.into());
        self
    }

    /// Attach an optional documentation reference.
    pub fn with_documentation_opt(mut self, reference: Option<String>) -> Self {
        self.documentation_reference = reference;
        self
    }

    /// Mark a value appearing in the text as sensitive.
    ///
    /// Empty values are ignored since they cannot be located in the text.
    pub fn with_sensitive(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.sensitive_values.push(Sensitive::masked(value));
        }
        self
    }
}

impl From<String> for Failure {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Failure {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// The diagnosis of a single resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Logical kind, matching the filter name that produced it (e.g. "Pod").
    pub kind: String,
    /// `namespace/name`, or bare `name` for cluster-scoped kinds.
    pub name: String,
    /// Problems found on the instance.
    #[serde(default)]
    pub failures: Vec<Failure>,
    /// Free-text explanation, filled in by an explanation step outside the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Topmost owning controller, the object itself, or empty if never resolved.
    #[serde(default)]
    pub parent_object: String,
}

impl AnalysisResult {
    /// Create a result with no failures yet.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            failures: Vec::new(),
            details: None,
            parent_object: String::new(),
        }
    }

    /// Set the failures.
    pub fn with_failures(mut self, failures: Vec<Failure>) -> Self {
        self.failures = failures;
        self
    }

    /// Add a single failure.
    pub fn with_failure(mut self, failure: impl Into<Failure>) -> Self {
        self.failures.push(failure.into());
        self
    }

    /// Set the parent object identity.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_object = parent.into();
        self
    }

    /// Whether this result carries at least one failure.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Build the conventional `namespace/name` identifier.
pub fn namespaced_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}
