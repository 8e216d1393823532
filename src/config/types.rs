use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
}

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Filters run when none are given on the command line
    #[serde(default)]
    pub active_filters: Vec<String>,
    /// Upper bound on analyzers running at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Default output format
    #[serde(default = "default_output")]
    pub output: String,
}

/// Integration activation state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub active: Vec<String>,
}

/// Cluster connection defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,
}

fn default_max_concurrency() -> usize {
    10
}

fn default_output() -> String {
    "text".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            active_filters: Vec::new(),
            max_concurrency: default_max_concurrency(),
            output: default_output(),
        }
    }
}
