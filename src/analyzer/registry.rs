//! Analyzer registry.
//!
//! Filters are the names analyzers are registered and selected under. The
//! lookup table used by a run is an immutable [`AnalyzerMap`] composed from
//! three sources, later sources overriding earlier ones:
//!
//! 1. the core table (always available)
//! 2. the additional table
//! 3. the tables contributed by each active integration

use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds;
use crate::analyzer::types::AnalysisResult;
use crate::integration::Integration;
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A pluggable check for one resource kind.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Inspect the cluster and return one result per failing instance.
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError>;
}

/// A named analyzer binding contributed by one of the registry sources.
pub type AnalyzerEntry = (&'static str, Arc<dyn Analyzer>);

/// Merged filter-name to analyzer lookup table for a run.
#[derive(Clone, Default)]
pub struct AnalyzerMap {
    entries: BTreeMap<String, Arc<dyn Analyzer>>,
}

impl AnalyzerMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name, returning the analyzer it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Option<Arc<dyn Analyzer>> {
        self.entries.insert(name.into(), analyzer)
    }

    /// Overlay a whole source table. Later registrations win.
    pub fn overlay(&mut self, source: &str, entries: Vec<AnalyzerEntry>) {
        for (name, analyzer) in entries {
            if self.insert(name, analyzer).is_some() {
                warn!(
                    "Filter '{}' registered again by {}; the later registration wins",
                    name, source
                );
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Analyzer>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered filter names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Analyzer>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Arc<dyn Analyzer>)> for AnalyzerMap {
    fn from_iter<I: IntoIterator<Item = (String, Arc<dyn Analyzer>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Analyzers that are always available.
pub fn core_analyzers() -> Vec<AnalyzerEntry> {
    vec![
        ("Pod", Arc::new(kinds::pod::PodAnalyzer)),
        ("Deployment", Arc::new(kinds::deployment::DeploymentAnalyzer)),
        ("ReplicaSet", Arc::new(kinds::replicaset::ReplicaSetAnalyzer)),
        ("PersistentVolumeClaim", Arc::new(kinds::pvc::PvcAnalyzer)),
        ("Service", Arc::new(kinds::service::ServiceAnalyzer)),
        ("Ingress", Arc::new(kinds::ingress::IngressAnalyzer)),
        ("StatefulSet", Arc::new(kinds::statefulset::StatefulSetAnalyzer)),
        ("CronJob", Arc::new(kinds::cronjob::CronJobAnalyzer)),
        ("Node", Arc::new(kinds::node::NodeAnalyzer)),
    ]
}

/// Analyzers that are registered but listed separately from the core set.
pub fn additional_analyzers() -> Vec<AnalyzerEntry> {
    vec![
        ("HorizontalPodAutoscaler", Arc::new(kinds::hpa::HpaAnalyzer)),
        ("PodDisruptionBudget", Arc::new(kinds::pdb::PdbAnalyzer)),
        ("NetworkPolicy", Arc::new(kinds::netpol::NetworkPolicyAnalyzer)),
    ]
}

/// Core and additional filter names, each sorted.
pub fn list_filters() -> (Vec<String>, Vec<String>) {
    let sorted = |entries: Vec<AnalyzerEntry>| {
        let mut names: Vec<String> = entries.into_iter().map(|(n, _)| n.to_string()).collect();
        names.sort();
        names
    };
    (sorted(core_analyzers()), sorted(additional_analyzers()))
}

/// Compose the lookup table for a run from the fixed tables and the given integrations.
pub fn build_analyzer_map(integrations: &[&dyn Integration]) -> AnalyzerMap {
    let mut map = AnalyzerMap::new();
    map.overlay("core", core_analyzers());
    map.overlay("additional", additional_analyzers());
    for integration in integrations {
        let source = format!("integration '{}'", integration.name());
        map.overlay(&source, integration.analyzers());
    }
    debug!("Analyzer map built with {} filters", map.len());
    map
}
