//! Read-only run context shared by every analyzer in a sweep.

use crate::analyzer::doc;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::Event;
use kube::{
    Client, Resource,
    api::{Api, ListParams},
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Error type for a single analyzer invocation.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("No cluster connection available")]
    NoClusterConnection,

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Malformed {kind} '{name}': {reason}")]
    Malformed {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("Analysis failed: {0}")]
    Other(String),
}

/// Cooperative cancellation signal.
///
/// Cloning shares the underlying flag, so cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Everything an analyzer may read during a run.
#[derive(Clone)]
pub struct AnalyzerContext {
    client: Option<Client>,
    namespace: Option<String>,
    label_selector: Option<String>,
    with_doc: bool,
    cancel: CancellationToken,
}

impl AnalyzerContext {
    /// Context backed by a live cluster connection.
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
            ..Self::offline()
        }
    }

    /// Context without a cluster connection. Analyzers that need the API fail
    /// with `AnalyzerError::NoClusterConnection`.
    pub fn offline() -> Self {
        Self {
            client: None,
            namespace: None,
            label_selector: None,
            with_doc: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Restrict namespaced listings to one namespace (None = all namespaces).
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    /// Apply a label selector to every listing.
    pub fn with_label_selector(mut self, selector: Option<String>) -> Self {
        self.label_selector = selector.filter(|s| !s.is_empty());
        self
    }

    /// Attach documentation references to failures.
    pub fn with_doc(mut self, with_doc: bool) -> Self {
        self.with_doc = with_doc;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn label_selector(&self) -> Option<&str> {
        self.label_selector.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The cluster client, or an error when running offline.
    pub fn client(&self) -> Result<&Client, AnalyzerError> {
        self.client
            .as_ref()
            .ok_or(AnalyzerError::NoClusterConnection)
    }

    /// Fail fast once the run has been cancelled.
    pub fn check_cancelled(&self) -> Result<(), AnalyzerError> {
        if self.cancel.is_cancelled() {
            Err(AnalyzerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// List parameters carrying the run's label selector.
    pub fn list_params(&self) -> ListParams {
        match &self.label_selector {
            Some(selector) => ListParams::default().labels(selector),
            None => ListParams::default(),
        }
    }

    /// Api for a namespaced kind, scoped to the run's namespace if one is set.
    pub fn namespaced_api<K>(&self) -> Result<Api<K>, AnalyzerError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let client = self.client()?.clone();
        Ok(match &self.namespace {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::all(client),
        })
    }

    /// Api for a namespaced kind in an explicit namespace.
    pub fn api_in<K>(&self, namespace: &str) -> Result<Api<K>, AnalyzerError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        Ok(Api::namespaced(self.client()?.clone(), namespace))
    }

    /// Api for a cluster-scoped kind, or for listing across all namespaces.
    pub fn cluster_api<K>(&self) -> Result<Api<K>, AnalyzerError>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        Ok(Api::all(self.client()?.clone()))
    }

    /// Most recent event recorded against an object, if any.
    pub async fn latest_event(
        &self,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> Result<Option<Event>, AnalyzerError> {
        let events: Api<Event> = self.api_in(namespace)?;
        let params = ListParams::default().fields(&format!(
            "involvedObject.name={},involvedObject.kind={}",
            name, kind
        ));
        let list = events.list(&params).await?;
        Ok(list
            .items
            .into_iter()
            .max_by_key(|event| event.last_timestamp.clone()))
    }

    /// Documentation snippet for a field, only when the run asked for docs.
    pub fn field_doc(&self, kind: &str, field: &str) -> Option<String> {
        if self.with_doc {
            doc::field_doc(kind, field).map(str::to_string)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_context_has_no_client() {
        let ctx = AnalyzerContext::offline();
        assert!(matches!(ctx.client(), Err(AnalyzerError::NoClusterConnection)));
    }

    #[test]
    fn test_cancellation_shared_between_clones() {
        let token = CancellationToken::new();
        let ctx = AnalyzerContext::offline().with_cancellation(token.clone());
        assert!(ctx.check_cancelled().is_ok());
        token.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(AnalyzerError::Cancelled)));
    }

    #[test]
    fn test_empty_namespace_means_all() {
        let ctx = AnalyzerContext::offline()
            .with_namespace(Some(String::new()))
            .with_label_selector(Some("app=web".to_string()));
        assert_eq!(ctx.namespace(), None);
        assert_eq!(ctx.label_selector(), Some("app=web"));
        assert_eq!(ctx.list_params().label_selector.as_deref(), Some("app=web"));
    }

    #[test]
    fn test_field_doc_only_with_doc() {
        let ctx = AnalyzerContext::offline();
        assert!(ctx.field_doc("Deployment", "spec.replicas").is_none());
        let ctx = ctx.with_doc(true);
        assert!(ctx.field_doc("Deployment", "spec.replicas").is_some());
    }
}
