use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::storage::v1::StorageClass;
use kube::ResourceExt;
use kube::api::{Api, ListParams};
use std::collections::HashSet;

pub struct StatefulSetAnalyzer;

/// Objects a stateful set may refer to.
#[derive(Debug, Default)]
pub struct StatefulSetRefs {
    /// (namespace, name)
    pub services: HashSet<(String, String)>,
    pub storage_classes: HashSet<String>,
}

#[async_trait]
impl Analyzer for StatefulSetAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<StatefulSet> = ctx.namespaced_api()?;
        let sets = api.list(&ctx.list_params()).await?;
        if sets.items.is_empty() {
            return Ok(Vec::new());
        }

        let all = ListParams::default();
        let services: Api<Service> = ctx.namespaced_api()?;
        let classes: Api<StorageClass> = ctx.cluster_api()?;
        let refs = StatefulSetRefs {
            services: services
                .list_metadata(&all)
                .await?
                .items
                .into_iter()
                .map(|s| {
                    (
                        s.metadata.namespace.unwrap_or_default(),
                        s.metadata.name.unwrap_or_default(),
                    )
                })
                .collect(),
            storage_classes: classes
                .list_metadata(&all)
                .await?
                .items
                .into_iter()
                .filter_map(|c| c.metadata.name)
                .collect(),
        };

        Ok(sets
            .items
            .iter()
            .filter_map(|set| {
                let failures = diagnose(set, &refs, ctx);
                (!failures.is_empty()).then(|| {
                    let name = object_id(set);
                    AnalysisResult::new("StatefulSet", name.clone())
                        .with_failures(failures)
                        .with_parent(name)
                })
            })
            .collect())
    }
}

pub fn diagnose(set: &StatefulSet, refs: &StatefulSetRefs, ctx: &AnalyzerContext) -> Vec<Failure> {
    let namespace = set.namespace().unwrap_or_default();
    let name = set.name_any();
    let Some(spec) = &set.spec else {
        return Vec::new();
    };
    let mut failures = Vec::new();

    let service: Option<String> = spec.service_name.clone().into();
    if let Some(service) = service.filter(|s| !s.is_empty()) {
        if !refs.services.contains(&(namespace.clone(), service.clone())) {
            failures.push(
                Failure::new(format!(
                    "StatefulSet uses the service {}/{} which does not exist.",
                    namespace, service
                ))
                .with_documentation_opt(ctx.field_doc("StatefulSet", "spec.serviceName"))
                .with_sensitive(namespace.clone())
                .with_sensitive(service),
            );
        }
    }

    let classes = spec
        .volume_claim_templates
        .iter()
        .flatten()
        .filter_map(|t| t.spec.as_ref().and_then(|s| s.storage_class_name.clone()));
    for class in classes {
        if !refs.storage_classes.contains(&class) {
            failures.push(
                Failure::new(format!(
                    "StatefulSet uses the storage class {} which does not exist.",
                    class
                ))
                .with_documentation_opt(ctx.field_doc("StatefulSet", "spec.volumeClaimTemplates"))
                .with_sensitive(class),
            );
        }
    }

    let desired = spec.replicas.unwrap_or(1);
    let ready = set
        .status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0);
    if desired != ready {
        failures.push(
            Failure::new(format!(
                "StatefulSet {}/{} has {} replicas but only {} are ready",
                namespace, name, desired, ready
            ))
            .with_sensitive(namespace.clone())
            .with_sensitive(name.clone()),
        );
    }

    failures
}
