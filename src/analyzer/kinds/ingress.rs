use crate::analyzer::context::{AnalyzerContext, AnalyzerError};
use crate::analyzer::kinds::object_id;
use crate::analyzer::registry::Analyzer;
use crate::analyzer::types::{AnalysisResult, Failure};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, Service};
use k8s_openapi::api::networking::v1::{Ingress, IngressClass};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use kube::api::{Api, ListParams};
use std::collections::HashSet;

const CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

pub struct IngressAnalyzer;

/// Names of the objects an ingress may refer to.
#[derive(Debug, Default)]
pub struct IngressRefs {
    pub classes: HashSet<String>,
    /// (namespace, name)
    pub services: HashSet<(String, String)>,
    /// (namespace, name)
    pub secrets: HashSet<(String, String)>,
}

impl IngressRefs {
    async fn load(ctx: &AnalyzerContext) -> Result<Self, AnalyzerError> {
        let all = ListParams::default();
        let classes: Api<IngressClass> = ctx.cluster_api()?;
        let services: Api<Service> = ctx.namespaced_api()?;
        let secrets: Api<Secret> = ctx.namespaced_api()?;

        Ok(Self {
            classes: classes
                .list_metadata(&all)
                .await?
                .items
                .into_iter()
                .filter_map(|c| c.metadata.name)
                .collect(),
            services: services
                .list_metadata(&all)
                .await?
                .items
                .into_iter()
                .map(|s| scoped_name(s.metadata))
                .collect(),
            secrets: secrets
                .list_metadata(&all)
                .await?
                .items
                .into_iter()
                .map(|s| scoped_name(s.metadata))
                .collect(),
        })
    }
}

fn scoped_name(meta: ObjectMeta) -> (String, String) {
    (meta.namespace.unwrap_or_default(), meta.name.unwrap_or_default())
}

#[async_trait]
impl Analyzer for IngressAnalyzer {
    async fn analyze(&self, ctx: &AnalyzerContext) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let api: Api<Ingress> = ctx.namespaced_api()?;
        let ingresses = api.list(&ctx.list_params()).await?;
        if ingresses.items.is_empty() {
            return Ok(Vec::new());
        }
        let refs = IngressRefs::load(ctx).await?;

        Ok(ingresses
            .items
            .iter()
            .filter_map(|ingress| {
                let failures = diagnose(ingress, &refs, ctx);
                (!failures.is_empty()).then(|| {
                    let name = object_id(ingress);
                    AnalysisResult::new("Ingress", name.clone())
                        .with_failures(failures)
                        .with_parent(name)
                })
            })
            .collect())
    }
}

pub fn diagnose(ingress: &Ingress, refs: &IngressRefs, ctx: &AnalyzerContext) -> Vec<Failure> {
    let namespace = ingress.namespace().unwrap_or_default();
    let name = ingress.name_any();
    let Some(spec) = &ingress.spec else {
        return Vec::new();
    };
    let mut failures = Vec::new();

    let class = spec
        .ingress_class_name
        .clone()
        .or_else(|| ingress.annotations().get(CLASS_ANNOTATION).cloned());
    match class {
        None => failures.push(
            Failure::new(format!(
                "Ingress {}/{} does not specify an Ingress class.",
                namespace, name
            ))
            .with_documentation_opt(ctx.field_doc("Ingress", "spec.ingressClassName"))
            .with_sensitive(namespace.clone())
            .with_sensitive(name.clone()),
        ),
        Some(class) if !refs.classes.contains(&class) => failures.push(
            Failure::new(format!(
                "Ingress uses the ingress class {} which does not exist.",
                class
            ))
            .with_documentation_opt(ctx.field_doc("Ingress", "spec.ingressClassName"))
            .with_sensitive(class),
        ),
        Some(_) => {}
    }

    let mut backends: Vec<String> = Vec::new();
    if let Some(service) = spec.default_backend.as_ref().and_then(|b| b.service.as_ref()) {
        backends.push(service.name.clone());
    }
    for rule in spec.rules.iter().flatten() {
        let paths = rule.http.iter().flat_map(|h| h.paths.iter());
        for path in paths {
            if let Some(service) = &path.backend.service {
                backends.push(service.name.clone());
            }
        }
    }
    let mut seen = HashSet::new();
    for service in backends.into_iter().filter(|s| seen.insert(s.clone())) {
        if !refs.services.contains(&(namespace.clone(), service.clone())) {
            failures.push(
                Failure::new(format!(
                    "Ingress uses the service {}/{} which does not exist.",
                    namespace, service
                ))
                .with_documentation_opt(
                    ctx.field_doc("Ingress", "spec.rules.http.paths.backend.service"),
                )
                .with_sensitive(namespace.clone())
                .with_sensitive(service),
            );
        }
    }

    for secret in spec.tls.iter().flatten().filter_map(|t| t.secret_name.clone()) {
        if !refs.secrets.contains(&(namespace.clone(), secret.clone())) {
            failures.push(
                Failure::new(format!(
                    "Ingress uses the secret {}/{} as a TLS certificate which does not exist.",
                    namespace, secret
                ))
                .with_documentation_opt(ctx.field_doc("Ingress", "spec.tls.secretName"))
                .with_sensitive(namespace.clone())
                .with_sensitive(secret),
            );
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kinds::from_yaml;

    const INGRESS: &str = r#"
metadata:
  name: shop
  namespace: web
spec:
  ingressClassName: nginx
  tls:
  - hosts: ["shop.example.com"]
    secretName: shop-tls
  rules:
  - host: shop.example.com
    http:
      paths:
      - path: /
        pathType: Prefix
        backend:
          service:
            name: storefront
            port:
              number: 80
      - path: /api
        pathType: Prefix
        backend:
          service:
            name: storefront
            port:
              number: 80
"#;

    fn refs(classes: &[&str], services: &[&str], secrets: &[&str]) -> IngressRefs {
        let scoped = |names: &[&str]| {
            names
                .iter()
                .map(|n| ("web".to_string(), n.to_string()))
                .collect()
        };
        IngressRefs {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            services: scoped(services),
            secrets: scoped(secrets),
        }
    }

    #[test]
    fn test_all_references_resolve() {
        let ingress: Ingress = from_yaml(INGRESS);
        let refs = refs(&["nginx"], &["storefront"], &["shop-tls"]);
        assert!(diagnose(&ingress, &refs, &AnalyzerContext::offline()).is_empty());
    }

    #[test]
    fn test_missing_references() {
        let ingress: Ingress = from_yaml(INGRESS);
        let failures = diagnose(&ingress, &refs(&[], &[], &[]), &AnalyzerContext::offline());
        let texts: Vec<&str> = failures.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Ingress uses the ingress class nginx which does not exist.",
                "Ingress uses the service web/storefront which does not exist.",
                "Ingress uses the secret web/shop-tls as a TLS certificate which does not exist.",
            ]
        );
    }

    #[test]
    fn test_missing_class_with_doc() {
        let ingress: Ingress = from_yaml(
            r#"
metadata:
  name: bare
  namespace: web
spec:
  defaultBackend:
    service:
      name: storefront
      port:
        number: 80
"#,
        );
        let ctx = AnalyzerContext::offline().with_doc(true);
        let failures = diagnose(&ingress, &refs(&[], &["storefront"], &[]), &ctx);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].text, "Ingress web/bare does not specify an Ingress class.");
        assert!(failures[0].documentation_reference.is_some());
    }

    #[test]
    fn test_class_from_annotation() {
        let ingress: Ingress = from_yaml(
            r#"
metadata:
  name: legacy
  namespace: web
  annotations:
    kubernetes.io/ingress.class: traefik
spec: {}
"#,
        );
        let failures = diagnose(&ingress, &refs(&["traefik"], &[], &[]), &AnalyzerContext::offline());
        assert!(failures.is_empty());
    }
}
