//! Static field documentation attached to failures when `--with-doc` is set.

/// (kind, field path, documentation).
const FIELD_DOCS: &[(&str, &str, &str)] = &[
    (
        "Deployment",
        "spec.replicas",
        "replicas: Number of desired pods. This is a pointer to distinguish between explicit zero and not specified. Defaults to 1.",
    ),
    (
        "StatefulSet",
        "spec.serviceName",
        "serviceName: the name of the service that governs this StatefulSet. This service must exist before the StatefulSet and is responsible for the network identity of the set.",
    ),
    (
        "StatefulSet",
        "spec.volumeClaimTemplates",
        "volumeClaimTemplates: a list of claims that pods are allowed to reference. Every claim in this list must have at least one matching volumeMount in one container in the template.",
    ),
    (
        "Ingress",
        "spec.ingressClassName",
        "ingressClassName: the name of an IngressClass cluster resource. The associated IngressClass defines which controller will implement the resource.",
    ),
    (
        "Ingress",
        "spec.rules.http.paths.backend.service",
        "service: references a backend Service. The Service must exist in the same namespace as the Ingress object.",
    ),
    (
        "Ingress",
        "spec.tls.secretName",
        "secretName: the name of the secret used to terminate TLS traffic on port 443.",
    ),
    (
        "Service",
        "spec.selector",
        "selector: Route service traffic to pods with label keys and values matching this selector.",
    ),
    (
        "CronJob",
        "spec.suspend",
        "suspend: This flag tells the controller to suspend subsequent executions, it does not apply to already started executions. Defaults to false.",
    ),
    (
        "CronJob",
        "spec.schedule",
        "schedule: The schedule in Cron format, see https://en.wikipedia.org/wiki/Cron.",
    ),
    (
        "CronJob",
        "spec.startingDeadlineSeconds",
        "startingDeadlineSeconds: Optional deadline in seconds for starting the job if it misses scheduled time for any reason. Missed jobs executions will be counted as failed ones.",
    ),
    (
        "HorizontalPodAutoscaler",
        "spec.scaleTargetRef",
        "scaleTargetRef: points to the target resource to scale, and is used to the pods for which metrics should be collected, as well as to actually change the replica count.",
    ),
    (
        "PodDisruptionBudget",
        "spec.selector",
        "selector: Label query over pods whose evictions are managed by the disruption budget.",
    ),
    (
        "NetworkPolicy",
        "spec.podSelector",
        "podSelector: Selects the pods to which this NetworkPolicy object applies. An empty podSelector selects all pods in this namespace.",
    ),
];

/// Look up the documentation for a field of a kind.
pub fn field_doc(kind: &str, field: &str) -> Option<&'static str> {
    FIELD_DOCS
        .iter()
        .find(|(k, f, _)| *k == kind && *f == field)
        .map(|(_, _, doc)| *doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_field() {
        let doc = field_doc("Deployment", "spec.replicas").unwrap();
        assert!(doc.starts_with("replicas:"));
    }

    #[test]
    fn test_unknown_field() {
        assert!(field_doc("Pod", "spec.nothing").is_none());
    }
}
