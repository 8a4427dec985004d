use crate::error::AuditError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kinds whose pod template is audited
pub const WORKLOAD_KINDS: &[&str] = &[
    "Pod",
    "Deployment",
    "StatefulSet",
    "DaemonSet",
    "ReplicaSet",
    "Job",
    "CronJob",
    "ReplicationController",
];

/// Comma-separated workload types for `kubectl get`
pub fn workload_types() -> String {
    WORKLOAD_KINDS
        .iter()
        .map(|k| k.to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

/// Where the audited resources came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Path,
    Cluster,
    Resource,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Path => write!(f, "Path"),
            SourceType::Cluster => write!(f, "Cluster"),
            SourceType::Resource => write!(f, "Resource"),
        }
    }
}

/// A single manifest object
#[derive(Debug, Clone, PartialEq)]
pub struct KubeResource {
    pub kind: String,
    pub api_version: String,
    pub name: String,
    pub namespace: String,
    pub object: Value,
}

impl KubeResource {
    /// Wrap a decoded object. Returns `None` for documents that are not
    /// Kubernetes objects (no kind or no metadata.name).
    pub fn from_value(object: Value) -> Option<Self> {
        let kind = object.get("kind")?.as_str()?.to_string();
        let name = object.pointer("/metadata/name")?.as_str()?.to_string();
        let api_version = object
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let namespace = object
            .pointer("/metadata/namespace")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Some(Self {
            kind,
            api_version,
            name,
            namespace,
            object,
        })
    }

    pub fn is_workload(&self) -> bool {
        WORKLOAD_KINDS.contains(&self.kind.as_str())
    }

    /// Objects managed by a controller are audited through that controller
    pub fn is_controlled(&self) -> bool {
        self.object
            .pointer("/metadata/ownerReferences")
            .and_then(Value::as_array)
            .map(|owners| {
                owners
                    .iter()
                    .any(|o| o.get("controller").and_then(Value::as_bool) == Some(true))
            })
            .unwrap_or(false)
    }

    /// The pod spec this workload runs
    pub fn pod_spec(&self) -> Option<&Value> {
        let pointer = match self.kind.as_str() {
            "Pod" => "/spec",
            "CronJob" => "/spec/jobTemplate/spec/template/spec",
            kind if WORKLOAD_KINDS.contains(&kind) => "/spec/template/spec",
            _ => return None,
        };

        self.object.pointer(pointer).filter(|v| v.is_object())
    }

    pub fn created_time(&self) -> Option<String> {
        self.object
            .pointer("/metadata/creationTimestamp")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// The resolved set of resources an audit runs against
#[derive(Debug, Clone)]
pub struct ResourceProvider {
    pub source_type: SourceType,
    pub source_name: String,
    pub server_version: String,
    pub creation_time: DateTime<Utc>,
    pub node_count: usize,
    pub namespaces: Vec<String>,
    pub resources: Vec<KubeResource>,
}

impl ResourceProvider {
    pub fn new(source_type: SourceType, source_name: &str) -> Self {
        Self {
            source_type,
            source_name: source_name.to_string(),
            server_version: "unknown".to_string(),
            creation_time: Utc::now(),
            node_count: 0,
            namespaces: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Add objects, skipping anything owned by a controller
    pub fn add_objects(&mut self, objects: impl IntoIterator<Item = Value>) {
        for resource in objects.into_iter().filter_map(KubeResource::from_value) {
            if resource.is_controlled() {
                continue;
            }

            if !resource.namespace.is_empty() && !self.namespaces.contains(&resource.namespace) {
                self.namespaces.push(resource.namespace.clone());
            }

            self.resources.push(resource);
        }
    }

    pub fn workloads(&self) -> impl Iterator<Item = &KubeResource> {
        self.resources.iter().filter(|r| r.is_workload())
    }
}

/// `namespace/kind/version/name`, where kind may carry its API group
/// (`Deployment.apps`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSelector {
    pub namespace: String,
    pub kind: String,
    pub group: Option<String>,
    pub version: String,
    pub name: String,
}

impl ResourceSelector {
    pub fn parse(selector: &str) -> Result<Self, AuditError> {
        let invalid = || AuditError::InvalidResourceSelector(selector.to_string());

        let parts: Vec<&str> = selector.split('/').collect();
        let [namespace, kind, version, name] = parts.as_slice() else {
            return Err(invalid());
        };

        if [kind, version, name].iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        let (kind, group) = match kind.split_once('.') {
            Some((kind, group)) if !kind.is_empty() && !group.is_empty() => {
                (kind.to_string(), Some(group.to_string()))
            }
            Some(_) => return Err(invalid()),
            None => (kind.to_string(), None),
        };

        Ok(Self {
            namespace: namespace.to_string(),
            kind,
            group,
            version: version.to_string(),
            name: name.to_string(),
        })
    }

    /// Fully-qualified resource type as kubectl understands it
    pub fn kubectl_type(&self) -> String {
        match &self.group {
            Some(group) => format!("{}.{}.{}", self.kind.to_lowercase(), self.version, group),
            None => self.kind.to_lowercase(),
        }
    }
}

impl std::fmt::Display for ResourceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.group {
            Some(group) => format!("{}.{}", self.kind, group),
            None => self.kind.clone(),
        };
        write!(f, "{}/{}/{}/{}", self.namespace, kind, self.version, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment() -> Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": "web", "namespace": "prod" },
            "spec": { "template": { "spec": { "containers": [{ "name": "app" }] } } }
        })
    }

    #[test]
    fn test_from_value_requires_kind_and_name() {
        assert!(KubeResource::from_value(json!({ "kind": "Pod" })).is_none());
        assert!(KubeResource::from_value(json!({ "metadata": { "name": "x" } })).is_none());

        let resource = KubeResource::from_value(deployment()).unwrap();
        assert_eq!(resource.kind, "Deployment");
        assert_eq!(resource.namespace, "prod");
        assert_eq!(resource.api_version, "apps/v1");
    }

    #[test]
    fn test_pod_spec_locations() {
        let deploy = KubeResource::from_value(deployment()).unwrap();
        assert!(deploy.pod_spec().unwrap().get("containers").is_some());

        let cron = KubeResource::from_value(json!({
            "kind": "CronJob",
            "metadata": { "name": "nightly" },
            "spec": { "jobTemplate": { "spec": { "template": { "spec": { "containers": [] } } } } }
        }))
        .unwrap();
        assert!(cron.pod_spec().is_some());

        let service = KubeResource::from_value(json!({
            "kind": "Service",
            "metadata": { "name": "web" },
            "spec": {}
        }))
        .unwrap();
        assert!(service.pod_spec().is_none());
        assert!(!service.is_workload());
    }

    #[test]
    fn test_add_objects_skips_controlled() {
        let mut provider = ResourceProvider::new(SourceType::Cluster, "cluster");
        let owned_pod = json!({
            "kind": "Pod",
            "metadata": {
                "name": "web-abc",
                "namespace": "prod",
                "ownerReferences": [{ "kind": "ReplicaSet", "name": "web-1", "controller": true }]
            },
            "spec": {}
        });

        provider.add_objects(vec![deployment(), owned_pod]);

        assert_eq!(provider.resources.len(), 1);
        assert_eq!(provider.namespaces, vec!["prod".to_string()]);
    }

    #[test]
    fn test_selector_parse_with_group() {
        let selector =
            ResourceSelector::parse("nginx-ingress/Deployment.apps/v1/default-backend").unwrap();

        assert_eq!(selector.namespace, "nginx-ingress");
        assert_eq!(selector.kind, "Deployment");
        assert_eq!(selector.group.as_deref(), Some("apps"));
        assert_eq!(selector.kubectl_type(), "deployment.v1.apps");
        assert_eq!(
            selector.to_string(),
            "nginx-ingress/Deployment.apps/v1/default-backend"
        );
    }

    #[test]
    fn test_selector_parse_core_group() {
        let selector = ResourceSelector::parse("default/Pod/v1/nginx").unwrap();
        assert_eq!(selector.group, None);
        assert_eq!(selector.kubectl_type(), "pod");
    }

    #[test]
    fn test_selector_parse_rejects_malformed() {
        for bad in ["", "a/b/c", "a/b/c/d/e", "ns//v1/name", "ns/.apps/v1/name"] {
            assert!(
                matches!(
                    ResourceSelector::parse(bad),
                    Err(AuditError::InvalidResourceSelector(_))
                ),
                "{} should be rejected",
                bad
            );
        }
    }
}
