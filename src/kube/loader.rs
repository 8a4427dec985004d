use super::kubectl::Kubectl;
use super::resource::{ResourceProvider, ResourceSelector, SourceType, workload_types};
use crate::traits::{CommandExecutor, FileSystem};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// What an audit looks at
#[derive(Debug, Clone, PartialEq)]
pub enum AuditScope {
    /// A manifest file or a directory tree of manifests
    Path(PathBuf),
    /// One named resource in the live cluster
    Resource(ResourceSelector),
    /// The live cluster, optionally limited to a namespace
    Cluster { namespace: Option<String> },
}

/// Resolves the resources a single audit runs against
pub trait AuditResourceProvider {
    fn fetch(&self, scope: &AuditScope) -> Result<ResourceProvider>;
}

/// Loads resources from disk or from the cluster `kubectl` points at
pub struct KubeLoader<'a> {
    fs: &'a dyn FileSystem,
    kubectl: Kubectl<'a>,
}

impl<'a> KubeLoader<'a> {
    pub fn new(fs: &'a dyn FileSystem, command: &'a dyn CommandExecutor) -> Self {
        Self {
            fs,
            kubectl: Kubectl::new(command),
        }
    }

    fn from_path(&self, path: &Path) -> Result<ResourceProvider> {
        if !self.fs.exists(path) {
            anyhow::bail!("Audit path does not exist: {:?}", path);
        }

        let mut provider = ResourceProvider::new(SourceType::Path, &path.display().to_string());

        for file in self.fs.walk_files(path)? {
            let is_manifest = file
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| MANIFEST_EXTENSIONS.contains(&e))
                .unwrap_or(false);
            if !is_manifest {
                continue;
            }

            let content = self.fs.read_to_string(&file)?;
            let objects = parse_manifests(&content)
                .with_context(|| format!("Failed to parse manifest: {:?}", file))?;
            provider.add_objects(objects);
        }

        Ok(provider)
    }

    fn from_selector(&self, selector: &ResourceSelector) -> Result<ResourceProvider> {
        let mut provider =
            ResourceProvider::new(SourceType::Resource, &selector.to_string());
        provider.server_version = self.kubectl.server_version()?;

        let kind = selector.kubectl_type();
        let mut args = vec!["get", kind.as_str(), selector.name.as_str()];
        if !selector.namespace.is_empty() {
            args.push("--namespace");
            args.push(selector.namespace.as_str());
        }

        let object = self.kubectl.get_json(&args)?;
        provider.add_objects(std::iter::once(object));
        Ok(provider)
    }

    fn from_cluster(&self, namespace: Option<&str>) -> Result<ResourceProvider> {
        let mut provider = ResourceProvider::new(SourceType::Cluster, "cluster");
        provider.server_version = self.kubectl.server_version()?;
        provider.node_count = self.kubectl.get_items(&["get", "nodes"])?.len();

        let types = workload_types();
        let workloads = match namespace {
            Some(ns) => {
                provider.namespaces.push(ns.to_string());
                self.kubectl
                    .get_items(&["get", types.as_str(), "--namespace", ns])?
            }
            None => {
                for ns in self.kubectl.get_items(&["get", "namespaces"])? {
                    if let Some(name) = ns.pointer("/metadata/name").and_then(Value::as_str) {
                        provider.namespaces.push(name.to_string());
                    }
                }
                self.kubectl
                    .get_items(&["get", types.as_str(), "--all-namespaces"])?
            }
        };

        provider.add_objects(workloads);
        Ok(provider)
    }
}

impl AuditResourceProvider for KubeLoader<'_> {
    fn fetch(&self, scope: &AuditScope) -> Result<ResourceProvider> {
        match scope {
            AuditScope::Path(path) => self.from_path(path),
            AuditScope::Resource(selector) => self.from_selector(selector),
            AuditScope::Cluster { namespace } => self.from_cluster(namespace.as_deref()),
        }
    }
}

/// Decode a multi-document YAML (or JSON) stream, expanding `kind: List`
/// and dropping empty documents
pub fn parse_manifests(content: &str) -> Result<Vec<Value>> {
    let mut objects = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(document)?;
        push_object(&mut objects, value);
    }

    Ok(objects)
}

fn push_object(objects: &mut Vec<Value>, value: Value) {
    match value {
        Value::Null => {}
        Value::Object(ref map) if map.get("kind").and_then(Value::as_str) == Some("List") => {
            if let Some(Value::Array(items)) = map.get("items") {
                for item in items.clone() {
                    push_object(objects, item);
                }
            }
        }
        other => objects.push(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{CommandOutput, MockCommandExecutor, MockCommandResult, MockFileSystem};

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: prod
spec:
  template:
    spec:
      containers:
        - name: app
          image: nginx:1.25
---
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: prod
---
"#;

    #[test]
    fn test_parse_manifests_multi_document() {
        let objects = parse_manifests(DEPLOYMENT).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0]["kind"], "Deployment");
    }

    #[test]
    fn test_parse_manifests_expands_lists() {
        let objects = parse_manifests(
            r#"{"kind":"List","items":[{"kind":"Pod","metadata":{"name":"a"}},{"kind":"Pod","metadata":{"name":"b"}}]}"#,
        )
        .unwrap();
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn test_parse_manifests_invalid_yaml() {
        assert!(parse_manifests("kind: [unterminated").is_err());
    }

    #[test]
    fn test_fetch_path_skips_non_manifests() {
        let fs = MockFileSystem::new()
            .with_file("/manifests/web.yaml", DEPLOYMENT)
            .with_file("/manifests/README.md", "# not yaml: [")
            .with_file("/manifests/chart/pod.yml", "kind: Pod\nmetadata:\n  name: solo\nspec: {}\n");
        let executor = MockCommandExecutor::new();

        let loader = KubeLoader::new(&fs, &executor);
        let provider = loader
            .fetch(&AuditScope::Path(PathBuf::from("/manifests")))
            .unwrap();

        assert_eq!(provider.source_type, SourceType::Path);
        assert_eq!(provider.source_name, "/manifests");
        assert_eq!(provider.resources.len(), 3);
        assert_eq!(provider.workloads().count(), 2);
        assert!(executor.invocations().is_empty());
    }

    #[test]
    fn test_fetch_missing_path() {
        let fs = MockFileSystem::new();
        let executor = MockCommandExecutor::new();
        let loader = KubeLoader::new(&fs, &executor);

        assert!(
            loader
                .fetch(&AuditScope::Path(PathBuf::from("/missing")))
                .is_err()
        );
    }

    #[test]
    fn test_fetch_namespaced_cluster() {
        let fs = MockFileSystem::new();
        let executor = MockCommandExecutor::with_outputs(vec![
            MockCommandResult::new(
                "kubectl",
                "version",
                CommandOutput::ok(r#"{"serverVersion":{"gitVersion":"v1.30.0"}}"#),
            ),
            MockCommandResult::new(
                "kubectl",
                "get",
                CommandOutput::ok(r#"{"items":[{"kind":"Node","metadata":{"name":"n1"}}]}"#),
            ),
            MockCommandResult::new(
                "kubectl",
                "get",
                CommandOutput::ok(
                    r#"{"items":[{"kind":"Deployment","metadata":{"name":"api","namespace":"team-a"},"spec":{"template":{"spec":{"containers":[]}}}}]}"#,
                ),
            ),
        ]);

        let loader = KubeLoader::new(&fs, &executor);
        let provider = loader
            .fetch(&AuditScope::Cluster {
                namespace: Some("team-a".to_string()),
            })
            .unwrap();

        assert_eq!(provider.server_version, "v1.30.0");
        assert_eq!(provider.node_count, 1);
        assert_eq!(provider.namespaces, vec!["team-a".to_string()]);
        assert_eq!(provider.resources.len(), 1);

        let last = executor.invocations().pop().unwrap();
        assert!(last.contains(&"--namespace".to_string()));
        assert!(last.contains(&"team-a".to_string()));
    }

    #[test]
    fn test_fetch_single_resource() {
        let fs = MockFileSystem::new();
        let executor = MockCommandExecutor::with_outputs(vec![
            MockCommandResult::new(
                "kubectl",
                "version",
                CommandOutput::ok(r#"{"serverVersion":{"gitVersion":"v1.30.0"}}"#),
            ),
            MockCommandResult::new(
                "kubectl",
                "get",
                CommandOutput::ok(
                    r#"{"kind":"Deployment","metadata":{"name":"default-backend","namespace":"nginx-ingress"},"spec":{"template":{"spec":{"containers":[]}}}}"#,
                ),
            ),
        ]);

        let selector =
            ResourceSelector::parse("nginx-ingress/Deployment.apps/v1/default-backend").unwrap();
        let loader = KubeLoader::new(&fs, &executor);
        let provider = loader.fetch(&AuditScope::Resource(selector)).unwrap();

        assert_eq!(provider.source_type, SourceType::Resource);
        assert_eq!(provider.resources.len(), 1);

        let get = executor.invocations().pop().unwrap();
        assert_eq!(
            get,
            vec![
                "kubectl",
                "get",
                "deployment.v1.apps",
                "default-backend",
                "--namespace",
                "nginx-ingress",
                "-o",
                "json"
            ]
        );
    }
}
