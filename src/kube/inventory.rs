use super::kubectl::Kubectl;
use super::resource::{KubeResource, workload_types};
use crate::traits::CommandExecutor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cluster-wide workload listing sent alongside an uploaded audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadInventory {
    pub server_version: String,
    pub nodes: Vec<NodeInfo>,
    pub namespaces: Vec<String>,
    pub controllers: Vec<ControllerInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub name: String,
    pub kubelet_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerInfo {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub containers: Vec<ContainerImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerImage {
    pub name: String,
    pub image: String,
}

/// Provides the full workload inventory of the current cluster, independent
/// of whatever narrower scope the audit itself used
pub trait InventoryResourceProvider {
    fn inventory(&self) -> Result<WorkloadInventory>;
}

/// Inventory gathered through `kubectl`
pub struct KubectlInventory<'a> {
    kubectl: Kubectl<'a>,
}

impl<'a> KubectlInventory<'a> {
    pub fn new(command: &'a dyn CommandExecutor) -> Self {
        Self {
            kubectl: Kubectl::new(command),
        }
    }
}

impl InventoryResourceProvider for KubectlInventory<'_> {
    fn inventory(&self) -> Result<WorkloadInventory> {
        let server_version = self
            .kubectl
            .server_version()
            .context("Failed to determine cluster version")?;

        let nodes = self
            .kubectl
            .get_items(&["get", "nodes"])
            .context("Failed to list nodes")?
            .iter()
            .map(|node| NodeInfo {
                name: str_at(node, "/metadata/name"),
                kubelet_version: str_at(node, "/status/nodeInfo/kubeletVersion"),
            })
            .collect();

        let namespaces = self
            .kubectl
            .get_items(&["get", "namespaces"])
            .context("Failed to list namespaces")?
            .iter()
            .map(|ns| str_at(ns, "/metadata/name"))
            .collect();

        let types = workload_types();
        let controllers = self
            .kubectl
            .get_items(&["get", types.as_str(), "--all-namespaces"])
            .context("Failed to list workloads")?
            .into_iter()
            .filter_map(KubeResource::from_value)
            .filter(|r| !r.is_controlled())
            .map(|r| controller_info(&r))
            .collect();

        Ok(WorkloadInventory {
            server_version,
            nodes,
            namespaces,
            controllers,
        })
    }
}

fn controller_info(resource: &KubeResource) -> ControllerInfo {
    let containers = resource
        .pod_spec()
        .and_then(|spec| spec.get("containers"))
        .and_then(Value::as_array)
        .map(|containers| {
            containers
                .iter()
                .map(|c| ContainerImage {
                    name: str_at(c, "/name"),
                    image: str_at(c, "/image"),
                })
                .collect()
        })
        .unwrap_or_default();

    ControllerInfo {
        kind: resource.kind.clone(),
        name: resource.name.clone(),
        namespace: resource.namespace.clone(),
        containers,
    }
}

fn str_at(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
