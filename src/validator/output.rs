use crate::config::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Check id to outcome. Ordered so serialized output is stable.
pub type ResultSet = BTreeMap<String, ResultMessage>;

/// Outcome of one check against one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultMessage {
    #[serde(rename = "ID")]
    pub id: String,
    pub message: String,
    pub success: bool,
    pub severity: Severity,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerResult {
    pub name: String,
    pub results: ResultSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PodResult {
    pub name: String,
    pub results: ResultSet,
    pub container_results: Vec<ContainerResult>,
}

/// Everything found for one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceResult {
    pub name: String,
    pub namespace: String,
    pub kind: String,
    pub results: ResultSet,
    pub pod_result: Option<PodResult>,
    pub created_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterInfo {
    pub version: String,
    pub nodes: usize,
    pub pods: usize,
    pub namespaces: usize,
    pub controllers: usize,
}

/// The result of a single audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuditData {
    pub polaris_output_version: String,
    pub audit_time: String,
    pub source_type: String,
    pub source_name: String,
    pub display_name: String,
    pub cluster_info: ClusterInfo,
    pub results: Vec<ResourceResult>,
    pub score: u32,
}

/// Finding counts by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CountSummary {
    pub successes: u32,
    pub warnings: u32,
    pub dangers: u32,
}

impl CountSummary {
    pub fn add_result_set(&mut self, results: &ResultSet) {
        for message in results.values() {
            if message.success {
                self.successes += 1;
                continue;
            }
            match message.severity {
                Severity::Warning => self.warnings += 1,
                Severity::Danger => self.dangers += 1,
                Severity::Ignore => {}
            }
        }
    }

    /// 0-100, weighting a danger twice as heavily as a warning. An audit
    /// with no results scores 100.
    pub fn score(&self) -> u32 {
        let total = self.successes * 2 + self.warnings + self.dangers * 2;
        if total == 0 {
            return 100;
        }
        ((f64::from(self.successes * 2) / f64::from(total)) * 100.0) as u32
    }
}

impl ResourceResult {
    fn result_sets(&self) -> impl Iterator<Item = &ResultSet> {
        let pod_sets = self.pod_result.iter().flat_map(|pod| {
            std::iter::once(&pod.results).chain(pod.container_results.iter().map(|c| &c.results))
        });
        std::iter::once(&self.results).chain(pod_sets)
    }

    pub fn summary(&self) -> CountSummary {
        let mut summary = CountSummary::default();
        for set in self.result_sets() {
            summary.add_result_set(set);
        }
        summary
    }

    /// Copy keeping only failing messages
    fn failures_only(&self) -> Self {
        let pod_result = self.pod_result.as_ref().map(|pod| PodResult {
            name: pod.name.clone(),
            results: failing(&pod.results),
            container_results: pod
                .container_results
                .iter()
                .map(|c| ContainerResult {
                    name: c.name.clone(),
                    results: failing(&c.results),
                })
                .filter(|c| !c.results.is_empty())
                .collect(),
        });

        Self {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            kind: self.kind.clone(),
            results: failing(&self.results),
            pod_result,
            created_time: self.created_time.clone(),
        }
    }
}

fn failing(results: &ResultSet) -> ResultSet {
    results
        .iter()
        .filter(|(_, message)| !message.success)
        .map(|(id, message)| (id.clone(), message.clone()))
        .collect()
}

impl AuditData {
    pub fn summary(&self) -> CountSummary {
        let mut summary = CountSummary::default();
        for result in &self.results {
            for set in result.result_sets() {
                summary.add_result_set(set);
            }
        }
        summary
    }

    /// A new `AuditData` holding only failing results. Workloads without any
    /// failure are dropped entirely.
    pub fn remove_successful_results(&self) -> AuditData {
        let results = self
            .results
            .iter()
            .filter(|r| {
                let summary = r.summary();
                summary.warnings + summary.dangers > 0
            })
            .map(ResourceResult::failures_only)
            .collect();

        AuditData {
            results,
            ..self.clone()
        }
    }
}
