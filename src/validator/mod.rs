//! Built-in evaluation of workloads against the configured checks.

pub mod checks;
pub mod output;
pub mod pretty;

pub use output::{AuditData, ClusterInfo, CountSummary, ResourceResult, ResultMessage, ResultSet};

use crate::config::{AuditConfiguration, Severity};
use crate::kube::{KubeResource, ResourceProvider};
use anyhow::{Result, bail};
use chrono::SecondsFormat;
use checks::{CHECKS, Check, Target};
use output::{ContainerResult, PodResult};
use serde_json::Value;

pub const OUTPUT_VERSION: &str = "1.0";

/// Audit every workload the provider holds
pub fn run_audit(config: &AuditConfiguration, provider: &ResourceProvider) -> Result<AuditData> {
    let mut results = Vec::new();
    for resource in provider.workloads() {
        results.push(validate_workload(config, resource)?);
    }

    let cluster_info = ClusterInfo {
        version: provider.server_version.clone(),
        nodes: provider.node_count,
        pods: provider.workloads().filter(|r| r.kind == "Pod").count(),
        namespaces: provider.namespaces.len(),
        controllers: results.len(),
    };

    let mut audit = AuditData {
        polaris_output_version: OUTPUT_VERSION.to_string(),
        audit_time: provider
            .creation_time
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        source_type: provider.source_type.to_string(),
        source_name: provider.source_name.clone(),
        display_name: config.display_name.clone(),
        cluster_info,
        results,
        score: 0,
    };
    audit.score = audit.summary().score();
    Ok(audit)
}

fn validate_workload(config: &AuditConfiguration, resource: &KubeResource) -> Result<ResourceResult> {
    let Some(pod) = resource.pod_spec() else {
        bail!(
            "{} {}/{} has no pod template",
            resource.kind,
            resource.namespace,
            resource.name
        );
    };

    let active: Vec<(&Check, Severity)> = CHECKS
        .iter()
        .map(|check| (check, config.severity(check.id)))
        .filter(|(_, severity)| *severity != Severity::Ignore)
        .collect();

    let mut pod_results = ResultSet::new();
    for (check, severity) in &active {
        if let Target::Pod(test) = check.target {
            record(&mut pod_results, check, *severity, test(pod));
        }
    }

    let mut container_results = Vec::new();
    for (key, is_init) in [("initContainers", true), ("containers", false)] {
        for container in containers(pod, key) {
            let mut results = ResultSet::new();
            for (check, severity) in &active {
                if is_init && !check.init_containers {
                    continue;
                }
                if let Target::Container(test) = check.target {
                    record(&mut results, check, *severity, test(container, pod));
                }
            }

            container_results.push(ContainerResult {
                name: container
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                results,
            });
        }
    }

    Ok(ResourceResult {
        name: resource.name.clone(),
        namespace: resource.namespace.clone(),
        kind: resource.kind.clone(),
        results: ResultSet::new(),
        pod_result: Some(PodResult {
            name: resource.name.clone(),
            results: pod_results,
            container_results,
        }),
        created_time: resource.created_time().unwrap_or_default(),
    })
}

fn containers<'a>(pod: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    pod.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn record(results: &mut ResultSet, check: &Check, severity: Severity, passed: bool) {
    let message = if passed {
        check.success_message
    } else {
        check.failure_message
    };

    results.insert(
        check.id.to_string(),
        ResultMessage {
            id: check.id.to_string(),
            message: message.to_string(),
            success: passed,
            severity,
            category: check.category.as_str().to_string(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::resource::SourceType;
    use serde_json::json;

    fn provider_with(objects: Vec<Value>) -> ResourceProvider {
        let mut provider = ResourceProvider::new(SourceType::Path, "./manifests");
        provider.add_objects(objects);
        provider
    }

    fn hardened_deployment() -> Value {
        json!({
            "kind": "Deployment",
            "metadata": { "name": "api", "namespace": "prod" },
            "spec": { "template": { "spec": {
                "securityContext": { "runAsNonRoot": true },
                "containers": [{
                    "name": "api",
                    "image": "api:1.2.3",
                    "imagePullPolicy": "Always",
                    "securityContext": {
                        "allowPrivilegeEscalation": false,
                        "readOnlyRootFilesystem": true
                    },
                    "resources": {
                        "requests": { "cpu": "100m", "memory": "128Mi" },
                        "limits": { "cpu": "200m", "memory": "256Mi" }
                    },
                    "readinessProbe": { "httpGet": { "path": "/ready", "port": 8080 } },
                    "livenessProbe": { "httpGet": { "path": "/live", "port": 8080 } }
                }]
            } } }
        })
    }

    #[test]
    fn test_hardened_workload_scores_100() {
        let provider = provider_with(vec![hardened_deployment()]);
        let audit = run_audit(&AuditConfiguration::default(), &provider).unwrap();

        assert_eq!(audit.results.len(), 1);
        assert_eq!(audit.score, 100);
        assert_eq!(audit.summary().dangers, 0);
        assert_eq!(audit.source_type, "Path");
        assert_eq!(audit.cluster_info.controllers, 1);
    }

    #[test]
    fn test_bare_pod_has_dangers() {
        let provider = provider_with(vec![json!({
            "kind": "Pod",
            "metadata": { "name": "debug", "namespace": "default" },
            "spec": { "hostPID": true, "containers": [{ "name": "shell", "image": "busybox" }] }
        })]);

        let audit = run_audit(&AuditConfiguration::default(), &provider).unwrap();
        let pod = audit.results[0].pod_result.as_ref().unwrap();

        assert!(!pod.results["hostPIDSet"].success);
        assert!(!pod.container_results[0].results["tagNotSpecified"].success);
        assert!(audit.summary().dangers >= 3);
        assert!(audit.score < 50);
        assert_eq!(audit.cluster_info.pods, 1);
    }

    #[test]
    fn test_ignored_checks_are_not_reported() {
        let mut config = AuditConfiguration::default();
        config.restrict_checks(&["hostIPCSet".to_string()]);

        let provider = provider_with(vec![hardened_deployment()]);
        let audit = run_audit(&config, &provider).unwrap();
        let pod = audit.results[0].pod_result.as_ref().unwrap();

        assert_eq!(pod.results.len(), 1);
        assert!(pod.container_results[0].results.is_empty());
    }

    #[test]
    fn test_init_containers_skip_probe_checks() {
        let provider = provider_with(vec![json!({
            "kind": "Job",
            "metadata": { "name": "migrate" },
            "spec": { "template": { "spec": {
                "initContainers": [{ "name": "wait", "image": "busybox:1.36" }],
                "containers": [{ "name": "run", "image": "migrate:2" }]
            } } }
        })]);

        let audit = run_audit(&AuditConfiguration::default(), &provider).unwrap();
        let containers = &audit.results[0].pod_result.as_ref().unwrap().container_results;

        assert_eq!(containers[0].name, "wait");
        assert!(!containers[0].results.contains_key("livenessProbeMissing"));
        assert!(containers[1].results.contains_key("livenessProbeMissing"));
    }

    #[test]
    fn test_non_workloads_are_skipped() {
        let provider = provider_with(vec![json!({
            "kind": "ConfigMap",
            "metadata": { "name": "settings" },
            "data": {}
        })]);

        let audit = run_audit(&AuditConfiguration::default(), &provider).unwrap();
        assert!(audit.results.is_empty());
        assert_eq!(audit.score, 100);
    }

    #[test]
    fn test_workload_without_template_is_error() {
        let provider = provider_with(vec![json!({
            "kind": "Deployment",
            "metadata": { "name": "broken" },
            "spec": {}
        })]);

        let err = run_audit(&AuditConfiguration::default(), &provider).unwrap_err();
        assert!(err.to_string().contains("has no pod template"));
    }

    #[test]
    fn test_display_name_carried_into_audit() {
        let config = AuditConfiguration {
            display_name: "staging".to_string(),
            ..AuditConfiguration::default()
        };
        let audit = run_audit(&config, &provider_with(vec![])).unwrap();
        assert_eq!(audit.display_name, "staging");
    }
}
