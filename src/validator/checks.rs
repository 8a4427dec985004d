use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    // name[:tag][@digest], where name may include a registry host with a port
    static ref IMAGE_REF: Regex =
        Regex::new(r"^(?:[^@]*/)?[^/:@]+(?::(?P<tag>[\w][\w.-]*))?(?:@(?P<digest>[a-z0-9]+:[a-fA-F0-9]+))?$")
            .expect("image reference pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Security,
    Efficiency,
    Reliability,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Security => "Security",
            Category::Efficiency => "Efficiency",
            Category::Reliability => "Reliability",
        }
    }
}

/// What a check inspects
#[derive(Clone, Copy)]
pub enum Target {
    /// Receives the pod spec
    Pod(fn(&Value) -> bool),
    /// Receives the container and its pod spec
    Container(fn(&Value, &Value) -> bool),
}

/// A built-in check; the predicate returns true when the target passes
pub struct Check {
    pub id: &'static str,
    pub category: Category,
    pub success_message: &'static str,
    pub failure_message: &'static str,
    pub target: Target,
    /// Whether the check also applies to init containers
    pub init_containers: bool,
}

pub const CHECKS: &[Check] = &[
    Check {
        id: "hostIPCSet",
        category: Category::Security,
        success_message: "Host IPC is not configured",
        failure_message: "Host IPC should not be configured",
        target: Target::Pod(|pod| !flag(pod, "/hostIPC")),
        init_containers: false,
    },
    Check {
        id: "hostPIDSet",
        category: Category::Security,
        success_message: "Host PID is not configured",
        failure_message: "Host PID should not be configured",
        target: Target::Pod(|pod| !flag(pod, "/hostPID")),
        init_containers: false,
    },
    Check {
        id: "hostNetworkSet",
        category: Category::Security,
        success_message: "Host network is not configured",
        failure_message: "Host network should not be configured",
        target: Target::Pod(|pod| !flag(pod, "/hostNetwork")),
        init_containers: false,
    },
    Check {
        id: "runAsRootAllowed",
        category: Category::Security,
        success_message: "Is not allowed to run as root",
        failure_message: "Should not be allowed to run as root",
        target: Target::Container(runs_as_non_root),
        init_containers: true,
    },
    Check {
        id: "runAsPrivileged",
        category: Category::Security,
        success_message: "Not running as privileged",
        failure_message: "Should not be running as privileged",
        target: Target::Container(|c, _| !flag(c, "/securityContext/privileged")),
        init_containers: true,
    },
    Check {
        id: "privilegeEscalationAllowed",
        category: Category::Security,
        success_message: "Privilege escalation not allowed",
        failure_message: "Privilege escalation should not be allowed",
        target: Target::Container(|c, _| {
            c.pointer("/securityContext/allowPrivilegeEscalation")
                .and_then(Value::as_bool)
                == Some(false)
        }),
        init_containers: true,
    },
    Check {
        id: "notReadOnlyRootFilesystem",
        category: Category::Security,
        success_message: "Filesystem is read only",
        failure_message: "Filesystem should be read only",
        target: Target::Container(|c, _| flag(c, "/securityContext/readOnlyRootFilesystem")),
        init_containers: true,
    },
    Check {
        id: "cpuRequestsMissing",
        category: Category::Efficiency,
        success_message: "CPU requests are set",
        failure_message: "CPU requests should be set",
        target: Target::Container(|c, _| present(c, "/resources/requests/cpu")),
        init_containers: true,
    },
    Check {
        id: "memoryRequestsMissing",
        category: Category::Efficiency,
        success_message: "Memory requests are set",
        failure_message: "Memory requests should be set",
        target: Target::Container(|c, _| present(c, "/resources/requests/memory")),
        init_containers: true,
    },
    Check {
        id: "cpuLimitsMissing",
        category: Category::Efficiency,
        success_message: "CPU limits are set",
        failure_message: "CPU limits should be set",
        target: Target::Container(|c, _| present(c, "/resources/limits/cpu")),
        init_containers: true,
    },
    Check {
        id: "memoryLimitsMissing",
        category: Category::Efficiency,
        success_message: "Memory limits are set",
        failure_message: "Memory limits should be set",
        target: Target::Container(|c, _| present(c, "/resources/limits/memory")),
        init_containers: true,
    },
    Check {
        id: "readinessProbeMissing",
        category: Category::Reliability,
        success_message: "Readiness probe is configured",
        failure_message: "Readiness probe should be configured",
        target: Target::Container(|c, _| present(c, "/readinessProbe")),
        init_containers: false,
    },
    Check {
        id: "livenessProbeMissing",
        category: Category::Reliability,
        success_message: "Liveness probe is configured",
        failure_message: "Liveness probe should be configured",
        target: Target::Container(|c, _| present(c, "/livenessProbe")),
        init_containers: false,
    },
    Check {
        id: "tagNotSpecified",
        category: Category::Reliability,
        success_message: "Image tag is specified",
        failure_message: "Image tag should be specified",
        target: Target::Container(|c, _| {
            c.get("image")
                .and_then(Value::as_str)
                .map(image_is_pinned)
                .unwrap_or(false)
        }),
        init_containers: true,
    },
    Check {
        id: "pullPolicyNotAlways",
        category: Category::Reliability,
        success_message: "Image pull policy is \"Always\"",
        failure_message: "Image pull policy should be \"Always\"",
        target: Target::Container(|c, _| {
            c.get("imagePullPolicy").and_then(Value::as_str) == Some("Always")
        }),
        init_containers: true,
    },
];

fn flag(value: &Value, pointer: &str) -> bool {
    value.pointer(pointer).and_then(Value::as_bool).unwrap_or(false)
}

fn present(value: &Value, pointer: &str) -> bool {
    value.pointer(pointer).is_some_and(|v| !v.is_null())
}

/// Container settings win over the pod security context
fn runs_as_non_root(container: &Value, pod: &Value) -> bool {
    let setting = |pointer: &str| {
        container
            .pointer(&format!("/securityContext{}", pointer))
            .or_else(|| pod.pointer(&format!("/securityContext{}", pointer)))
    };

    if let Some(non_root) = setting("/runAsNonRoot").and_then(Value::as_bool) {
        return non_root;
    }

    setting("/runAsUser")
        .and_then(Value::as_i64)
        .map(|uid| uid > 0)
        .unwrap_or(false)
}

/// A digest, or a tag other than `latest`
pub fn image_is_pinned(image: &str) -> bool {
    let Some(captures) = IMAGE_REF.captures(image) else {
        return false;
    };

    if captures.name("digest").is_some() {
        return true;
    }

    captures
        .name("tag")
        .map(|tag| tag.as_str() != "latest")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(id: &str) -> &'static Check {
        CHECKS.iter().find(|c| c.id == id).unwrap()
    }

    fn container_passes(id: &str, container: Value, pod: Value) -> bool {
        match check(id).target {
            Target::Container(test) => test(&container, &pod),
            Target::Pod(_) => panic!("{} is a pod check", id),
        }
    }

    #[test]
    fn test_image_is_pinned() {
        assert!(image_is_pinned("nginx:1.25"));
        assert!(image_is_pinned("registry.local:5000/team/app:v2"));
        assert!(image_is_pinned("nginx@sha256:abcdef0123"));
        assert!(!image_is_pinned("nginx"));
        assert!(!image_is_pinned("nginx:latest"));
        assert!(!image_is_pinned("registry.local:5000/team/app"));
    }

    #[test]
    fn test_host_checks() {
        let Target::Pod(test) = check("hostNetworkSet").target else {
            panic!("hostNetworkSet should be a pod check");
        };
        assert!(test(&json!({})));
        assert!(!test(&json!({ "hostNetwork": true })));
    }

    #[test]
    fn test_run_as_root_uses_pod_context_fallback() {
        assert!(!container_passes("runAsRootAllowed", json!({}), json!({})));
        assert!(container_passes(
            "runAsRootAllowed",
            json!({}),
            json!({ "securityContext": { "runAsNonRoot": true } })
        ));
        assert!(!container_passes(
            "runAsRootAllowed",
            json!({ "securityContext": { "runAsNonRoot": false } }),
            json!({ "securityContext": { "runAsNonRoot": true } })
        ));
        assert!(container_passes(
            "runAsRootAllowed",
            json!({ "securityContext": { "runAsUser": 1000 } }),
            json!({})
        ));
    }

    #[test]
    fn test_resource_checks() {
        let container = json!({ "resources": { "requests": { "cpu": "100m" } } });
        assert!(container_passes("cpuRequestsMissing", container.clone(), json!({})));
        assert!(!container_passes("memoryRequestsMissing", container, json!({})));
    }

    #[test]
    fn test_check_ids_unique() {
        let mut ids: Vec<&str> = CHECKS.iter().map(|c| c.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CHECKS.len());
    }
}
