use super::output::{AuditData, ResultSet};
use crate::config::Severity;
use crate::output::{LabelColor, paint};
use std::fmt::Write;

const CHECK_COLUMN: usize = 36;

impl AuditData {
    /// Human-readable report. Escape codes are only emitted when `color` is set.
    pub fn pretty_output(&self, color: bool) -> String {
        let mut out = String::new();

        let title = if self.display_name.is_empty() {
            format!("Polaris audited {} {}", self.source_type, self.source_name)
        } else {
            format!(
                "Polaris audited {} {} ({})",
                self.source_type, self.source_name, self.display_name
            )
        };
        let _ = writeln!(
            out,
            "{} at {}",
            paint(&title, LabelColor::Blue, color),
            self.audit_time
        );

        let info = &self.cluster_info;
        let _ = writeln!(
            out,
            "    Nodes: {} | Namespaces: {} | Controllers: {}",
            info.nodes, info.namespaces, info.controllers
        );
        let _ = writeln!(
            out,
            "    Final score: {}",
            paint(&self.summary().score().to_string(), LabelColor::White, color)
        );
        out.push('\n');

        for result in &self.results {
            let heading = if result.namespace.is_empty() {
                format!("{} {}", result.kind, result.name)
            } else {
                format!(
                    "{} {} in namespace {}",
                    result.kind, result.name, result.namespace
                )
            };
            let _ = writeln!(out, "{}", paint(&heading, LabelColor::Blue, color));
            write_result_set(&mut out, &result.results, 1, color);

            if let Some(pod) = &result.pod_result {
                write_result_set(&mut out, &pod.results, 1, color);
                for container in &pod.container_results {
                    let _ = writeln!(out, "  Container {}", container.name);
                    write_result_set(&mut out, &container.results, 2, color);
                }
            }
            out.push('\n');
        }

        out
    }
}

fn write_result_set(out: &mut String, results: &ResultSet, depth: usize, color: bool) {
    let indent = "    ".repeat(depth);

    for message in results.values() {
        let status = match (message.success, message.severity) {
            (true, _) => paint("✔ Success", LabelColor::Green, color),
            (false, Severity::Danger) => paint("✘ Danger", LabelColor::Red, color),
            (false, _) => paint("⚠ Warning", LabelColor::Yellow, color),
        };
        let _ = writeln!(
            out,
            "{}{:<width$} {}",
            indent,
            message.id,
            status,
            width = CHECK_COLUMN
        );
        let _ = writeln!(
            out,
            "{}    {}",
            indent,
            paint(
                &format!("{} - {}", message.category, message.message),
                LabelColor::Grey,
                color
            )
        );
    }
}
