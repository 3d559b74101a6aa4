// src/formatting.rs

use crate::capability::CapabilitySet;
use crate::config::OutputFormat;
use crate::dispatcher::{DispatchReport, Outcome};
use crate::types::Statistics;
use itertools::Itertools;
use serde_json::{json, Map, Value};

/// Renders command results for the terminal.
pub trait ReportFormatter: Send + Sync {
    fn format_report(&self, report: &DispatchReport) -> String;

    /// Statistics of every tracking-capable backend, keyed by backend.
    fn format_statistics(&self, stats: &[(String, Statistics)]) -> String;

    fn format_capabilities(&self, capabilities: &[(String, CapabilitySet)]) -> String;
}

pub fn formatter_for(format: OutputFormat) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::PlainText => Box::new(PlainTextFormatter),
    }
}

/// Human-readable output, one line per backend.
pub struct PlainTextFormatter;

impl ReportFormatter for PlainTextFormatter {
    fn format_report(&self, report: &DispatchReport) -> String {
        if report.is_empty() {
            return "No backends registered.".to_string();
        }
        report
            .iter()
            .map(|(key, outcome)| match outcome {
                Outcome::Success => format!("[ok]     {}", key),
                Outcome::Failure(reason) => format!("[failed] {}: {}", key, reason),
            })
            .join("\n")
    }

    fn format_statistics(&self, stats: &[(String, Statistics)]) -> String {
        stats
            .iter()
            .map(|(key, counts)| {
                let counts = counts
                    .iter()
                    .map(|(category, n)| format!("{}={}", category, n))
                    .join(" ");
                format!("{}: {}", key, counts)
            })
            .join("\n")
    }

    fn format_capabilities(&self, capabilities: &[(String, CapabilitySet)]) -> String {
        capabilities
            .iter()
            .map(|(key, caps)| format!("{}: {}", key, caps))
            .join("\n")
    }
}

/// Pretty-printed JSON objects keyed by backend.
pub struct JsonFormatter;

impl JsonFormatter {
    fn render(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_report(&self, report: &DispatchReport) -> String {
        let outcomes: Map<String, Value> = report
            .iter()
            .map(|(key, outcome)| {
                let entry = match outcome {
                    Outcome::Success => json!({ "outcome": "success" }),
                    Outcome::Failure(reason) => json!({
                        "outcome": "failure",
                        "stage": reason.stage(),
                        "reason": reason.to_string(),
                    }),
                };
                (key.to_string(), entry)
            })
            .collect();
        Self::render(&Value::Object(outcomes))
    }

    fn format_statistics(&self, stats: &[(String, Statistics)]) -> String {
        let all: Map<String, Value> = stats
            .iter()
            .map(|(key, counts)| (key.clone(), json!(counts)))
            .collect();
        Self::render(&Value::Object(all))
    }

    fn format_capabilities(&self, capabilities: &[(String, CapabilitySet)]) -> String {
        let all: Map<String, Value> = capabilities
            .iter()
            .map(|(key, caps)| {
                let names: Vec<&str> = caps.iter().map(|c| c.as_str()).collect();
                (
                    key.clone(),
                    json!({
                        "capabilities": names,
                        "full": caps.is_full(),
                        "advanced": caps.is_advanced(),
                    }),
                )
            })
            .collect();
        Self::render(&Value::Object(all))
    }
}
