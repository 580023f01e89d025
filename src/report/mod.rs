//! Report rendering with the Handlebars template engine
//!
//! The presentation layer reads a finished [`ProbeCycle`] and nothing
//! else: a Markdown report for publishing and a plain-text status table
//! for the terminal. No probing logic lives here.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::models::{NodeHealth, ProbeCycle};

/// Default report template
const DEFAULT_TEMPLATE: &str = include_str!("../../templates/report.hbs");

/// Placeholder for absent values in tables
const ABSENT: &str = "-";

const UP: &str = "\u{1F7E2}"; // 🟢
const DOWN: &str = "\u{1F534}"; // 🔴
const DEGRADED: &str = "\u{1F7E0}"; // 🟠

/// Template data for the report header
#[derive(Debug, Serialize)]
struct ReportTemplateData {
    generated_at: String,
    node_count: usize,
    nodes_up: usize,
    nodes_emoji: &'static str,
    record_count: usize,
    records_checked: usize,
    records_emoji: &'static str,
    malformed_records: usize,
    malformed_emoji: &'static str,
    invalid_records: usize,
    invalid_emoji: &'static str,
    nodes: Vec<NodeRow>,
    has_not_fetchable: bool,
    not_fetchable: Vec<RecordRow>,
    has_malformed: bool,
    malformed: Vec<RecordRow>,
    has_invalid: bool,
    invalid: Vec<InvalidRow>,
}

#[derive(Debug, Serialize)]
struct NodeRow {
    url: String,
    status_emoji: &'static str,
    http_status: String,
    record_count: String,
    last_created: String,
    last_modified: String,
}

impl From<&NodeHealth> for NodeRow {
    fn from(node: &NodeHealth) -> Self {
        Self {
            url: node.endpoint.url().to_string(),
            status_emoji: if node.is_up() { UP } else { DOWN },
            http_status: node
                .http_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| ABSENT.to_string()),
            record_count: node
                .record_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| ABSENT.to_string()),
            last_created: node
                .last_created
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| ABSENT.to_string()),
            last_modified: node
                .last_modified
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| ABSENT.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct RecordRow {
    url: String,
}

#[derive(Debug, Serialize)]
struct InvalidRow {
    url: String,
    title: String,
    reason: String,
}

impl ReportTemplateData {
    fn from_cycle(cycle: &ProbeCycle) -> Self {
        let summary = cycle.summary();
        let partition = cycle.partition_records();

        let not_fetchable: Vec<RecordRow> = partition
            .not_fetchable
            .iter()
            .map(|r| RecordRow {
                url: r.record_url.clone(),
            })
            .collect();
        let malformed: Vec<RecordRow> = partition
            .malformed
            .iter()
            .map(|r| RecordRow {
                url: r.record_url.clone(),
            })
            .collect();
        let invalid: Vec<InvalidRow> = partition
            .invalid
            .iter()
            .map(|r| InvalidRow {
                url: r.record_url.clone(),
                title: r.title.clone().unwrap_or_else(|| ABSENT.to_string()),
                reason: r.invalid_reason.clone().unwrap_or_else(|| ABSENT.to_string()),
            })
            .collect();

        Self {
            generated_at: cycle.generated_at.format("%Y-%m-%d %H:%M").to_string(),
            node_count: summary.node_count,
            nodes_up: summary.nodes_up,
            nodes_emoji: if summary.nodes_down == 0 { UP } else { DOWN },
            record_count: cycle.records.len(),
            records_checked: summary.records_checked,
            records_emoji: if summary.records_not_checked == 0 {
                UP
            } else {
                DEGRADED
            },
            malformed_records: summary.malformed_records,
            malformed_emoji: if summary.malformed_records == 0 {
                UP
            } else {
                DEGRADED
            },
            invalid_records: summary.invalid_records,
            invalid_emoji: if summary.invalid_records == 0 {
                UP
            } else {
                DEGRADED
            },
            nodes: cycle.nodes.iter().map(NodeRow::from).collect(),
            has_not_fetchable: !not_fetchable.is_empty(),
            not_fetchable,
            has_malformed: !malformed.is_empty(),
            malformed,
            has_invalid: !invalid.is_empty(),
            invalid,
        }
    }
}

/// Markdown report writer with Handlebars template engine
pub struct ReportWriter<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> ReportWriter<'a> {
    /// Create a writer with the built-in template
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string("report", DEFAULT_TEMPLATE)
            .context("Failed to register default report template")?;
        Ok(Self { handlebars })
    }

    /// Create a writer with a custom template file
    pub fn with_template(template_path: &Path) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_file("report", template_path)
            .context("Failed to register custom report template")?;
        Ok(Self { handlebars })
    }

    /// Render a cycle to a Markdown string
    pub fn render(&self, cycle: &ProbeCycle) -> Result<String> {
        let data = ReportTemplateData::from_cycle(cycle);
        self.handlebars
            .render("report", &data)
            .context("Failed to render report template")
    }

    /// Render and write the report to a file
    pub fn save(&self, cycle: &ProbeCycle, path: &Path) -> Result<()> {
        let markdown = self.render(cycle)?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        file.write_all(markdown.as_bytes())
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Saved monitoring report");
        Ok(())
    }
}

/// Plain-text status table for terminal output
pub fn status_table(nodes: &[NodeHealth]) -> String {
    let mut width = "NODE".len();
    for node in nodes {
        width = width.max(node.endpoint.url().len());
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<width$}  {:>5}  {:>6}  {:>8}  {:>12}  {:>12}\n",
        "NODE", "STATE", "HTTP", "RECORDS", "CREATED", "MODIFIED"
    ));

    for node in nodes {
        let state = if node.is_up() { "up" } else { "down" };
        let http = node
            .http_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| ABSENT.to_string());
        let count = node
            .record_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| ABSENT.to_string());
        let created = node
            .last_created
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_else(|| ABSENT.to_string());
        let modified = node
            .last_modified
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_else(|| ABSENT.to_string());

        out.push_str(&format!(
            "{:<width$}  {:>5}  {:>6}  {:>8}  {:>12}  {:>12}\n",
            node.endpoint.url(),
            state,
            http,
            count,
            created,
            modified
        ));
    }

    out
}
