use crate::output::report::{CheckReport, LinkResult};
use crate::state::LinkState;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::str::FromStr;

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "invalid format '{}' (expected text, json or csv)",
                other
            )),
        }
    }
}

/// Renders a report in the requested format
///
/// # Returns
///
/// * `Ok(String)` - The rendered report
/// * `Err(serde_json::Error)` - JSON serialization failed
pub fn render_report(report: &CheckReport, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Csv => Ok(render_csv(report)),
    }
}

/// Lists broken links grouped by the page they were found on
fn render_text(report: &CheckReport) -> String {
    let mut out = String::new();

    let mut by_parent: BTreeMap<&str, Vec<&LinkResult>> = BTreeMap::new();
    for link in report.by_state(LinkState::Broken) {
        by_parent
            .entry(link.parent.as_deref().unwrap_or("(root)"))
            .or_default()
            .push(link);
    }

    for (parent, links) in &by_parent {
        let _ = writeln!(out, "{}", parent);
        for link in links {
            let _ = writeln!(out, "  [{}] {}", link.status, link.url);
            for detail in &link.failure_details {
                let _ = writeln!(out, "      {}", detail);
            }
        }
    }

    let _ = writeln!(
        out,
        "{} {} links checked: {} ok, {} broken, {} skipped",
        if report.passed { "✓" } else { "✗" },
        report.links.len(),
        report.count(LinkState::Ok),
        report.count(LinkState::Broken),
        report.count(LinkState::Skipped),
    );

    out
}

fn render_csv(report: &CheckReport) -> String {
    let mut out = String::from("url,status,state,parent,failure_details\n");

    for link in &report.links {
        let details = link
            .failure_details
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            csv_field(&link.url),
            link.status,
            link.state,
            csv_field(link.parent.as_deref().unwrap_or("")),
            csv_field(&details),
        );
    }

    out
}

/// Quotes a CSV field when it contains a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
