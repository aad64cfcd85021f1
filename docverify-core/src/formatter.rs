// Result aggregation and HTML rendering.
// Findings are never dropped from a CheckResult; visibility only affects the rendered view.

use crate::types::{Category, CheckResult, DocumentMetadata, Finding, Severity};
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

const NOT_AVAILABLE: &str = "Not available";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Category sections, severity subsections
    #[default]
    Category,
    /// Severity sections, category subsections
    Severity,
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "category" | "categories" => Ok(GroupBy::Category),
            "severity" | "severities" => Ok(GroupBy::Severity),
            other => Err(format!("unknown grouping '{other}', expected 'category' or 'severity'")),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Category => f.write_str("category"),
            GroupBy::Severity => f.write_str("severity"),
        }
    }
}

/// Which categories the rendered report shows. Every category is visible by default.
///
/// Serialized as a `category -> bool` map; keys that aren't categories
/// (display-only groupings) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct VisibilitySettings {
    hidden: BTreeSet<Category>,
}

impl VisibilitySettings {
    pub fn all_hidden() -> Self {
        Self {
            hidden: Category::ALL.into_iter().collect(),
        }
    }

    pub fn is_visible(&self, category: Category) -> bool {
        !self.hidden.contains(&category)
    }

    pub fn hide(&mut self, category: Category) -> &mut Self {
        self.hidden.insert(category);
        self
    }

    pub fn show(&mut self, category: Category) -> &mut Self {
        self.hidden.remove(&category);
        self
    }

    pub fn is_all_hidden(&self) -> bool {
        Category::ALL.iter().all(|c| self.hidden.contains(c))
    }
}

impl From<BTreeMap<String, bool>> for VisibilitySettings {
    fn from(map: BTreeMap<String, bool>) -> Self {
        let hidden = map
            .into_iter()
            .filter(|(_, visible)| !visible)
            .filter_map(|(key, _)| key.parse::<Category>().ok())
            .collect();
        Self { hidden }
    }
}

impl From<VisibilitySettings> for BTreeMap<String, bool> {
    fn from(settings: VisibilitySettings) -> Self {
        Category::ALL
            .into_iter()
            .map(|c| (c.as_str().to_string(), settings.is_visible(c)))
            .collect()
    }
}

/// Merge per-checker finding lists, in the order given, into one result.
pub fn aggregate(
    findings_by_checker: Vec<Vec<Finding>>,
    metadata: DocumentMetadata,
) -> CheckResult {
    let findings: Vec<Finding> = findings_by_checker.into_iter().flatten().collect();
    CheckResult::from_findings(findings, metadata)
}

/// Render a result as an HTML fragment: metadata header, then grouped sections.
/// Hidden categories and groups left empty after filtering are not rendered.
pub fn render_html(
    result: &CheckResult,
    group_by: GroupBy,
    visibility: &VisibilitySettings,
) -> String {
    let mut html = String::from("<div class=\"docverify-report\">\n");
    html.push_str(&render_header(&result.metadata));

    match group_by {
        GroupBy::Category => {
            for (category, findings) in &result.by_category {
                if !visibility.is_visible(*category) {
                    continue;
                }
                let mut body = String::new();
                for severity in Severity::ALL {
                    let group: Vec<&Finding> =
                        findings.iter().filter(|f| f.severity == severity).collect();
                    if !group.is_empty() {
                        body.push_str(&render_subgroup(
                            &format!("severity-{}", severity.as_str()),
                            severity.label(),
                            &group,
                        ));
                    }
                }
                if !body.is_empty() {
                    html.push_str(&render_section(
                        &format!("category-{}", category.as_str()),
                        category.display_name(),
                        &body,
                    ));
                }
            }
        }
        GroupBy::Severity => {
            for (severity, findings) in &result.by_severity {
                let mut body = String::new();
                for category in Category::ALL {
                    if !visibility.is_visible(category) {
                        continue;
                    }
                    let group: Vec<&Finding> =
                        findings.iter().filter(|f| f.category == category).collect();
                    if !group.is_empty() {
                        body.push_str(&render_subgroup(
                            &format!("category-{}", category.as_str()),
                            category.display_name(),
                            &group,
                        ));
                    }
                }
                if !body.is_empty() {
                    html.push_str(&render_section(
                        &format!("severity-{}", severity.as_str()),
                        severity.label(),
                        &body,
                    ));
                }
            }
        }
    }

    html.push_str("</div>\n");
    html
}

fn render_header(metadata: &DocumentMetadata) -> String {
    let rows = [
        ("Title", text_or_na(&metadata.title)),
        ("Author", text_or_na(&metadata.author)),
        ("Last Modified By", text_or_na(&metadata.last_modified_by)),
        ("Created", timestamp_or_na(&metadata.created)),
        ("Modified", timestamp_or_na(&metadata.modified)),
    ];

    let mut header = String::from("<header class=\"report-metadata\">\n<h2>Document Information</h2>\n<table>\n");
    for (label, value) in rows {
        header.push_str(&format!(
            "<tr><th>{label}</th><td>{}</td></tr>\n",
            escape(value.as_str())
        ));
    }
    header.push_str("</table>\n</header>\n");
    header
}

fn text_or_na(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn timestamp_or_na(value: &Option<DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.format("%B %-d, %Y %H:%M UTC").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn render_section(class: &str, title: &str, body: &str) -> String {
    format!("<section class=\"report-group {class}\">\n<h2>{title}</h2>\n{body}</section>\n")
}

fn render_subgroup(class: &str, title: &str, findings: &[&Finding]) -> String {
    let mut out = format!("<div class=\"report-subgroup {class}\">\n<h3>{title}</h3>\n<ul>\n");
    for finding in findings {
        out.push_str(&render_finding(finding));
    }
    out.push_str("</ul>\n</div>\n");
    out
}

fn render_finding(finding: &Finding) -> String {
    let severity = finding.severity;
    let mut out = format!(
        "<li class=\"finding\"><span class=\"badge badge-{}\">{}</span> <span class=\"message\">{}</span>",
        severity.color(),
        severity.as_str().to_uppercase(),
        escape(finding.message.as_str())
    );

    if let Some(location) = finding.location.as_ref().and_then(format_location) {
        out.push_str(&format!(" <span class=\"location\">{location}</span>"));
    }
    if let Some(suggestion) = &finding.suggestion {
        out.push_str(&format!(
            "<div class=\"suggestion\">Suggestion: {}</div>",
            escape(suggestion.as_str())
        ));
    }
    out.push_str("</li>\n");
    out
}

fn format_location(location: &crate::types::Location) -> Option<String> {
    match (location.paragraph, location.line) {
        (Some(p), Some(l)) => Some(format!("Paragraph {}, line {l}", p + 1)),
        (Some(p), None) => Some(format!("Paragraph {}", p + 1)),
        (None, Some(l)) => Some(format!("Line {l}")),
        (None, None) => None,
    }
}
