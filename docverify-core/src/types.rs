use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ===== DOCUMENT MODEL =====
// Produced by an external DOCX parser and handed to the engine read-only.
// Field names follow the JSON the parser emits.

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentModel {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Paragraph {
    /// Plain text of the paragraph. When empty, the text of `runs` is used.
    #[serde(default)]
    pub text: String,
    /// Word style name, e.g. "Normal", "Heading 2", "List Bullet"
    #[serde(default = "default_style")]
    pub style: String,
    /// Explicit outline level. Takes precedence over a "Heading N" style.
    #[serde(default)]
    pub heading_level: Option<u8>,
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    #[serde(default)]
    pub hyperlinks: Vec<Hyperlink>,
}

fn default_style() -> String {
    "Normal".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    /// Foreground color as hex ("1F1F1F" or "#1F1F1F")
    #[serde(default)]
    pub color: Option<String>,
    /// Background/highlight color as hex
    #[serde(default)]
    pub highlight: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageInfo {
    pub name: String,
    /// The `descr` attribute of the drawing
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub decorative: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Hyperlink {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// Document-level metadata from the external extraction step. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub last_modified_by: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub watermark: Option<String>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: default_style(),
            ..Default::default()
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: format!("Heading {level}"),
            heading_level: Some(level),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Text of the paragraph, falling back to the concatenated runs
    pub fn full_text(&self) -> String {
        if !self.text.is_empty() || self.runs.is_empty() {
            return self.text.clone();
        }
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Outline level if this paragraph is a heading
    pub fn level(&self) -> Option<u8> {
        if let Some(level) = self.heading_level {
            // Outline level 0 is body text
            return Some(level).filter(|level| *level > 0);
        }
        let style = self.style.trim();
        let rest = style
            .strip_prefix("Heading")
            .or_else(|| style.strip_prefix("heading"))?;
        rest.trim().parse::<u8>().ok().filter(|level| *level > 0)
    }

    pub fn is_heading(&self) -> bool {
        self.level().is_some()
    }

    pub fn is_list_style(&self) -> bool {
        self.style.to_lowercase().contains("list")
    }
}

impl DocumentModel {
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            ..Default::default()
        }
    }

    /// Convenience for plain-text fixtures: one Normal paragraph per entry
    pub fn from_text_lines(lines: &[&str]) -> Self {
        Self::from_paragraphs(lines.iter().map(|l| Paragraph::new(*l)).collect())
    }

    /// (index, level, text) for each heading in document order
    pub fn headings(&self) -> Vec<(usize, u8, String)> {
        self.paragraphs
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.level().map(|level| (i, level, p.full_text())))
            .collect()
    }

    /// Full body text, one paragraph per line
    pub fn body_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.full_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ===== FINDINGS =====

/// Fixed classification buckets. Callers outside the engine must not invent new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Heading,
    Format,
    Structure,
    Terminology,
    Readability,
    Acronym,
    Accessibility,
    DocumentStatus,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Heading,
        Category::Format,
        Category::Structure,
        Category::Terminology,
        Category::Readability,
        Category::Acronym,
        Category::Accessibility,
        Category::DocumentStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Heading => "heading",
            Category::Format => "format",
            Category::Structure => "structure",
            Category::Terminology => "terminology",
            Category::Readability => "readability",
            Category::Acronym => "acronym",
            Category::Accessibility => "accessibility",
            Category::DocumentStatus => "document_status",
        }
    }

    /// Section title used by the HTML renderer
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Heading => "Headings",
            Category::Format => "Formatting",
            Category::Structure => "Document Structure",
            Category::Terminology => "Terminology",
            Category::Readability => "Readability",
            Category::Acronym => "Acronyms",
            Category::Accessibility => "Section 508 Accessibility",
            Category::DocumentStatus => "Document Status",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "heading" | "headings" => Ok(Category::Heading),
            "format" | "formatting" => Ok(Category::Format),
            "structure" => Ok(Category::Structure),
            "terminology" => Ok(Category::Terminology),
            "readability" => Ok(Category::Readability),
            "acronym" | "acronyms" => Ok(Category::Acronym),
            "accessibility" => Ok(Category::Accessibility),
            "document_status" => Ok(Category::DocumentStatus),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Ordered most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "Errors",
            Severity::Warning => "Warnings",
            Severity::Info => "Information",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Severity::Error => "red",
            Severity::Warning => "orange",
            Severity::Info => "blue",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Zero-based paragraph index into `DocumentModel::paragraphs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<usize>,
    /// One-based line number within the paragraph text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Finding {
    pub fn new(category: Category, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            suggestion: None,
            location: None,
        }
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self::new(category, Severity::Error, message)
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self::new(category, Severity::Warning, message)
    }

    pub fn info(category: Category, message: impl Into<String>) -> Self {
        Self::new(category, Severity::Info, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn at_paragraph(mut self, index: usize) -> Self {
        let mut location = self.location.unwrap_or_default();
        location.paragraph = Some(index);
        self.location = Some(location);
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        let mut location = self.location.unwrap_or_default();
        location.line = Some(line);
        self.location = Some(location);
        self
    }
}

/// Aggregate output of one full run over one document.
///
/// Built only through [`CheckResult::from_findings`] (used by the aggregator);
/// the derived views are computed once and never touched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub has_errors: bool,
    pub findings: Vec<Finding>,
    pub by_category: IndexMap<Category, Vec<Finding>>,
    pub by_severity: IndexMap<Severity, Vec<Finding>>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeveritySummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl CheckResult {
    pub fn from_findings(findings: Vec<Finding>, metadata: DocumentMetadata) -> Self {
        let has_errors = findings.iter().any(|f| f.severity == Severity::Error);

        let mut by_category: IndexMap<Category, Vec<Finding>> = IndexMap::new();
        for category in Category::ALL {
            let bucket: Vec<Finding> = findings
                .iter()
                .filter(|f| f.category == category)
                .cloned()
                .collect();
            if !bucket.is_empty() {
                by_category.insert(category, bucket);
            }
        }

        let mut by_severity: IndexMap<Severity, Vec<Finding>> = IndexMap::new();
        for severity in Severity::ALL {
            let bucket: Vec<Finding> = findings
                .iter()
                .filter(|f| f.severity == severity)
                .cloned()
                .collect();
            if !bucket.is_empty() {
                by_severity.insert(severity, bucket);
            }
        }

        Self {
            has_errors,
            findings,
            by_category,
            by_severity,
            metadata,
        }
    }

    pub fn for_category(&self, category: Category) -> &[Finding] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn for_severity(&self, severity: Severity) -> &[Finding] {
        self.by_severity
            .get(&severity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn summary(&self) -> SeveritySummary {
        SeveritySummary {
            errors: self.for_severity(Severity::Error).len(),
            warnings: self.for_severity(Severity::Warning).len(),
            info: self.for_severity(Severity::Info).len(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
