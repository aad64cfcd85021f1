// Table and figure captions and the references that point at them.
// Reported under the format category.

use super::{Checker, CheckerRef};
use crate::config::{ResolvedDocType, TerminologyData};
use crate::types::{Category, DocumentModel, Finding};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

lazy_static! {
    /// "Table 3-1. Title", "Figure 2: Layout", "Table 4 – Limits"
    static ref CAPTION: Regex =
        Regex::new(r"^\s*(Table|Figure)\s+(\d+(?:[-.]\d+)?)(?:\s*[.:]|\s+[-–])(?:\s|$)").unwrap();
    /// Caption-styled paragraphs only need the label and number
    static ref CAPTION_LABEL: Regex = Regex::new(r"(?i)^\s*(table|figure)\s+(\d+(?:[-.]\d+)?)").unwrap();
    static ref REFERENCE: Regex = Regex::new(r"(?i)\b(table|figure)\s+(\d+(?:-\d+)?)\b").unwrap();
    static ref CHAPTERED_NUMBER: Regex = Regex::new(r"^\d+-\d+$").unwrap();
    static ref SEQUENTIAL_NUMBER: Regex = Regex::new(r"^\d+$").unwrap();
}

pub fn implementations() -> Vec<CheckerRef> {
    vec![Arc::new(CaptionFormatCheck), Arc::new(TableFigureReferenceCheck)]
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Caption {
    paragraph: Option<usize>,
    /// "Table" or "Figure"
    kind: String,
    number: String,
}

fn title_case(kind: &str) -> String {
    let lower = kind.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => lower,
    }
}

fn captions(document: &DocumentModel) -> Vec<Caption> {
    let mut found = Vec::new();
    for (index, paragraph) in document.paragraphs.iter().enumerate() {
        if paragraph.is_heading() {
            continue;
        }
        let text = paragraph.full_text();
        let caps = if paragraph.style.to_lowercase().contains("caption") {
            CAPTION_LABEL.captures(&text)
        } else {
            CAPTION.captures(&text)
        };
        if let Some(caps) = caps {
            found.push(Caption {
                paragraph: Some(index),
                kind: title_case(&caps[1]),
                number: caps[2].to_string(),
            });
        }
    }
    for table in &document.tables {
        let Some(caption) = &table.caption else {
            continue;
        };
        if let Some(caps) = CAPTION_LABEL.captures(caption) {
            found.push(Caption {
                paragraph: None,
                kind: title_case(&caps[1]),
                number: caps[2].to_string(),
            });
        }
    }
    found
}

fn follows_scheme(number: &str, doc_type: &ResolvedDocType) -> bool {
    if doc_type.is_chaptered() {
        CHAPTERED_NUMBER.is_match(number)
    } else {
        SEQUENTIAL_NUMBER.is_match(number)
    }
}

fn scheme_name(doc_type: &ResolvedDocType) -> &'static str {
    if doc_type.is_chaptered() {
        "chapter-relative"
    } else {
        "sequential"
    }
}

pub struct CaptionFormatCheck;

impl Checker for CaptionFormatCheck {
    fn name(&self) -> &str {
        "check_caption_format"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for caption in captions(document) {
            if follows_scheme(&caption.number, doc_type) {
                continue;
            }
            let Caption { paragraph, kind, number } = caption;
            let example = if doc_type.is_chaptered() {
                format!("{kind} 2-1")
            } else {
                format!("{kind} 1")
            };
            let mut finding = Finding::error(
                Category::Format,
                format!(
                    "Incorrect caption format: '{kind} {number}'. {} documents use {} numbering.",
                    doc_type.name,
                    scheme_name(doc_type)
                ),
            )
            .with_suggestion(format!("Number the caption like '{example}'."));
            if let Some(index) = paragraph {
                finding = finding.at_paragraph(index);
            }
            findings.push(finding);
        }
        Ok(findings)
    }
}

/// A reference starts a sentence when nothing but sentence-ending
/// punctuation precedes it. Parentheses and quotes make it mid-sentence.
fn at_sentence_start(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end();
    match before.chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?' | ':'),
    }
}

pub struct TableFigureReferenceCheck;

impl Checker for TableFigureReferenceCheck {
    fn name(&self) -> &str {
        "check_table_figure_references"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let captions = captions(document);
        let caption_paragraphs: HashSet<usize> =
            captions.iter().filter_map(|c| c.paragraph).collect();
        let known: HashSet<(String, String)> = captions
            .into_iter()
            .map(|c| (c.kind, c.number))
            .collect();

        let mut findings = Vec::new();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            if paragraph.is_heading() || caption_paragraphs.contains(&index) {
                continue;
            }
            let text = paragraph.full_text();
            for caps in REFERENCE.captures_iter(&text) {
                let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let reference = whole.as_str();
                let word = word.as_str();
                let kind = title_case(word);
                let number = &caps[2];
                let starts_upper = word.chars().next().is_some_and(char::is_uppercase);

                if at_sentence_start(&text, whole.start()) {
                    if !starts_upper {
                        findings.push(
                            Finding::warning(
                                Category::Format,
                                format!("{kind} reference at sentence start should be capitalized: '{reference}'."),
                            )
                            .with_suggestion(format!("{kind} {number}"))
                            .at_paragraph(index),
                        );
                    }
                } else if starts_upper {
                    findings.push(
                        Finding::warning(
                            Category::Format,
                            format!("{kind} reference within a sentence should be lowercase: '{reference}'."),
                        )
                        .with_suggestion(format!("{} {number}", kind.to_lowercase()))
                        .at_paragraph(index),
                    );
                }

                if !follows_scheme(number, doc_type) {
                    findings.push(
                        Finding::warning(
                            Category::Format,
                            format!(
                                "Reference to {kind} {number} doesn't follow the {} numbering used in {} documents.",
                                scheme_name(doc_type),
                                doc_type.name
                            ),
                        )
                        .at_paragraph(index),
                    );
                } else if !known.contains(&(kind.clone(), number.to_string())) {
                    findings.push(
                        Finding::warning(
                            Category::Format,
                            format!("Reference to {kind} {number} has no matching caption."),
                        )
                        .with_suggestion(format!("Add a caption for {kind} {number} or correct the reference."))
                        .at_paragraph(index),
                    );
                }
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::run;
    use crate::types::{Paragraph, Severity, Table};
    use pretty_assertions::assert_eq;

    fn document(lines: &[&str]) -> DocumentModel {
        DocumentModel::from_text_lines(lines)
    }

    #[test]
    fn test_caption_scheme_depends_on_document_type() {
        let doc = document(&["Table 3-1. Required Equipment", "Figure 2: Panel Layout"]);

        let findings = run(&CaptionFormatCheck, &doc, "Advisory Circular");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Incorrect caption format: 'Figure 2'"));
        assert_eq!(findings[0].severity, Severity::Error);

        let findings = run(&CaptionFormatCheck, &doc, "Policy Statement");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Incorrect caption format: 'Table 3-1'"));
    }

    #[test]
    fn test_table_captions_are_checked() {
        let mut doc = document(&[]);
        doc.tables.push(Table {
            caption: Some("Table 4 Limits".to_string()),
            rows: vec![],
        });
        let findings = run(&CaptionFormatCheck, &doc, "Order");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].location.is_none());
    }

    #[test]
    fn test_reference_capitalization() {
        let doc = document(&[
            "Table 1. Limits",
            "The limits appear in Table 1. table 1 lists them (see Table 1).",
        ]);
        let findings = run(&TableFigureReferenceCheck, &doc, "Policy Statement");
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Table reference within a sentence should be lowercase: 'Table 1'.",
                "Table reference at sentence start should be capitalized: 'table 1'.",
                "Table reference within a sentence should be lowercase: 'Table 1'.",
            ]
        );
    }

    #[test]
    fn test_reference_without_caption() {
        let doc = DocumentModel::from_paragraphs(vec![
            Paragraph::new("Figure 2-1. Panel").with_style("Caption"),
            Paragraph::new("Compare figure 2-1 with figure 2-2."),
        ]);
        let findings = run(&TableFigureReferenceCheck, &doc, "Advisory Circular");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Reference to Figure 2-2 has no matching caption.");
    }
}
