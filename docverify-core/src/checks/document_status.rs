// Document status: watermark validation and the unrecognized-type marker.

use super::{Checker, CheckerRef};
use crate::config::{ResolvedDocType, TerminologyData};
use crate::text_utils::collapse_whitespace;
use crate::types::{Category, DocumentModel, Finding};
use anyhow::Result;
use std::sync::Arc;

pub fn implementations() -> Vec<CheckerRef> {
    vec![Arc::new(WatermarkCheck), Arc::new(DocumentTypeMarkerCheck)]
}

fn normalize_watermark(text: &str) -> String {
    collapse_whitespace(&text.replace(['-', '–', '—'], " ")).to_lowercase()
}

/// Metadata watermark first, then a paragraph styled "Watermark"
fn find_watermark(document: &DocumentModel) -> Option<(Option<usize>, String)> {
    if let Some(watermark) = document
        .metadata
        .watermark
        .as_deref()
        .filter(|w| !w.trim().is_empty())
    {
        return Some((None, watermark.trim().to_string()));
    }
    document
        .paragraphs
        .iter()
        .enumerate()
        .find(|(_, p)| p.style.eq_ignore_ascii_case("watermark") && !p.full_text().trim().is_empty())
        .map(|(index, p)| (Some(index), p.full_text().trim().to_string()))
}

fn locate(finding: Finding, paragraph: Option<usize>) -> Finding {
    match paragraph {
        Some(index) => finding.at_paragraph(index),
        None => finding,
    }
}

/// Validates the draft watermark against the requested review stage.
///
/// With a known stage the watermark must be that stage's text. Without a
/// stage any stage watermark is accepted. An unknown stage is a WARNING and
/// falls back to the stage-less rules.
pub struct WatermarkCheck;

impl Checker for WatermarkCheck {
    fn name(&self) -> &str {
        "check_watermark"
    }

    fn category(&self) -> Category {
        Category::DocumentStatus
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        let expected = match doc_type.stage.as_deref() {
            Some(stage) => match terminology.watermark_for_stage(stage) {
                Some(text) => Some((stage, text)),
                None => {
                    let stages: Vec<&str> =
                        terminology.watermarks.keys().map(String::as_str).collect();
                    findings.push(
                        Finding::warning(
                            Category::DocumentStatus,
                            format!("Unknown document stage: '{stage}'."),
                        )
                        .with_suggestion(format!("Use one of: {}.", stages.join(", "))),
                    );
                    None
                }
            },
            None => None,
        };

        let Some((paragraph, watermark)) = find_watermark(document) else {
            if let Some((stage, text)) = expected {
                findings.push(
                    Finding::error(
                        Category::DocumentStatus,
                        format!(
                            "Watermark missing. {} drafts at the {stage} stage need a watermark.",
                            doc_type.name
                        ),
                    )
                    .with_suggestion(format!("Add the watermark '{text}'.")),
                );
            } else if doc_type.config.requires_watermark {
                let mut finding = Finding::error(
                    Category::DocumentStatus,
                    format!("{} documents require a watermark, but none was found.", doc_type.name),
                );
                if let Some(first) = terminology.watermarks.values().next() {
                    finding = finding.with_suggestion(format!("Add a watermark such as '{first}'."));
                }
                findings.push(finding);
            }
            return Ok(findings);
        };

        let key = normalize_watermark(&watermark);
        match expected {
            Some((stage, text)) => {
                if normalize_watermark(text) != key {
                    findings.push(locate(
                        Finding::error(
                            Category::DocumentStatus,
                            format!(
                                "Use the '{text}' watermark for the {stage} stage, not '{watermark}'."
                            ),
                        )
                        .with_suggestion(text.to_string()),
                        paragraph,
                    ));
                }
            }
            None => {
                let accepted: Vec<&str> =
                    terminology.watermarks.values().map(String::as_str).collect();
                if !accepted.is_empty() && !accepted.iter().any(|w| normalize_watermark(w) == key) {
                    findings.push(locate(
                        Finding::error(
                            Category::DocumentStatus,
                            format!(
                                "Watermark '{watermark}' is not a valid watermark for {} documents.",
                                doc_type.name
                            ),
                        )
                        .with_suggestion(format!("Use one of: {}.", accepted.join("; "))),
                        paragraph,
                    ));
                }
            }
        }
        Ok(findings)
    }
}

pub struct DocumentTypeMarkerCheck;

impl Checker for DocumentTypeMarkerCheck {
    fn name(&self) -> &str {
        "check_document_type_marker"
    }

    fn category(&self) -> Category {
        Category::DocumentStatus
    }

    fn run(
        &self,
        _document: &DocumentModel,
        doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        Ok(doc_type.marker().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{run, terminology};
    use crate::types::{Paragraph, Severity};
    use pretty_assertions::assert_eq;

    fn with_watermark(watermark: &str) -> DocumentModel {
        let mut doc = DocumentModel::from_text_lines(&["Body."]);
        doc.metadata.watermark = Some(watermark.to_string());
        doc
    }

    fn run_at_stage(doc: &DocumentModel, doc_type: &str, stage: &str) -> Vec<Finding> {
        let terminology = terminology();
        let resolved = terminology.get_document_type_config(doc_type).at_stage(Some(stage));
        WatermarkCheck.run(doc, &resolved, &terminology).unwrap()
    }

    #[test]
    fn test_any_stage_watermark_is_accepted_without_a_stage() {
        let doc = with_watermark("DRAFT – for public comments");
        assert!(run(&WatermarkCheck, &doc, "Advisory Circular").is_empty());

        for doc_type in ["Advisory Circular", "Order", "Policy Statement", "NPRM"] {
            let findings = run(&WatermarkCheck, &with_watermark("Preliminary"), doc_type);
            assert_eq!(findings.len(), 1, "{doc_type}");
            assert_eq!(findings[0].severity, Severity::Error);
        }
        let findings = run(&WatermarkCheck, &with_watermark("Preliminary"), "Advisory Circular");
        assert_eq!(
            findings[0].message,
            "Watermark 'Preliminary' is not a valid watermark for Advisory Circular documents."
        );
    }

    #[test]
    fn test_watermark_paragraph_is_found() {
        let doc = DocumentModel::from_paragraphs(vec![
            Paragraph::new("Body."),
            Paragraph::new("Preliminary").with_style("Watermark"),
        ]);
        let findings = run(&WatermarkCheck, &doc, "AC");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.and_then(|l| l.paragraph), Some(1));
    }

    #[test]
    fn test_stage_watermark_must_match() {
        let doc = with_watermark("Draft for public comments");
        assert!(run_at_stage(&doc, "Order", "public comment").is_empty());

        let findings = run_at_stage(&doc, "Order", "final_draft");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].suggestion.as_deref(), Some("draft for final issuance"));
    }

    #[test]
    fn test_unknown_stage_warns() {
        let doc = with_watermark("draft for FAA review");
        let findings = run_at_stage(&doc, "Order", "peer_review");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].message, "Unknown document stage: 'peer_review'.");
    }

    #[test]
    fn test_missing_watermark() {
        let doc = DocumentModel::from_text_lines(&["Body."]);

        let findings = run(&WatermarkCheck, &doc, "Advisory Circular");
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Advisory Circular documents require a watermark, but none was found."
        );
        assert_eq!(findings[0].severity, Severity::Error);

        // Types without the requirement only need one when a stage is given
        assert!(run(&WatermarkCheck, &doc, "Rule").is_empty());
        let findings = run_at_stage(&doc, "Rule", "internal_review");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggestion.as_deref(), Some("Add the watermark 'draft for FAA review'."));
    }

    #[test]
    fn test_marker_only_for_unrecognized_types() {
        let doc = DocumentModel::from_text_lines(&["Body."]);
        assert!(run(&DocumentTypeMarkerCheck, &doc, "Order").is_empty());

        let findings = run(&DocumentTypeMarkerCheck, &doc, "Memo to File");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[0].category, Category::DocumentStatus);
        assert!(findings[0].message.contains("'Memo to File' is not recognized"));
    }
}
