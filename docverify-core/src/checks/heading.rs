// Heading checks: required headings, trailing periods, length and numbering sequence.

use super::{body_paragraphs, Checker, CheckerRef};
use crate::config::{HeadingCondition, HeadingPresence, ResolvedDocType, TerminologyData};
use crate::text_utils::{
    collapse_whitespace, count_words, heading_key, normalize_heading, strip_heading_number,
};
use crate::types::{Category, DocumentModel, Finding};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref CANCELLATION: Regex =
        Regex::new(r"(?i)\b(?:cancels|cancellation of|is canceled|is cancelled|supersedes)\b").unwrap();
    static ref HEADING_NUMBER: Regex = Regex::new(r"^\s*(\d+(?:\.\d+)*)\.?(?:\s|$)").unwrap();
}

/// Headings longer than this are body text styled as a heading; period rules don't apply
const MAX_PERIOD_CHECK_CHARS: usize = 100;
const MAX_PERIOD_CHECK_WORDS: usize = 15;

pub fn implementations() -> Vec<CheckerRef> {
    vec![
        Arc::new(RequiredHeadingsCheck),
        Arc::new(HeadingPeriodsCheck),
        Arc::new(HeadingLengthCheck),
        Arc::new(HeadingSequenceCheck),
    ]
}

fn condition_detected(condition: &HeadingCondition, document: &DocumentModel) -> bool {
    match condition {
        HeadingCondition::IfCancelsPrevious => {
            body_paragraphs(document).any(|(_, p)| CANCELLATION.is_match(&p.full_text()))
        }
        HeadingCondition::Unknown(name) => {
            debug!(condition = %name, "unknown heading condition, treating as not detected");
            false
        }
    }
}

fn optional_heading_message(name: &str, condition: Option<&HeadingCondition>) -> String {
    match condition {
        Some(HeadingCondition::IfCancelsPrevious) => format!(
            "Missing '{name}' heading. This section is needed only if the document cancels an earlier version. If not applicable, this can be ignored."
        ),
        _ => format!("Missing '{name}' heading. This section is optional. If not applicable, this can be ignored."),
    }
}

pub struct RequiredHeadingsCheck;

impl Checker for RequiredHeadingsCheck {
    fn name(&self) -> &str {
        "check_required_headings"
    }

    fn category(&self) -> Category {
        Category::Heading
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        if doc_type.config.skip_title_check {
            debug!(doc_type = %doc_type.name, "skipping required-headings check");
            return Ok(Vec::new());
        }
        let required = &doc_type.config.required_headings;
        if required.is_empty() {
            return Ok(Vec::new());
        }

        let present: HashSet<String> = document
            .headings()
            .iter()
            .map(|(_, _, text)| heading_key(text))
            .collect();

        let mut missing = Vec::new();
        let mut notes = Vec::new();
        for heading in required {
            if present.contains(&heading_key(&heading.name)) {
                continue;
            }
            match &heading.presence {
                HeadingPresence::Required => missing.push(heading.name.as_str()),
                HeadingPresence::Optional => notes.push(Finding::info(
                    Category::Heading,
                    optional_heading_message(&heading.name, None),
                )),
                HeadingPresence::Conditional(condition) => {
                    if condition_detected(condition, document) {
                        missing.push(heading.name.as_str());
                    } else {
                        notes.push(Finding::info(
                            Category::Heading,
                            optional_heading_message(&heading.name, Some(condition)),
                        ));
                    }
                }
            }
        }

        let mut findings = Vec::new();
        if !missing.is_empty() {
            let list = missing.join(", ");
            findings.push(
                Finding::error(Category::Heading, format!("Missing required headings: {list}"))
                    .with_suggestion(format!(
                        "Add the following headings required for a {}: {list}",
                        doc_type.name
                    )),
            );
        }
        findings.extend(notes);
        Ok(findings)
    }
}

pub struct HeadingPeriodsCheck;

impl Checker for HeadingPeriodsCheck {
    fn name(&self) -> &str {
        "check_heading_periods"
    }

    fn category(&self) -> Category {
        Category::Heading
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let Some(requires_period) = doc_type.heading_periods else {
            return Ok(Vec::new());
        };

        let mut findings = Vec::new();
        for (index, _, text) in document.headings() {
            let text = normalize_heading(&text);
            if text.is_empty()
                || text.chars().count() > MAX_PERIOD_CHECK_CHARS
                || count_words(&text) > MAX_PERIOD_CHECK_WORDS
            {
                continue;
            }

            let has_period = text.ends_with('.');
            if requires_period && !has_period {
                findings.push(
                    Finding::warning(
                        Category::Heading,
                        format!("Heading '{text}' should end with a period."),
                    )
                    .with_suggestion(format!("{text}."))
                    .at_paragraph(index),
                );
            } else if !requires_period && has_period {
                let trimmed = text.trim_end_matches('.').trim_end();
                findings.push(
                    Finding::warning(
                        Category::Heading,
                        format!("Heading '{text}' should not end with a period."),
                    )
                    .with_suggestion(trimmed.to_string())
                    .at_paragraph(index),
                );
            }
        }
        Ok(findings)
    }
}

pub struct HeadingLengthCheck;

impl Checker for HeadingLengthCheck {
    fn name(&self) -> &str {
        "check_heading_length"
    }

    fn category(&self) -> Category {
        Category::Heading
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let max = terminology.readability.max_heading_length;
        // Mandated heading wording is never flagged for length
        let mandated: HashSet<String> = doc_type
            .config
            .required_headings
            .iter()
            .map(|h| heading_key(&h.name))
            .collect();

        let mut findings = Vec::new();
        for (index, _, text) in document.headings() {
            if mandated.contains(&heading_key(&text)) {
                continue;
            }
            let stripped = collapse_whitespace(strip_heading_number(&text));
            let stripped = stripped.trim_end_matches('.');
            let length = stripped.chars().count();
            if length > max {
                findings.push(
                    Finding::warning(
                        Category::Heading,
                        format!(
                            "Heading '{stripped}' is {length} characters long. Keep headings to {max} characters or fewer."
                        ),
                    )
                    .with_suggestion("Shorten the heading and move detail into the section text.")
                    .at_paragraph(index),
                );
            }
        }
        Ok(findings)
    }
}

/// Outline depth of a numbered heading: "1." -> 1, "2.3." -> 2
fn numbering_depth(text: &str) -> Option<usize> {
    HEADING_NUMBER
        .captures(text)
        .map(|caps| caps[1].split('.').count())
}

pub struct HeadingSequenceCheck;

impl Checker for HeadingSequenceCheck {
    fn name(&self) -> &str {
        "check_heading_sequence"
    }

    fn category(&self) -> Category {
        Category::Heading
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        let mut previous: Option<usize> = None;

        for (index, _, text) in document.headings() {
            let Some(depth) = numbering_depth(&text) else {
                continue;
            };
            if let Some(prev) = previous {
                if depth > prev + 1 {
                    findings.push(
                        Finding::warning(
                            Category::Heading,
                            format!(
                                "Heading H{depth} follows H{prev}. Missing heading H{}.",
                                prev + 1
                            ),
                        )
                        .with_suggestion(format!(
                            "Add an H{} heading before '{}' or renumber it.",
                            prev + 1,
                            collapse_whitespace(&text)
                        ))
                        .at_paragraph(index),
                    );
                }
            }
            previous = Some(depth);
        }
        Ok(findings)
    }
}
