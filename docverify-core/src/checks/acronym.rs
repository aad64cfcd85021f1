// Acronym checks: definition on first use, unused definitions and redefinitions.
//
// Both checkers share one pass over the body text. Tokens matching an
// acronym ignore pattern (document numbers such as "AC 25-1" or
// "FAA-2024-0001") are excluded before anything else is considered.

use super::{body_paragraphs, overlaps, Checker, CheckerRef};
use crate::config::{ResolvedDocType, TerminologyData};
use crate::types::{Category, DocumentModel, Finding};
use anyhow::Result;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

lazy_static! {
    static ref ACRONYM_TOKEN: Regex = Regex::new(r"\b[A-Z]{2,}\b").unwrap();
    /// "Federal Aviation Administration (FAA)"
    static ref TRAILING_DEFINITION: Regex = Regex::new(r"\(\s*([A-Z]{2,})\s*\)").unwrap();
    /// "FAA (Federal Aviation Administration)"
    static ref LEADING_DEFINITION: Regex =
        Regex::new(r"\b([A-Z]{2,})\s*\(([^()]*[a-z][^()]*)\)").unwrap();
}

pub fn implementations() -> Vec<CheckerRef> {
    vec![Arc::new(AcronymDefinitionCheck), Arc::new(AcronymUsageCheck)]
}

#[derive(Debug, Default)]
struct Definition {
    paragraph: usize,
    uses_after: usize,
}

/// Result of one pass over the document
#[derive(Debug, Default)]
struct AcronymScan {
    /// First undefined use of each acronym
    undefined: Vec<(String, usize)>,
    definitions: IndexMap<String, Definition>,
    redefinitions: Vec<(String, usize)>,
}

fn is_candidate(token: &str, terminology: &TerminologyData) -> bool {
    let rules = &terminology.acronym_rules;
    let len = token.chars().count();
    len >= rules.min_length && len <= rules.max_length && !terminology.is_valid_word(token)
}

/// Byte offsets of acronyms that are being defined in `text`
fn definition_positions(text: &str) -> HashSet<usize> {
    let mut positions = HashSet::new();
    for caps in TRAILING_DEFINITION.captures_iter(text) {
        let (Some(whole), Some(acronym)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let preceded_by_word = text[..whole.start()]
            .trim_end()
            .chars()
            .last()
            .is_some_and(char::is_alphabetic);
        if preceded_by_word {
            positions.insert(acronym.start());
        }
    }
    for caps in LEADING_DEFINITION.captures_iter(text) {
        if let Some(acronym) = caps.get(1) {
            positions.insert(acronym.start());
        }
    }
    positions
}

fn scan(document: &DocumentModel, terminology: &TerminologyData) -> AcronymScan {
    let mut result = AcronymScan::default();
    let mut reported: HashSet<String> = HashSet::new();

    for (index, paragraph) in body_paragraphs(document) {
        let text = paragraph.full_text();
        let ignored: Vec<(usize, usize)> = terminology
            .acronym_ignore_patterns()
            .iter()
            .flat_map(|re| re.find_iter(&text).map(|m| (m.start(), m.end())))
            .collect();
        let defining = definition_positions(&text);

        for token in ACRONYM_TOKEN.find_iter(&text) {
            let acronym = token.as_str();
            if overlaps(&ignored, token.start(), token.end()) || !is_candidate(acronym, terminology) {
                continue;
            }

            if defining.contains(&token.start()) {
                if result.definitions.contains_key(acronym) {
                    result.redefinitions.push((acronym.to_string(), index));
                } else {
                    result.definitions.insert(
                        acronym.to_string(),
                        Definition {
                            paragraph: index,
                            uses_after: 0,
                        },
                    );
                }
                continue;
            }

            if let Some(definition) = result.definitions.get_mut(acronym) {
                definition.uses_after += 1;
            } else if reported.insert(acronym.to_string()) {
                result.undefined.push((acronym.to_string(), index));
            }
        }
    }

    result
}

pub struct AcronymDefinitionCheck;

impl Checker for AcronymDefinitionCheck {
    fn name(&self) -> &str {
        "check_acronym_definitions"
    }

    fn category(&self) -> Category {
        Category::Acronym
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let findings = scan(document, terminology)
            .undefined
            .into_iter()
            .map(|(acronym, index)| {
                let suggestion = match terminology.get_acronym(&acronym) {
                    Some(expansion) => format!("{expansion} ({acronym})"),
                    None => format!("Define '{acronym}' on first use."),
                };
                Finding::error(
                    Category::Acronym,
                    format!("Acronym '{acronym}' is used before it is defined."),
                )
                .with_suggestion(suggestion)
                .at_paragraph(index)
            })
            .collect();
        Ok(findings)
    }
}

pub struct AcronymUsageCheck;

impl Checker for AcronymUsageCheck {
    fn name(&self) -> &str {
        "check_acronym_usage"
    }

    fn category(&self) -> Category {
        Category::Acronym
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let scan = scan(document, terminology);
        let mut findings = Vec::new();

        for (acronym, definition) in &scan.definitions {
            if definition.uses_after == 0 {
                let suggestion = match terminology.get_acronym(acronym) {
                    Some(expansion) => {
                        format!("Remove the definition and spell out '{expansion}'.")
                    }
                    None => "Remove the definition or use the acronym later in the document.".to_string(),
                };
                findings.push(
                    Finding::warning(
                        Category::Acronym,
                        format!("Acronym '{acronym}' is defined but never used."),
                    )
                    .with_suggestion(suggestion)
                    .at_paragraph(definition.paragraph),
                );
            }
        }

        for (acronym, index) in &scan.redefinitions {
            findings.push(
                Finding::warning(
                    Category::Acronym,
                    format!("Acronym '{acronym}' is defined more than once."),
                )
                .with_suggestion(format!("Define '{acronym}' only on first use."))
                .at_paragraph(*index),
            );
        }

        Ok(findings)
    }
}
