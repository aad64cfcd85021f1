// Structure checks: paragraph and sentence length, section balance,
// required standard language and footnote numbering.

use super::{body_paragraphs, paragraph_texts, Checker, CheckerRef};
use crate::config::{ResolvedDocType, TerminologyData};
use crate::text_utils::{
    collapse_whitespace, count_words, estimate_lines, is_list_item, preview, split_sentences,
};
use crate::types::{Category, DocumentModel, Finding, Paragraph};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Mandated paragraphs that length checks never flag
const BOILERPLATE_PARAGRAPHS: &[&str] = &[
    "Confidential Business Information (CBI) is commercial or financial information that is both customarily and actually treated as private by its owner. Under the Freedom of Information Act (FOIA) (5 U.S.C. 552), CBI is exempt from public disclosure.",
    "The FAA will treat such marked submissions as confidential under the FOIA, and the indicated comments will not be placed in the public docket",
    "This material does not change or create any additional regulatory requirements nor does it authorize changes in or deviations from existing regulatory requirements.",
];

lazy_static! {
    static ref NOTE_PARAGRAPH: Regex = Regex::new(r"(?i)^\s*(?:note|warning|caution)\b\s*\d*\s*[:.]").unwrap();
    static ref LIST_SECTION_TITLE: Regex = Regex::new(
        r"(?i)should include.*following|related materials?|test category|requirements|items|steps|procedures"
    )
    .unwrap();
    static ref FOOTNOTE_MARKER: Regex = Regex::new(r"\[(\d{1,3})\]").unwrap();
    static ref FOOTNOTE_BODY: Regex = Regex::new(r"^\s*\[(\d{1,3})\]").unwrap();
    static ref HAS_DIGIT: Regex = Regex::new(r"\d").unwrap();
}

pub fn implementations() -> Vec<CheckerRef> {
    vec![
        Arc::new(ParagraphLengthCheck),
        Arc::new(SentenceLengthCheck),
        Arc::new(SectionBalanceCheck),
        Arc::new(RequiredLanguageCheck),
        Arc::new(FootnoteCheck),
    ]
}

fn normalized(text: &str) -> String {
    collapse_whitespace(&text.replace(['“', '”'], "\"").replace(['‘', '’'], "'")).to_lowercase()
}

fn is_boilerplate(text: &str, doc_type: &ResolvedDocType) -> bool {
    let text = normalized(text);
    BOILERPLATE_PARAGRAPHS
        .iter()
        .copied()
        .chain(doc_type.required_language.iter().map(String::as_str))
        .map(normalized)
        .any(|boilerplate| !boilerplate.is_empty() && text.contains(&boilerplate))
}

fn is_list_paragraph(paragraph: &Paragraph) -> bool {
    paragraph.is_list_style() || is_list_item(&paragraph.full_text())
}

pub struct ParagraphLengthCheck;

impl Checker for ParagraphLengthCheck {
    fn name(&self) -> &str {
        "check_paragraph_length"
    }

    fn category(&self) -> Category {
        Category::Structure
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let rules = &terminology.readability;
        let mut findings = Vec::new();

        for (index, paragraph) in body_paragraphs(document) {
            let text = paragraph.full_text();
            if text.trim().is_empty() || is_boilerplate(&text, doc_type) {
                continue;
            }
            let sentences = split_sentences(&text).len();
            let lines = estimate_lines(&text, rules.chars_per_line);
            if sentences > rules.max_sentences_per_paragraph || lines > rules.max_lines_per_paragraph {
                findings.push(
                    Finding::warning(
                        Category::Structure,
                        format!(
                            "Paragraph '{}' is too long ({sentences} sentences, about {lines} lines). Keep paragraphs to {} sentences and {} lines.",
                            preview(&text, 40),
                            rules.max_sentences_per_paragraph,
                            rules.max_lines_per_paragraph
                        ),
                    )
                    .with_suggestion("Split the paragraph into shorter paragraphs.")
                    .at_paragraph(index),
                );
            }
        }
        Ok(findings)
    }
}

/// Citation strings ("14 CFR 25.1309, 25.1301, and 25.1317") are mostly numbers
fn is_citation(sentence: &str) -> bool {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }
    let numeric = words.iter().filter(|w| HAS_DIGIT.is_match(w)).count();
    numeric * 2 >= words.len()
}

pub struct SentenceLengthCheck;

impl Checker for SentenceLengthCheck {
    fn name(&self) -> &str {
        "check_sentence_length"
    }

    fn category(&self) -> Category {
        Category::Structure
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let max = terminology.readability.max_sentence_words;
        let mut findings = Vec::new();

        for (index, paragraph) in body_paragraphs(document) {
            let text = paragraph.full_text();
            if is_list_paragraph(paragraph) || NOTE_PARAGRAPH.is_match(&text) {
                continue;
            }
            for sentence in split_sentences(&text) {
                let words = count_words(&sentence);
                if words > max && !is_citation(&sentence) {
                    findings.push(
                        Finding::warning(
                            Category::Structure,
                            format!(
                                "Sentence has {words} words. Keep sentences to {max} words or fewer: '{}'",
                                preview(&sentence, 60)
                            ),
                        )
                        .with_suggestion("Split the sentence or remove unneeded words.")
                        .at_paragraph(index),
                    );
                }
            }
        }
        Ok(findings)
    }
}

#[derive(Debug)]
struct Section {
    index: usize,
    title: String,
    paragraphs: usize,
    is_list: bool,
}

/// Each heading owns everything up to the next heading of equal or higher level
fn sections(document: &DocumentModel) -> Vec<Section> {
    let headings = document.headings();
    let mut sections = Vec::new();

    for (position, (index, level, title)) in headings.iter().enumerate() {
        let end = headings[position + 1..]
            .iter()
            .find(|(_, next_level, _)| next_level <= level)
            .map(|(next_index, _, _)| *next_index)
            .unwrap_or(document.paragraphs.len());

        let content: Vec<&Paragraph> = document.paragraphs[index + 1..end]
            .iter()
            .filter(|p| !p.full_text().trim().is_empty())
            .collect();
        let list_like = content.iter().filter(|p| is_list_paragraph(p)).count();
        let is_list = LIST_SECTION_TITLE.is_match(title) || list_like * 2 > content.len();

        sections.push(Section {
            index: *index,
            title: collapse_whitespace(title),
            paragraphs: content.len(),
            is_list,
        });
    }
    sections
}

fn mean(values: impl Iterator<Item = usize>) -> Option<f64> {
    let (sum, count) = values.fold((0usize, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

pub struct SectionBalanceCheck;

impl Checker for SectionBalanceCheck {
    fn name(&self) -> &str {
        "check_section_balance"
    }

    fn category(&self) -> Category {
        Category::Structure
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let rules = &terminology.readability;
        let sections = sections(document);
        let normal_avg = mean(sections.iter().filter(|s| !s.is_list).map(|s| s.paragraphs));
        let list_avg = mean(sections.iter().filter(|s| s.is_list).map(|s| s.paragraphs));

        let mut findings = Vec::new();
        for section in &sections {
            let (avg, ratio, floor) = if section.is_list {
                (list_avg, rules.list_section_ratio, rules.list_section_min_paragraphs)
            } else {
                (normal_avg, rules.section_ratio, rules.section_min_paragraphs)
            };
            let Some(avg) = avg else {
                continue;
            };
            if section.paragraphs as f64 > avg * ratio && section.paragraphs > floor {
                findings.push(
                    Finding::info(
                        Category::Structure,
                        format!(
                            "Section '{}' is much longer than similar sections ({} paragraphs, average {:.1}).",
                            section.title, section.paragraphs, avg
                        ),
                    )
                    .with_suggestion("Consider splitting the section into subsections.")
                    .at_paragraph(section.index),
                );
            }
        }
        Ok(findings)
    }
}

pub struct RequiredLanguageCheck;

impl Checker for RequiredLanguageCheck {
    fn name(&self) -> &str {
        "check_required_language"
    }

    fn category(&self) -> Category {
        Category::Structure
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        if doc_type.required_language.is_empty() {
            return Ok(Vec::new());
        }
        let body = normalized(&document.body_text());

        let findings = doc_type
            .required_language
            .iter()
            .filter(|phrase| !body.contains(&normalized(phrase)))
            .map(|phrase| {
                let excerpt: String = phrase.chars().take(60).collect();
                let excerpt = if phrase.chars().count() > 60 {
                    format!("{}…", excerpt.trim_end())
                } else {
                    excerpt
                };
                Finding::error(
                    Category::Structure,
                    format!("Missing required language: '{excerpt}'"),
                )
                .with_suggestion(phrase.clone())
            })
            .collect();
        Ok(findings)
    }
}

pub struct FootnoteCheck;

impl Checker for FootnoteCheck {
    fn name(&self) -> &str {
        "check_footnotes"
    }

    fn category(&self) -> Category {
        Category::Structure
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        let mut referenced: HashSet<u32> = HashSet::new();
        let mut defined: HashSet<u32> = HashSet::new();
        let mut highest = 0u32;

        for (index, text) in paragraph_texts(document) {
            // "[3] Footnote text" defines footnote 3
            let body_marker = FOOTNOTE_BODY.captures(&text).and_then(|c| c.get(1));
            if let Some(marker) = body_marker {
                let number = marker.as_str().parse::<u32>().unwrap_or(0);
                if !defined.insert(number) {
                    findings.push(
                        Finding::warning(
                            Category::Structure,
                            format!("Footnote [{number}] is defined more than once."),
                        )
                        .with_suggestion("Renumber the footnotes so each number is used once.")
                        .at_paragraph(index),
                    );
                }
            }

            for caps in FOOTNOTE_MARKER.captures_iter(&text) {
                let Some(marker) = caps.get(1) else {
                    continue;
                };
                if body_marker.is_some_and(|b| b.start() == marker.start()) {
                    continue;
                }
                let number = marker.as_str().parse::<u32>().unwrap_or(0);
                if !referenced.insert(number) {
                    continue;
                }
                if number > highest + 1 {
                    findings.push(
                        Finding::warning(
                            Category::Structure,
                            format!(
                                "Footnote [{number}] follows [{highest}]. Footnote [{}] is missing.",
                                highest + 1
                            ),
                        )
                        .with_suggestion("Number footnotes consecutively.")
                        .at_paragraph(index),
                    );
                }
                highest = highest.max(number);
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{run, run_text};
    use crate::types::Severity;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_long_paragraph_is_flagged() {
        let long = "The applicant must show compliance. ".repeat(7);
        let findings = run_text(&ParagraphLengthCheck, &[long.as_str(), "Short one."], "Order");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.and_then(|l| l.paragraph), Some(0));
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_boilerplate_paragraph_is_exempt() {
        let cbi = format!(
            "{} {}",
            BOILERPLATE_PARAGRAPHS[0],
            "Mark each page. Send it to us. Include your name. Include your address. Include the docket. Sign it."
        );
        assert!(run_text(&ParagraphLengthCheck, &[cbi.as_str()], "Special Condition").is_empty());
    }

    #[test]
    fn test_long_sentence_exemptions() {
        let long = format!("{}.", vec!["word"; 40].join(" "));
        let note = format!("NOTE: {long}");
        let bullet = format!("• {long}");
        let citation = "14 CFR 25.1301, 25.1309, 25.1317, 25.1322, 25.1329, 25.1331, 25.1333, 25.1351, 25.1353, 25.1355, 25.1357, 25.1360, 25.1362, 25.1363, 25.1365, 25.1431, 25.1435, 25.1438, 25.1441, 25.1445, 25.1447, 25.1449, 25.1450, 25.1453, 25.1455, 25.1457, 25.1459, 25.1461, 25.1501, 25.1503, 25.1505, 25.1507, 25.1511, 25.1513, 25.1515, and 25.1516.";

        let findings = run_text(
            &SentenceLengthCheck,
            &[long.as_str(), note.as_str(), bullet.as_str(), citation],
            "Order",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Sentence has 40 words."));
    }

    #[test]
    fn test_section_balance_uses_cohorts() {
        let mut paragraphs = Vec::new();
        for title in ["One", "Two", "Three", "Four"] {
            paragraphs.push(Paragraph::heading(1, title));
            paragraphs.push(Paragraph::new("Body text."));
            paragraphs.push(Paragraph::new("More body text."));
        }
        paragraphs.push(Paragraph::heading(1, "Five"));
        for _ in 0..14 {
            paragraphs.push(Paragraph::new("Long section text."));
        }
        // List cohort: a long list section alone never exceeds its own average
        paragraphs.push(Paragraph::heading(1, "Procedures"));
        for _ in 0..30 {
            paragraphs.push(Paragraph::new("• Step"));
        }

        let findings =
            run(&SectionBalanceCheck, &DocumentModel::from_paragraphs(paragraphs), "Order");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Section 'Five' is much longer"));
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_required_language() {
        let lines = ["This policy statement is not a regulation. It explains our approach."];
        assert!(run_text(&RequiredLanguageCheck, &lines, "Policy Statement").is_empty());

        let findings = run_text(&RequiredLanguageCheck, &["Nothing here."], "Policy Statement");
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Missing required language: 'This policy statement is not a regulation.'"
        );
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_footnote_gaps_and_duplicates() {
        let findings = run_text(
            &FootnoteCheck,
            &[
                "See the guidance[1] and the order[3].",
                "[1] First note.",
                "[1] Repeated note.",
            ],
            "Order",
        );
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Footnote [3] follows [1]. Footnote [2] is missing.",
                "Footnote [1] is defined more than once.",
            ]
        );
    }
}
