// Readability checks. All findings are advisory (INFO).

use super::{body_paragraphs, Checker, CheckerRef};
use crate::config::{ResolvedDocType, TerminologyData};
use crate::text_utils::{
    alpha_words, calculate_readability_metrics, count_syllables, is_complex_word, is_list_item,
    is_passive_sentence, preview, round1, split_sentences,
};
use crate::types::{Category, DocumentModel, Finding};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Below this many words the formulas are too noisy to report
const MIN_WORDS_FOR_METRICS: usize = 100;

/// Wordy phrase and its plain replacement
const WORDY_PHRASES: &[(&str, &str)] = &[
    ("in order to", "to"),
    ("at this point in time", "now"),
    ("at the present time", "now"),
    ("prior to", "before"),
    ("subsequent to", "after"),
    ("in the event that", "if"),
    ("due to the fact that", "because"),
    ("in light of the fact that", "because"),
    ("with regard to", "about"),
    ("with respect to", "about"),
    ("a number of", "some"),
    ("is able to", "can"),
    ("has the ability to", "can"),
    ("for the purpose of", "to"),
    ("in close proximity to", "near"),
    ("on a monthly basis", "monthly"),
];

lazy_static! {
    static ref WORDY_PATTERNS: Vec<(Regex, &'static str, &'static str)> = WORDY_PHRASES
        .iter()
        .map(|(phrase, replacement)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase));
            (Regex::new(&pattern).unwrap(), *phrase, *replacement)
        })
        .collect();
}

pub fn implementations() -> Vec<CheckerRef> {
    vec![
        Arc::new(ReadabilityMetricsCheck),
        Arc::new(PassiveVoiceCheck),
        Arc::new(PlainLanguageCheck),
    ]
}

/// Running prose: body paragraphs that aren't list items
fn prose(document: &DocumentModel) -> Vec<(usize, String)> {
    body_paragraphs(document)
        .filter_map(|(index, paragraph)| {
            let text = paragraph.full_text();
            let keep = !text.trim().is_empty() && !paragraph.is_list_style() && !is_list_item(&text);
            keep.then_some((index, text))
        })
        .collect()
}

pub struct ReadabilityMetricsCheck;

impl Checker for ReadabilityMetricsCheck {
    fn name(&self) -> &str {
        "check_readability_metrics"
    }

    fn category(&self) -> Category {
        Category::Readability
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let rules = &terminology.readability;
        let (mut words, mut sentences, mut syllables, mut complex) = (0, 0, 0, 0);

        for (_, text) in prose(document) {
            sentences += split_sentences(&text).len();
            for word in alpha_words(&text) {
                words += 1;
                syllables += count_syllables(word);
                if is_complex_word(word) {
                    complex += 1;
                }
            }
        }

        if words < MIN_WORDS_FOR_METRICS {
            debug!(words, "too little text for readability metrics");
            return Ok(Vec::new());
        }
        let Some(metrics) = calculate_readability_metrics(words, sentences, syllables, complex) else {
            return Ok(Vec::new());
        };

        let mut findings = Vec::new();
        if metrics.flesch_reading_ease < rules.min_flesch_reading_ease {
            findings.push(
                Finding::info(
                    Category::Readability,
                    format!(
                        "Flesch Reading Ease score is {} (target {} or higher). The text may be hard to read.",
                        metrics.flesch_reading_ease, rules.min_flesch_reading_ease
                    ),
                )
                .with_suggestion("Use shorter sentences and simpler words."),
            );
        }
        if metrics.flesch_kincaid_grade > rules.max_flesch_kincaid_grade {
            findings.push(
                Finding::info(
                    Category::Readability,
                    format!(
                        "Flesch-Kincaid grade level is {} (target {} or lower).",
                        metrics.flesch_kincaid_grade, rules.max_flesch_kincaid_grade
                    ),
                )
                .with_suggestion("Shorten long sentences and replace multi-syllable words."),
            );
        }
        if metrics.gunning_fog_index > rules.max_gunning_fog {
            findings.push(
                Finding::info(
                    Category::Readability,
                    format!(
                        "Gunning Fog index is {} (target {} or lower).",
                        metrics.gunning_fog_index, rules.max_gunning_fog
                    ),
                )
                .with_suggestion("Reduce the number of complex words of three or more syllables."),
            );
        }
        Ok(findings)
    }
}

pub struct PassiveVoiceCheck;

impl Checker for PassiveVoiceCheck {
    fn name(&self) -> &str {
        "check_passive_voice"
    }

    fn category(&self) -> Category {
        Category::Readability
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let max = terminology.readability.max_passive_voice_percent;
        let mut total = 0usize;
        let mut passive: Vec<(usize, String)> = Vec::new();

        for (index, text) in prose(document) {
            for sentence in split_sentences(&text) {
                total += 1;
                if is_passive_sentence(&sentence) {
                    passive.push((index, sentence));
                }
            }
        }
        if total == 0 {
            return Ok(Vec::new());
        }

        let percent = round1(passive.len() as f64 / total as f64 * 100.0);
        if percent <= max {
            return Ok(Vec::new());
        }
        let Some((index, example)) = passive.first() else {
            return Ok(Vec::new());
        };

        Ok(vec![Finding::info(
            Category::Readability,
            format!(
                "{percent}% of sentences use passive voice ({} of {total}). Keep passive voice at or below {max}%.",
                passive.len()
            ),
        )
        .with_suggestion(format!(
            "Rewrite in active voice, starting with: '{}'",
            preview(example, 60)
        ))
        .at_paragraph(*index)])
    }
}

pub struct PlainLanguageCheck;

impl Checker for PlainLanguageCheck {
    fn name(&self) -> &str {
        "check_plain_language"
    }

    fn category(&self) -> Category {
        Category::Readability
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (index, paragraph) in body_paragraphs(document) {
            let text = paragraph.full_text();
            for (regex, phrase, replacement) in WORDY_PATTERNS.iter() {
                if let Some(found) = regex.find(&text) {
                    findings.push(
                        Finding::info(
                            Category::Readability,
                            format!("Replace '{}' with '{replacement}'.", found.as_str()),
                        )
                        .with_suggestion(format!("Use '{replacement}' instead of '{phrase}'."))
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
    use crate::checks::test_support::run_text;
    use crate::types::Severity;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dense_text_crosses_every_threshold() {
        let dense = "Organizational implementation considerations necessitate comprehensive documentation regarding certification requirements. "
            .repeat(12);
        let findings = run_text(&ReadabilityMetricsCheck, &[dense.as_str()], "Order");
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.severity == Severity::Info));
        assert!(findings[0].message.starts_with("Flesch Reading Ease score is"));
    }

    #[test]
    fn test_plain_text_and_short_text_are_quiet() {
        let plain = "The cat sat on the mat. ".repeat(20);
        assert!(run_text(&ReadabilityMetricsCheck, &[plain.as_str()], "Order").is_empty());

        let short = "Organizational implementation considerations necessitate documentation.";
        assert!(run_text(&ReadabilityMetricsCheck, &[short], "Order").is_empty());
    }

    #[test]
    fn test_passive_voice_share() {
        let lines = [
            "The report was reviewed by the board. The applicant submits data.",
            "The office issues the memo. The limits were exceeded by the crew. Pilots fly the route.",
        ];
        let findings = run_text(&PassiveVoiceCheck, &lines, "Order");
        assert_eq!(findings.len(), 1);
        assert!(findings[0]
            .message
            .starts_with("40% of sentences use passive voice (2 of 5)."));
        assert_eq!(findings[0].location.and_then(|l| l.paragraph), Some(0));

        let active = ["The board reviewed the report. The crew exceeded the limits."];
        assert!(run_text(&PassiveVoiceCheck, &active, "Order").is_empty());
    }

    #[test]
    fn test_wordy_phrases() {
        let findings = run_text(
            &PlainLanguageCheck,
            &["In order to comply, submit the form prior to the deadline."],
            "Order",
        );
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Replace 'In order to' with 'to'.", "Replace 'prior to' with 'before'."]
        );
    }
}
