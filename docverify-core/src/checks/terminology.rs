// Terminology checks: the configurable pattern-rule interpreter plus the
// built-in replacement, forbidden-term and consistency tables.

use super::{body_paragraphs, overlaps, Checker, CheckerRef};
use crate::config::{CompiledPatternRule, ResolvedDocType, RuleAction, TerminologyData};
use crate::types::{Category, DocumentModel, Finding};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

/// Obsolete term -> approved term
const TERM_REPLACEMENTS: &[(&str, &str)] = &[
    ("and/or", "a sentence that states each option"),
    ("although", "though"),
    ("additionally", "in addition"),
    ("cockpit", "flight deck"),
    ("flight crew", "flightcrew"),
    ("shall", "must"),
    ("cancelled", "canceled"),
    ("Regulatory and Guidance Library", "Dynamic Regulatory System"),
    ("European Aviation Safety Agency", "European Union Aviation Safety Agency"),
    ("commence", "begin"),
    ("terminate", "end"),
    ("transmit", "send"),
    ("demonstrate", "show"),
    ("facilitate", "help"),
    ("utilize", "use"),
    ("in accordance with", "under"),
    ("in compliance with", "under"),
];

/// Term -> why it should be avoided
const FORBIDDEN_TERMS: &[(&str, &str)] = &[
    ("clearly", "Avoid using 'clearly' as it's subjective."),
    ("obviously", "Avoid using 'obviously' as it's subjective."),
    ("aforementioned", "Avoid using 'aforementioned' as it can be unclear."),
    ("latter", "Avoid using 'latter'; specify the item explicitly."),
    ("former", "Avoid using 'former'; specify the item explicitly."),
    ("respectively", "Avoid using 'respectively' as it can be confusing."),
    ("above", "Avoid using 'above'; refer to the paragraph or section by number."),
    ("below", "Avoid using 'below'; refer to the paragraph or section by number."),
];

/// Preferred form -> variants that should be replaced
const TERMINOLOGY_VARIANTS: &[(&str, &[&str])] = &[
    ("website", &["web site", "web-site"]),
    ("online", &["on-line"]),
    ("email", &["e-mail"]),
    ("FAA", &["F.A.A."]),
    ("DOT", &["D.O.T.", "Dept. of Transportation"]),
    ("NASA", &["N.A.S.A."]),
    ("NPRM", &["N.P.R.M."]),
    ("TSO", &["T.S.O."]),
    ("STC", &["S.T.C."]),
];

lazy_static! {
    static ref REPLACEMENT_RULES: Vec<(Regex, &'static str)> = TERM_REPLACEMENTS
        .iter()
        .map(|(obsolete, approved)| (phrase_regex(obsolete, true), *approved))
        .collect();
    static ref FORBIDDEN_RULES: Vec<(Regex, &'static str)> = FORBIDDEN_TERMS
        .iter()
        .map(|(term, reason)| (phrase_regex(term, true), *reason))
        .collect();
    static ref VARIANT_RULES: Vec<(Regex, &'static str)> = TERMINOLOGY_VARIANTS
        .iter()
        .flat_map(|(standard, variants)| {
            variants
                .iter()
                .map(move |variant| (phrase_regex(variant, !variant.contains('.')), *standard))
        })
        .collect();
    static ref PROPOSED: Regex = Regex::new(r"(?i)\bproposed\b").unwrap();
    static ref OBSOLETE_AUTHORITY: Regex = Regex::new(r"\b49\s+U\.?S\.?C\.?\s+106\s*\(g\)").unwrap();
}

/// Whole-phrase regex; dotted abbreviations match case-sensitively and without a trailing boundary
fn phrase_regex(phrase: &str, case_insensitive: bool) -> Regex {
    let mut pattern = String::new();
    if case_insensitive {
        pattern.push_str("(?i)");
    }
    pattern.push_str(r"\b");
    pattern.push_str(&regex::escape(phrase));
    if phrase.chars().last().is_some_and(char::is_alphanumeric) {
        pattern.push_str(r"\b");
    }
    Regex::new(&pattern).unwrap()
}

/// Carry the matched text's leading capital over to the replacement
fn match_case(matched: &str, replacement: &str) -> String {
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if starts_upper && first.is_lowercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => replacement.to_string(),
    }
}

pub fn implementations() -> Vec<CheckerRef> {
    vec![
        Arc::new(PatternRuleCheck),
        Arc::new(TermReplacementCheck),
        Arc::new(ForbiddenTermCheck),
        Arc::new(TermConsistencyCheck),
        Arc::new(ProposedWordingCheck),
        Arc::new(ObsoleteCitationCheck),
    ]
}

/// Evaluate every configured pattern rule against one paragraph.
///
/// Non-error rules (allow-list and advisory) claim their spans first; an
/// error match overlapping a claimed span is suppressed.
fn apply_pattern_rules(rules: &[CompiledPatternRule], text: &str, index: usize) -> Vec<Finding> {
    let mut claimed = Vec::new();
    let mut advisories = Vec::new();
    for rule in rules.iter().filter(|r| r.action != RuleAction::Flag) {
        for m in rule.regex.find_iter(text) {
            claimed.push((m.start(), m.end()));
            if rule.action == RuleAction::Advise {
                advisories.push((m.start(), rule, m.as_str()));
            }
        }
    }

    let mut hits = Vec::new();
    for rule in rules.iter().filter(|r| r.action == RuleAction::Flag) {
        for m in rule.regex.find_iter(text) {
            if !overlaps(&claimed, m.start(), m.end()) {
                hits.push((m.start(), rule, m.as_str()));
            }
        }
    }
    hits.extend(advisories);
    hits.sort_by_key(|(start, _, _)| *start);

    hits.into_iter()
        .map(|(_, rule, matched)| {
            let matched = matched.trim();
            let message = format!("{} (found '{}')", rule.description.trim_end(), matched);
            let finding = match rule.action {
                RuleAction::Flag => Finding::error(Category::Terminology, message),
                _ => Finding::info(Category::Terminology, message),
            };
            let finding = match rule.strategy.resolve(matched) {
                Some(replacement) => finding.with_suggestion(match_case(matched, &replacement)),
                None => finding,
            };
            finding.at_paragraph(index)
        })
        .collect()
}

pub struct PatternRuleCheck;

impl Checker for PatternRuleCheck {
    fn name(&self) -> &str {
        "check_pattern_rules"
    }

    fn category(&self) -> Category {
        Category::Terminology
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let rules = terminology.pattern_rules();
        Ok(body_paragraphs(document)
            .flat_map(|(index, p)| apply_pattern_rules(rules, &p.full_text(), index))
            .collect())
    }
}

pub struct TermReplacementCheck;

impl Checker for TermReplacementCheck {
    fn name(&self) -> &str {
        "check_term_replacements"
    }

    fn category(&self) -> Category {
        Category::Terminology
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
            for (regex, approved) in REPLACEMENT_RULES.iter() {
                for m in regex.find_iter(&text) {
                    let approved = match_case(m.as_str(), approved);
                    findings.push(
                        Finding::warning(
                            Category::Terminology,
                            format!("Change \"{}\" to \"{approved}\"", m.as_str()),
                        )
                        .with_suggestion(approved)
                        .at_paragraph(index),
                    );
                }
            }
        }
        Ok(findings)
    }
}

pub struct ForbiddenTermCheck;

impl Checker for ForbiddenTermCheck {
    fn name(&self) -> &str {
        "check_forbidden_terms"
    }

    fn category(&self) -> Category {
        Category::Terminology
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
            for (regex, reason) in FORBIDDEN_RULES.iter() {
                if let Some(m) = regex.find(&text) {
                    findings.push(
                        Finding::warning(Category::Terminology, *reason)
                            .with_suggestion(format!("Rephrase the sentence without '{}'.", m.as_str()))
                            .at_paragraph(index),
                    );
                }
            }
        }
        Ok(findings)
    }
}

pub struct TermConsistencyCheck;

impl Checker for TermConsistencyCheck {
    fn name(&self) -> &str {
        "check_term_consistency"
    }

    fn category(&self) -> Category {
        Category::Terminology
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
            for (regex, standard) in VARIANT_RULES.iter() {
                for m in regex.find_iter(&text) {
                    findings.push(
                        Finding::info(
                            Category::Terminology,
                            format!(
                                "Found terminology issue. Use '{standard}' instead of '{}'.",
                                m.as_str()
                            ),
                        )
                        .with_suggestion(*standard)
                        .at_paragraph(index),
                    );
                }
            }
        }
        Ok(findings)
    }
}

pub struct ProposedWordingCheck;

impl Checker for ProposedWordingCheck {
    fn name(&self) -> &str {
        "check_proposed_wording"
    }

    fn category(&self) -> Category {
        Category::Terminology
    }

    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        if !doc_type.config.final_document {
            return Ok(Vec::new());
        }
        Ok(body_paragraphs(document)
            .filter(|(_, p)| PROPOSED.is_match(&p.full_text()))
            .map(|(index, _)| {
                Finding::warning(
                    Category::Terminology,
                    "Found 'proposed' wording. Remove draft phrasing for final documents.",
                )
                .with_suggestion("Describe the final action instead of the proposal.")
                .at_paragraph(index)
            })
            .collect())
    }
}

pub struct ObsoleteCitationCheck;

impl Checker for ObsoleteCitationCheck {
    fn name(&self) -> &str {
        "check_obsolete_citations"
    }

    fn category(&self) -> Category {
        Category::Terminology
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
            for m in OBSOLETE_AUTHORITY.find_iter(&text) {
                findings.push(
                    Finding::warning(
                        Category::Terminology,
                        format!("Found invalid citation. Confirm or remove {}.", m.as_str()),
                    )
                    .with_suggestion("Confirm the authority citation is still current or remove it.")
                    .at_paragraph(index),
                );
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::run_text;
    use crate::types::{Paragraph, Severity};
    use pretty_assertions::assert_eq;

    const RULES: &str = r#"{
        "acronyms": {"standard": {}},
        "patterns": {
            "citations": [
                {"pattern": "U\\.S\\.C", "description": "Citation without final period", "is_error": true, "replacement": "U.S.C."},
                {"pattern": "U\\.S\\.C\\.", "description": "Correct U.S.C. citation", "is_error": false}
            ],
            "pronouns": [
                {"pattern": "(?i)\\b(?:we|us)\\b", "description": "Avoid pronouns", "is_error": true,
                 "replacements": {"we": "the FAA", "us": "the FAA"}}
            ],
            "style": [
                {"pattern": "\\bCFR Part\\b", "description": "Prefer lowercase part", "is_error": false, "replacement": "CFR part"}
            ]
        },
        "document_types": {"Other": {}},
        "valid_words": {}
    }"#;

    fn run_rules(text: &str) -> Vec<Finding> {
        let terminology = TerminologyData::from_json_str(RULES).unwrap();
        let doc_type = terminology.get_document_type_config("Other");
        PatternRuleCheck
            .run(&DocumentModel::from_text_lines(&[text]), &doc_type, &terminology)
            .unwrap()
    }

    #[test]
    fn test_allow_rule_suppresses_overlapping_error() {
        assert!(run_rules("See 49 U.S.C. 106.").is_empty());

        let findings = run_rules("See 49 U.S.C 106.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].suggestion.as_deref(), Some("U.S.C."));
    }

    #[test]
    fn test_per_match_replacements_keep_sentence_case() {
        let findings = run_rules("We will notify us.");
        let suggestions: Vec<&str> = findings
            .iter()
            .filter_map(|f| f.suggestion.as_deref())
            .collect();
        assert_eq!(suggestions, vec!["The FAA", "the FAA"]);
        assert!(findings.iter().all(|f| f.severity == Severity::Error));
    }

    #[test]
    fn test_non_error_rule_with_replacement_is_info() {
        let findings = run_rules("Comply with 14 CFR Part 25.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[0].suggestion.as_deref(), Some("CFR part"));
    }

    #[test]
    fn test_builtin_corpus_flags_pronouns() {
        let findings = run_text(&PatternRuleCheck, &["Our office will review it."], "Order");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggestion.as_deref(), Some("The FAA's"));
    }

    #[test]
    fn test_term_replacements() {
        let findings = run_text(
            &TermReplacementCheck,
            &["Applicants shall utilize the cockpit display."],
            "Order",
        );
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Change \"cockpit\" to \"flight deck\"",
                "Change \"shall\" to \"must\"",
                "Change \"utilize\" to \"use\"",
            ]
        );
    }

    #[test]
    fn test_forbidden_terms_once_per_paragraph() {
        let findings = run_text(
            &ForbiddenTermCheck,
            &["As noted above, and above all, this is clearly required."],
            "Order",
        );
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_consistency_variants() {
        let findings = run_text(
            &TermConsistencyCheck,
            &["Visit the web site or send an e-mail to the F.A.A. office."],
            "Order",
        );
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.severity == Severity::Info));
        assert!(findings
            .iter()
            .any(|f| f.message == "Found terminology issue. Use 'FAA' instead of 'F.A.A.'."));
    }

    #[test]
    fn test_proposed_wording_only_for_final_documents() {
        let lines = ["The proposed change affects operators."];
        assert_eq!(run_text(&ProposedWordingCheck, &lines, "Advisory Circular").len(), 1);
        assert!(run_text(&ProposedWordingCheck, &lines, "NPRM").is_empty());
    }

    #[test]
    fn test_obsolete_authority_citation() {
        let findings = run_text(
            &ObsoleteCitationCheck,
            &["Authority: 49 U.S.C. 106(g), 40113, 44701."],
            "Rule",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Found invalid citation. Confirm or remove 49 U.S.C. 106(g)."
        );

        let doc = DocumentModel::from_paragraphs(vec![Paragraph::heading(2, "Authority: 49 U.S.C. 106(g)")]);
        assert!(crate::checks::test_support::run(&ObsoleteCitationCheck, &doc, "Rule").is_empty());
    }
}
