// Format checks: dates, placeholders, phone numbers, spacing, section symbols,
// parentheses, punctuation and list markers.

use super::{at_match, overlaps, Checker, CheckerRef};
use crate::config::{ResolvedDocType, TerminologyData};
use crate::text_utils::preview;
use crate::types::{Category, DocumentModel, Finding, Paragraph};
use anyhow::Result;
use chrono::NaiveDate;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

lazy_static! {
    // Dates
    static ref SLASH_DATE: Regex = Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
    static ref DATE_EXEMPTIONS: Vec<Regex> = vec![
        Regex::new(r"\b(?:AD|SFAR|AC|Order|Notice|Policy|Memo|TSO)\s*\d{2,4}[-/]\d{1,2}[-/]\d{1,2}\b").unwrap(),
        Regex::new(r"\bTSO[-\s]*[A-Z]?\d[\w./-]*").unwrap(),
        Regex::new(r"(?i)\bDocket\s+(?:No\.?|Number)\s*[\w./-]+").unwrap(),
    ];
    static ref HEADER_LINE: Regex = Regex::new(
        r"(?i)^\s*(?:date\s*:|ac\s+no\.?\s*:|order\s+no\.?\s*:|initiated\s+by\s*:|subject\s*:|u\.s\.\s+department\s+of\s+transportation|federal\s+aviation\s+administration\s*$|advisory\s+circular\s*$)"
    ).unwrap();

    // Placeholders
    static ref PLACEHOLDER: Regex =
        Regex::new(r"(?i)\bTBD\b|\bto be determined\b|\bXXX+\b|\b(?:TODO|FIXME)\s*:").unwrap();
    static ref BRACKETED: Regex = Regex::new(r"\[[^\[\]]*\]|\{[^{}]*\}").unwrap();

    // Phone numbers
    static ref PHONE: Regex = Regex::new(
        r"\(\d{3}\)\s*\d{3}[-.]\d{4}\b|\b\d{3}-\d{3}-\d{4}\b|\b\d{3}\.\d{3}\.\d{4}\b|\b\d{10}\b"
    ).unwrap();

    // Spacing
    static ref DOUBLE_SPACE: Regex = Regex::new(r"\S( {2,})\S").unwrap();
    static ref MISSING_REFERENCE_SPACE: Regex =
        Regex::new(r"(AC|AD|CFR|FAA|N|SFAR|Part)(\d+(?:-\d+)?[A-Z]?)").unwrap();

    // Section symbols
    static ref SECTION_NO_SPACE: Regex = Regex::new(r"§([^\s§])").unwrap();
    static ref SECTION_RANGE: Regex =
        Regex::new(r"(?:^|[^§])(§\s*\d+(?:\.\d+)*\s*(?:-|–|through|and|or)\s*\d+(?:\.\d+)*)").unwrap();
    static ref SECTION_SENTENCE_START: Regex = Regex::new(r"(?:^|[.!?]\s+)§").unwrap();

    // Punctuation
    static ref DOUBLE_PERIOD: Regex = Regex::new(r"(?:^|[^.])\.\.(?:[^.]|$)").unwrap();
    static ref SPACE_BEFORE_PUNCT: Regex = Regex::new(r"\w( +)([,.;:])(?:\s|$)").unwrap();

    // Lists
    static ref BULLET: Regex = Regex::new(r"^\s*([•●▪◦‣■□➢])(\s?)").unwrap();
    static ref ENUMERATOR_CLOSE: Regex = Regex::new(r"^\s*[A-Za-z0-9]{1,3}\)\s").unwrap();
}

pub fn implementations() -> Vec<CheckerRef> {
    vec![
        Arc::new(DateFormatCheck),
        Arc::new(PlaceholderCheck),
        Arc::new(PhoneNumberCheck),
        Arc::new(SpacingCheck),
        Arc::new(SectionSymbolCheck),
        Arc::new(ParenthesesCheck),
        Arc::new(PunctuationCheck),
        Arc::new(ListFormattingCheck),
    ]
}

// ===== DATES =====

/// Indices of paragraphs forming the document header block: header-styled
/// paragraphs anywhere, plus header-like lines before the first heading.
fn header_block(document: &DocumentModel) -> Vec<usize> {
    let mut header = Vec::new();
    let mut before_first_heading = true;
    for (index, paragraph) in document.paragraphs.iter().enumerate() {
        if paragraph.is_heading() {
            before_first_heading = false;
        }
        let styled_header = paragraph.style.to_lowercase().contains("header");
        if styled_header || (before_first_heading && HEADER_LINE.is_match(&paragraph.full_text())) {
            header.push(index);
        }
    }
    header
}

fn expand_year(year: i32, digits: usize) -> i32 {
    match digits {
        2 if year < 50 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    }
}

/// "Month D, YYYY" rendering of a numeric date, if it is a real calendar date
fn long_form(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%B %-d, %Y").to_string())
}

pub struct DateFormatCheck;

impl Checker for DateFormatCheck {
    fn name(&self) -> &str {
        "check_date_formats"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let header = header_block(document);
        let mut findings = Vec::new();

        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            if paragraph.is_heading() || header.contains(&index) {
                continue;
            }
            let text = paragraph.full_text();
            let exempt: Vec<(usize, usize)> = DATE_EXEMPTIONS
                .iter()
                .flat_map(|re| re.find_iter(&text).map(|m| (m.start(), m.end())))
                .collect();

            let mut dates = Vec::new();
            for caps in SLASH_DATE.captures_iter(&text) {
                let whole = &caps[0];
                let month = caps[1].parse::<u32>().unwrap_or(0);
                let day = caps[2].parse::<u32>().unwrap_or(0);
                let year = expand_year(caps[3].parse::<i32>().unwrap_or(0), caps[3].len());
                if let Some(m) = caps.get(0) {
                    dates.push((m.start(), m.end(), whole.to_string(), long_form(year, month, day)));
                }
            }
            for caps in ISO_DATE.captures_iter(&text) {
                let year = caps[1].parse::<i32>().unwrap_or(0);
                let month = caps[2].parse::<u32>().unwrap_or(0);
                let day = caps[3].parse::<u32>().unwrap_or(0);
                if let Some(m) = caps.get(0) {
                    dates.push((m.start(), m.end(), caps[0].to_string(), long_form(year, month, day)));
                }
            }
            dates.sort_by_key(|(start, ..)| *start);

            for (start, end, found, suggestion) in dates {
                if overlaps(&exempt, start, end) {
                    continue;
                }
                let finding = Finding::error(
                    Category::Format,
                    "Found incorrect date format. Use Month Day, Year format (e.g., May 11, 2025).",
                )
                .with_suggestion(
                    suggestion.unwrap_or_else(|| format!("Rewrite '{found}' as Month Day, Year")),
                );
                findings.push(at_match(finding, index, &text, start));
            }
        }
        Ok(findings)
    }
}

// ===== PLACEHOLDERS =====

pub struct PlaceholderCheck;

/// Bracketed text that is a footnote marker or citation, not a placeholder
fn is_reference_bracket(inner: &str) -> bool {
    let inner = inner.trim();
    inner.is_empty()
        || inner.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '-' || c == ' ')
        || inner.eq_ignore_ascii_case("sic")
}

impl Checker for PlaceholderCheck {
    fn name(&self) -> &str {
        "check_placeholders"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            let text = paragraph.full_text();
            let mut found: Vec<(usize, String)> = PLACEHOLDER
                .find_iter(&text)
                .map(|m| (m.start(), m.as_str().to_string()))
                .collect();
            found.extend(
                BRACKETED
                    .find_iter(&text)
                    .filter(|m| {
                        let s = m.as_str();
                        !is_reference_bracket(&s[1..s.len() - 1])
                    })
                    .map(|m| (m.start(), m.as_str().to_string())),
            );
            found.sort_by_key(|(start, _)| *start);

            for (start, placeholder) in found {
                let finding = Finding::error(
                    Category::Format,
                    format!("Found placeholder text '{placeholder}'. Replace it with final content."),
                )
                .with_suggestion("Replace the placeholder with the final text.");
                findings.push(at_match(finding, index, &text, start));
            }
        }
        Ok(findings)
    }
}

// ===== PHONE NUMBERS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PhoneStyle {
    Parenthesized,
    Dashed,
    Dotted,
    Plain,
}

impl PhoneStyle {
    fn classify(number: &str) -> Self {
        if number.starts_with('(') {
            PhoneStyle::Parenthesized
        } else if number.contains('-') {
            PhoneStyle::Dashed
        } else if number.contains('.') {
            PhoneStyle::Dotted
        } else {
            PhoneStyle::Plain
        }
    }

    fn render(&self, digits: &str) -> String {
        let (area, exchange, line) = (&digits[..3], &digits[3..6], &digits[6..]);
        match self {
            PhoneStyle::Parenthesized => format!("({area}) {exchange}-{line}"),
            PhoneStyle::Dashed => format!("{area}-{exchange}-{line}"),
            PhoneStyle::Dotted => format!("{area}.{exchange}.{line}"),
            PhoneStyle::Plain => digits.to_string(),
        }
    }
}

pub struct PhoneNumberCheck;

impl Checker for PhoneNumberCheck {
    fn name(&self) -> &str {
        "check_phone_numbers"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut numbers = Vec::new();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            for m in PHONE.find_iter(&paragraph.full_text()) {
                numbers.push((index, m.as_str().to_string(), PhoneStyle::classify(m.as_str())));
            }
        }

        // Most common style wins; ties go to the style seen first
        let mut counts: IndexMap<PhoneStyle, usize> = IndexMap::new();
        for (_, _, style) in &numbers {
            *counts.entry(*style).or_default() += 1;
        }
        if counts.len() < 2 {
            return Ok(Vec::new());
        }
        let mut dominant = PhoneStyle::Parenthesized;
        let mut best = 0;
        for (style, count) in &counts {
            if *count > best {
                dominant = *style;
                best = *count;
            }
        }

        let findings = numbers
            .into_iter()
            .filter(|(_, _, style)| *style != dominant)
            .map(|(index, number, _)| {
                let digits: String = number.chars().filter(char::is_ascii_digit).collect();
                Finding::warning(
                    Category::Format,
                    format!("Phone number '{number}' uses an inconsistent format. Use one format throughout the document."),
                )
                .with_suggestion(dominant.render(&digits))
                .at_paragraph(index)
            })
            .collect();
        Ok(findings)
    }
}

// ===== SPACING =====

/// A reference prefix glued to its number counts when it starts the text or
/// follows punctuation; after whitespace or inside a word it is left alone.
fn prefix_boundary_ok(text: &str, start: usize) -> bool {
    match text[..start].chars().last() {
        None => true,
        Some(c) => !c.is_whitespace() && !c.is_alphanumeric(),
    }
}

pub struct SpacingCheck;

impl Checker for SpacingCheck {
    fn name(&self) -> &str {
        "check_spacing"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            let text = paragraph.full_text();
            let mut hits: Vec<(usize, Finding)> = Vec::new();

            for caps in MISSING_REFERENCE_SPACE.captures_iter(&text) {
                let (Some(whole), Some(prefix), Some(number)) = (caps.get(0), caps.get(1), caps.get(2))
                else {
                    continue;
                };
                if !prefix_boundary_ok(&text, whole.start()) {
                    continue;
                }
                let (prefix, number) = (prefix.as_str(), number.as_str());
                hits.push((
                    whole.start(),
                    Finding::error(
                        Category::Format,
                        format!("Add a space between '{prefix}' and '{number}'."),
                    )
                    .with_suggestion(format!("{prefix} {number}")),
                ));
            }

            if let Some(first) = DOUBLE_SPACE.captures(&text).and_then(|c| c.get(1)) {
                let corrected = DOUBLE_SPACE_RUN.replace_all(text.trim(), " ").into_owned();
                hits.push((
                    first.start(),
                    Finding::error(Category::Format, "Found spacing issues. Remove extra spaces.")
                        .with_suggestion(corrected),
                ));
            }

            hits.sort_by_key(|(start, _)| *start);
            findings.extend(hits.into_iter().map(|(_, f)| f.at_paragraph(index)));
        }
        Ok(findings)
    }
}

lazy_static! {
    static ref DOUBLE_SPACE_RUN: Regex = Regex::new(r" {2,}").unwrap();
}

// ===== SECTION SYMBOLS =====

pub struct SectionSymbolCheck;

impl Checker for SectionSymbolCheck {
    fn name(&self) -> &str {
        "check_section_symbols"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            let text = paragraph.full_text();
            if !text.contains('§') {
                continue;
            }

            if SECTION_SENTENCE_START.is_match(&text) {
                findings.push(
                    Finding::warning(
                        Category::Format,
                        "Don't begin a sentence with '§'. Spell out 'Section' instead.",
                    )
                    .with_suggestion("Section")
                    .at_paragraph(index),
                );
            }
            for caps in SECTION_NO_SPACE.captures_iter(&text) {
                findings.push(
                    Finding::warning(Category::Format, "Add a space after '§'.")
                        .with_suggestion(format!("§ {}", &caps[1]))
                        .at_paragraph(index),
                );
            }
            for caps in SECTION_RANGE.captures_iter(&text) {
                let range = &caps[1];
                let corrected = format!("§§ {}", range.trim_start_matches('§').trim_start());
                findings.push(
                    Finding::warning(
                        Category::Format,
                        format!("Use '§§' when citing more than one section: '{range}'."),
                    )
                    .with_suggestion(corrected)
                    .at_paragraph(index),
                );
            }
        }
        Ok(findings)
    }
}

// ===== PARENTHESES =====

/// Count of unmatched opening and closing parentheses
fn unmatched_parentheses(text: &str) -> (usize, usize) {
    let mut open = 0usize;
    let mut unmatched_close = 0usize;
    for c in text.chars() {
        match c {
            '(' => open += 1,
            ')' if open > 0 => open -= 1,
            ')' => unmatched_close += 1,
            _ => {}
        }
    }
    (open, unmatched_close)
}

pub struct ParenthesesCheck;

impl Checker for ParenthesesCheck {
    fn name(&self) -> &str {
        "check_parentheses"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            let text = paragraph.full_text();
            // "a) item" style enumerators close without opening
            let body = match ENUMERATOR_CLOSE.find(&text) {
                Some(m) => &text[m.end()..],
                None => text.as_str(),
            };
            let (open, close) = unmatched_parentheses(body);
            if open > 0 || close > 0 {
                findings.push(
                    Finding::warning(
                        Category::Format,
                        format!(
                            "Add missing opening or closing parentheses in: '{}'",
                            preview(&text, 60)
                        ),
                    )
                    .with_suggestion(if open > 0 {
                        "Add the missing closing parenthesis."
                    } else {
                        "Add the missing opening parenthesis."
                    })
                    .at_paragraph(index),
                );
            }
        }
        Ok(findings)
    }
}

// ===== PUNCTUATION =====

pub struct PunctuationCheck;

impl Checker for PunctuationCheck {
    fn name(&self) -> &str {
        "check_punctuation"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            let text = paragraph.full_text();
            if DOUBLE_PERIOD.is_match(&text) {
                findings.push(
                    Finding::warning(Category::Format, "Found double periods. Remove the extra period.")
                        .with_suggestion(preview(&text.replace("..", "."), 80))
                        .at_paragraph(index),
                );
            }
            if let Some(caps) = SPACE_BEFORE_PUNCT.captures(&text) {
                let mark = &caps[2];
                findings.push(
                    Finding::warning(
                        Category::Format,
                        format!("Remove the space before '{mark}'."),
                    )
                    .with_suggestion(preview(&SPACE_BEFORE_PUNCT_FIX.replace_all(&text, "$1$2"), 80))
                    .at_paragraph(index),
                );
            }
        }
        Ok(findings)
    }
}

lazy_static! {
    static ref SPACE_BEFORE_PUNCT_FIX: Regex = Regex::new(r" +([,.;:])(\s|$)").unwrap();
}

// ===== LISTS =====

fn bullet_of(paragraph: &Paragraph) -> Option<(char, bool)> {
    let text = paragraph.full_text();
    let caps = BULLET.captures(&text)?;
    let bullet = caps[1].chars().next()?;
    let spaced = !caps[2].is_empty();
    Some((bullet, spaced))
}

pub struct ListFormattingCheck;

impl Checker for ListFormattingCheck {
    fn name(&self) -> &str {
        "check_list_formatting"
    }

    fn category(&self) -> Category {
        Category::Format
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let bullets: Vec<(usize, char, bool)> = document
            .paragraphs
            .iter()
            .enumerate()
            .filter_map(|(i, p)| bullet_of(p).map(|(c, spaced)| (i, c, spaced)))
            .collect();

        let mut counts: IndexMap<char, usize> = IndexMap::new();
        for (_, c, _) in &bullets {
            *counts.entry(*c).or_default() += 1;
        }
        let dominant = counts
            .iter()
            .fold(None, |best: Option<(char, usize)>, (c, n)| match best {
                Some((_, m)) if m >= *n => best,
                _ => Some((*c, *n)),
            })
            .map(|(c, _)| c);

        let mut findings = Vec::new();
        for (index, bullet, spaced) in bullets {
            if let Some(dominant) = dominant.filter(|d| *d != bullet) {
                findings.push(
                    Finding::warning(
                        Category::Format,
                        format!("Inconsistent bullet character '{bullet}'. Use '{dominant}' throughout the document."),
                    )
                    .with_suggestion(dominant.to_string())
                    .at_paragraph(index),
                );
            }
            if !spaced {
                findings.push(
                    Finding::warning(Category::Format, format!("Add a space after the bullet '{bullet}'."))
                        .with_suggestion(format!("{bullet} "))
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
    use crate::checks::test_support::{run, run_text};
    use crate::types::Severity;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slash_date_suggests_long_form() {
        let findings = run_text(&DateFormatCheck, &["The policy dated 7/25/2006."], "Order");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].suggestion.as_deref(), Some("July 25, 2006"));
    }

    #[test]
    fn test_iso_and_two_digit_years() {
        let findings =
            run_text(&DateFormatCheck, &["Issued 2024-03-05 and revised 1/2/99."], "Order");
        let suggestions: Vec<&str> =
            findings.iter().filter_map(|f| f.suggestion.as_deref()).collect();
        assert_eq!(suggestions, vec!["March 5, 2024", "January 2, 1999"]);
    }

    #[test]
    fn test_technical_identifiers_are_exempt() {
        let findings = run_text(
            &DateFormatCheck,
            &[
                "Comply with TSO-C7/25/2006 for this equipment.",
                "See AD 2006-07-25 and Docket No. FAA-2006/07/25.",
            ],
            "Order",
        );
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn test_header_block_dates_are_exempt() {
        let doc = DocumentModel::from_paragraphs(vec![
            Paragraph::new("U.S. Department of Transportation"),
            Paragraph::new("Date: 7/25/2006"),
            Paragraph::heading(1, "PURPOSE."),
            Paragraph::new("Date: 7/25/2006"),
        ]);
        let findings = run(&DateFormatCheck, &doc, "Advisory Circular");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.and_then(|l| l.paragraph), Some(3));
    }

    #[test]
    fn test_placeholders() {
        let findings = run_text(
            &PlaceholderCheck,
            &["The effective date is TBD [insert date] per note [1]. TODO: confirm."],
            "Order",
        );
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Found placeholder text 'TBD'. Replace it with final content.",
                "Found placeholder text '[insert date]'. Replace it with final content.",
                "Found placeholder text 'TODO:'. Replace it with final content.",
            ]
        );
    }

    #[test]
    fn test_dates_in_headings_are_not_checked() {
        let doc = DocumentModel::from_paragraphs(vec![
            Paragraph::heading(1, "PURPOSE."),
            Paragraph::heading(2, "Changes Effective 7/25/2006"),
            Paragraph::new("Effective 7/25/2006."),
        ]);
        let findings = run(&DateFormatCheck, &doc, "Order");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.and_then(|l| l.paragraph), Some(2));
    }

    #[test]
    fn test_soft_line_breaks_set_the_line() {
        let findings = run_text(
            &PlaceholderCheck,
            &["Point of contact: Jane Doe\nPhone: TBD"],
            "Order",
        );
        assert_eq!(findings.len(), 1);
        let location = findings[0].location.unwrap();
        assert_eq!(location.paragraph, Some(0));
        assert_eq!(location.line, Some(2));

        let findings = run_text(&DateFormatCheck, &["Effective 7/25/2006."], "Order");
        assert_eq!(findings[0].location.and_then(|l| l.line), None);
    }

    #[test]
    fn test_phone_numbers_follow_dominant_style() {
        let findings = run_text(
            &PhoneNumberCheck,
            &["Call (202) 267-1000 or (202) 267-3484.", "After hours, call 202.267.9999."],
            "Order",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggestion.as_deref(), Some("(202) 267-9999"));
    }

    #[test]
    fn test_spacing_scenario() {
        let findings = run_text(&SpacingCheck, &["AC25.25 states that  SFAR88"], "Order");
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == Severity::Error && f.category == Category::Format));
        assert_eq!(findings[0].message, "Add a space between 'AC' and '25'.");
        assert_eq!(findings[0].suggestion.as_deref(), Some("AC 25"));
        assert_eq!(findings[1].message, "Found spacing issues. Remove extra spaces.");
        assert_eq!(findings[1].suggestion.as_deref(), Some("AC25.25 states that SFAR88"));
    }

    #[test]
    fn test_missing_space_after_punctuation_prefix() {
        let findings = run_text(&SpacingCheck, &["Guidance (AC20-115D) applies."], "Order");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggestion.as_deref(), Some("AC 20-115D"));
    }

    #[test]
    fn test_section_symbols() {
        let findings = run_text(
            &SectionSymbolCheck,
            &["§ 25.1309 applies.", "See §25.1309 and § 25.1301 through 25.1317."],
            "Order",
        );
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Don't begin a sentence with '§'. Spell out 'Section' instead.",
                "Add a space after '§'.",
                "Use '§§' when citing more than one section: '§ 25.1301 through 25.1317'.",
            ]
        );
    }

    #[test]
    fn test_parentheses_balance_ignores_enumerators() {
        let findings = run_text(
            &ParenthesesCheck,
            &["a) The first item (see note.", "b) The second item (complete)."],
            "Order",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.and_then(|l| l.paragraph), Some(0));
    }

    #[test]
    fn test_punctuation() {
        let findings = run_text(
            &PunctuationCheck,
            &["The end.. And more...", "Wait , what ."],
            "Order",
        );
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].message, "Found double periods. Remove the extra period.");
        assert_eq!(findings[1].message, "Remove the space before ','.");
    }

    #[test]
    fn test_list_bullets() {
        let findings = run_text(
            &ListFormattingCheck,
            &["• First item", "• Second item", "▪Third item"],
            "Order",
        );
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.starts_with("Inconsistent bullet character '▪'"));
        assert_eq!(findings[1].message, "Add a space after the bullet '▪'.");
    }
}
