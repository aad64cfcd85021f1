// Text utilities shared by the checkers: segmentation, normalization and counting.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref HEADING_NUMBER: Regex = Regex::new(r"^\s*(?:\d+\.)+(?:\d+)?\s*").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
    static ref WORD: Regex = Regex::new(
        r"\b(?:-?\d{1,3}(?:,\d{3})*(?:\.\d+)?|[A-Za-z0-9]+(?:['-][A-Za-z0-9]+)*)\b"
    )
    .unwrap();
    static ref ALPHA_WORD: Regex = Regex::new(r"[A-Za-z]+(?:['-][A-Za-z]+)*").unwrap();
    static ref VOWEL_GROUP: Regex = Regex::new(r"[aeiouy]+").unwrap();
    static ref LIST_ITEM: Regex =
        Regex::new(r"^\s*(?:[•●▪◦‣\-\*–]|\(?\d{1,3}[.)]|\(?[a-zA-Z][.)])\s+").unwrap();
    static ref PASSIVE: Regex = Regex::new(
        r"(?i)\b(?:am|is|are|was|were|be|been|being)\s+\w+(?:ed|en|wn)\s+by\b|\b(?:has|have|had)\s+been\s+\w+(?:ed|en|wn)\b|\b(?:am|is|are|was|were|be|been|being)\s+\w{4,}(?:ed|en|wn)\b"
    )
    .unwrap();
}

/// Abbreviations that never end a sentence, even before a capital letter
const NON_TERMINAL_ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "vs.", "dr.", "mr.", "mrs.", "ms.", "prof.", "rev.", "hon.", "st.", "ave.",
    "blvd.", "rd.", "u.s.", "no.", "fig.", "para.", "sec.", "approx.",
];

const SENTENCE_CLOSERS: &[char] = &['"', '\'', ')', ']', '}', '”', '’'];

/// Collapse runs of whitespace to single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Case-fold and collapse a document-type string: "ADVISORY_CIRCULAR" -> "advisory circular"
pub fn normalize_document_type(doc_type: &str) -> String {
    collapse_whitespace(&doc_type.replace(['_', '-'], " ")).to_lowercase()
}

/// Remove outline numbering ("1.", "2.3.") from the start of a heading
pub fn strip_heading_number(text: &str) -> &str {
    match HEADING_NUMBER.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Comparison key for headings: numbering and trailing periods removed, upper-cased
pub fn heading_key(text: &str) -> String {
    let stripped = strip_heading_number(text);
    collapse_whitespace(stripped)
        .trim_end_matches(|c: char| c == '.' || c == ':' || c.is_whitespace())
        .to_uppercase()
}

/// Normalize heading text for display: collapse whitespace and repeated periods
pub fn normalize_heading(text: &str) -> String {
    let mut out = collapse_whitespace(text);
    let ended_with_period = out.ends_with('.');
    while out.ends_with('.') || out.ends_with(' ') {
        out.pop();
    }
    if ended_with_period {
        out.push('.');
    }
    out
}

fn ends_with_abbreviation(segment: &str, candidates: &[&str]) -> bool {
    let lowered = segment.to_lowercase();
    candidates.iter().any(|abbr| {
        lowered.ends_with(abbr)
            && lowered[..lowered.len() - abbr.len()]
                .chars()
                .last()
                .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Split text into sentences, keeping abbreviations ("e.g.", "U.S.") and
/// decimal numbers ("25.1309") inside their sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '.' && c != '!' && c != '?' {
            i += 1;
            continue;
        }

        // Inner dot of "U.S." style sequences
        if c == '.'
            && i >= 1
            && i + 2 < chars.len()
            && chars[i - 1].is_uppercase()
            && chars[i + 1].is_uppercase()
            && chars[i + 2] == '.'
        {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && (chars[j].is_whitespace() || SENTENCE_CLOSERS.contains(&chars[j]))
        {
            j += 1;
        }
        let gap: String = chars[i + 1..j].iter().collect();
        let at_end = j >= chars.len();
        let separated = gap.chars().any(char::is_whitespace);
        let next_starts_sentence = !at_end && (chars[j].is_uppercase() || chars[j].is_numeric());

        let is_boundary = at_end || gap.contains('\n') || (separated && next_starts_sentence);
        if !is_boundary {
            i += 1;
            continue;
        }

        let segment: String = chars[start..=i].iter().collect();
        if c == '.'
            && !at_end
            && !gap.contains('\n')
            && ends_with_abbreviation(&segment, NON_TERMINAL_ABBREVIATIONS)
        {
            i += 1;
            continue;
        }

        let sentence: String = chars[start..j].iter().collect();
        let sentence = sentence.trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = j;
        i = j;
    }

    if start < chars.len() {
        let rest: String = chars[start..].iter().collect();
        let rest = rest.trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }
    }

    sentences
}

/// Count words, treating e-mail addresses, hyphenated words and formatted numbers as one word each
pub fn count_words(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    let email_count = EMAIL.find_iter(text).count();
    let without_emails = EMAIL.replace_all(text, " ").replace('_', " ");
    let word_count = WORD
        .find_iter(&without_emails)
        .filter(|m| m.as_str().chars().any(|c| c.is_ascii_alphanumeric()))
        .count();
    email_count + word_count
}

/// Alphabetic words, used for syllable statistics
pub fn alpha_words(text: &str) -> Vec<&str> {
    ALPHA_WORD.find_iter(text).map(|m| m.as_str()).collect()
}

/// Syllable estimate using vowel groups with the usual English suffix corrections
pub fn count_syllables(word: &str) -> usize {
    let word = word.trim();
    if word.is_empty() {
        return 0;
    }
    if word.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return word.chars().filter(|c| c.is_ascii_digit()).count();
    }
    if word.chars().count() <= 3 && word.chars().all(|c| c.is_ascii_uppercase()) {
        // Spelled out letter by letter
        return word.chars().count();
    }

    let cleaned: String = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    let mut count = VOWEL_GROUP.find_iter(&cleaned).count();
    if cleaned.ends_with('e')
        && !(cleaned.ends_with("le") || cleaned.ends_with("ie") || cleaned.ends_with("io"))
        && count > 1
    {
        count -= 1;
    }
    if (cleaned.ends_with("es") || cleaned.ends_with("ed"))
        && !(cleaned.ends_with("les") || cleaned.ends_with("ied"))
        && count > 1
    {
        count -= 1;
    }
    if cleaned.ends_with("io") {
        count += 1;
    }
    if cleaned.ends_with("less") && count > 1 {
        count -= 1;
    }
    count.max(1)
}

pub fn is_complex_word(word: &str) -> bool {
    count_syllables(word) >= 3
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadabilityMetrics {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    pub gunning_fog_index: f64,
}

/// Flesch Reading Ease, Flesch-Kincaid grade and Gunning Fog.
/// Returns `None` when there are no words or sentences to measure.
pub fn calculate_readability_metrics(
    word_count: usize,
    sentence_count: usize,
    syllable_count: usize,
    complex_word_count: usize,
) -> Option<ReadabilityMetrics> {
    if word_count == 0 || sentence_count == 0 {
        return None;
    }
    let words_per_sentence = word_count as f64 / sentence_count as f64;
    let syllables_per_word = syllable_count as f64 / word_count as f64;
    let complex_ratio = complex_word_count as f64 / word_count as f64;

    Some(ReadabilityMetrics {
        flesch_reading_ease: round1(206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word),
        flesch_kincaid_grade: round1(0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59),
        gunning_fog_index: round1(0.4 * (words_per_sentence + 100.0 * complex_ratio)),
    })
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn is_passive_sentence(sentence: &str) -> bool {
    PASSIVE.is_match(sentence)
}

/// Bulleted or enumerated list item ("• text", "1. text", "(a) text")
pub fn is_list_item(text: &str) -> bool {
    LIST_ITEM.is_match(text)
}

/// Rendered line estimate: each hard line wraps at `chars_per_line`
pub fn estimate_lines(text: &str, chars_per_line: usize) -> usize {
    let width = chars_per_line.max(1);
    text.lines()
        .map(|line| {
            let len = line.chars().count();
            if len == 0 {
                1
            } else {
                len.div_ceil(width)
            }
        })
        .sum::<usize>()
        .max(1)
}

/// Short preview of a paragraph for messages
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", truncated.trim_end())
}
