// Section 508 accessibility checks: image alt text, heading hierarchy,
// link text and color contrast.

use super::{Checker, CheckerRef};
use crate::config::{ResolvedDocType, TerminologyData};
use crate::text_utils::{collapse_whitespace, preview};
use crate::types::{Category, DocumentModel, Finding, ImageInfo};
use anyhow::Result;
use std::sync::Arc;

/// Background assumed when a run has no highlight
const DEFAULT_BACKGROUND: (u8, u8, u8) = (0xFF, 0xFF, 0xFF);

pub fn implementations() -> Vec<CheckerRef> {
    vec![
        Arc::new(ImageAltTextCheck),
        Arc::new(HeadingStructureCheck),
        Arc::new(LinkTextCheck),
        Arc::new(ColorContrastCheck),
    ]
}

/// Watermarks, decorative graphics and table snapshots don't need alt text
fn is_decorative(image: &ImageInfo) -> bool {
    let name = image.name.to_lowercase();
    image.decorative || ["watermark", "graphic", "table"].iter().any(|w| name.contains(w))
}

pub struct ImageAltTextCheck;

impl Checker for ImageAltTextCheck {
    fn name(&self) -> &str {
        "check_image_alt_text"
    }

    fn category(&self) -> Category {
        Category::Accessibility
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        _terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            for image in &paragraph.images {
                if is_decorative(image) {
                    continue;
                }
                let has_alt = image.alt_text.as_deref().is_some_and(|alt| !alt.trim().is_empty());
                if !has_alt {
                    findings.push(
                        Finding::error(
                            Category::Accessibility,
                            format!("Image '{}' is missing alternative text.", image.name),
                        )
                        .with_suggestion("Add alt text that describes the content of the image.")
                        .at_paragraph(index),
                    );
                }
            }
        }
        Ok(findings)
    }
}

pub struct HeadingStructureCheck;

impl Checker for HeadingStructureCheck {
    fn name(&self) -> &str {
        "check_heading_structure"
    }

    fn category(&self) -> Category {
        Category::Accessibility
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let max_depth = terminology.accessibility.max_heading_depth;
        let headings = document.headings();
        let mut findings = Vec::new();

        let Some((first_index, first_level, first_text)) = headings.first() else {
            return Ok(findings);
        };
        if *first_level > 1 {
            findings.push(
                Finding::error(
                    Category::Accessibility,
                    format!(
                        "Document starts with a Heading {first_level} ('{}'). The first heading should be Heading 1.",
                        preview(first_text, 40)
                    ),
                )
                .with_suggestion("Start the document outline with a Heading 1.")
                .at_paragraph(*first_index),
            );
        }

        let mut previous = *first_level;
        for (index, level, text) in &headings {
            if *level > previous + 1 {
                findings.push(
                    Finding::error(
                        Category::Accessibility,
                        format!(
                            "Heading level skipped from H{previous} to H{level} at '{}'.",
                            preview(text, 40)
                        ),
                    )
                    .with_suggestion(format!("Use Heading {} here or add the missing level.", previous + 1))
                    .at_paragraph(*index),
                );
            }
            if *level > max_depth {
                findings.push(
                    Finding::error(
                        Category::Accessibility,
                        format!(
                            "Heading '{}' is nested {level} levels deep. Screen readers handle at most {max_depth} levels.",
                            preview(text, 40)
                        ),
                    )
                    .at_paragraph(*index),
                );
            }
            previous = *level;
        }
        Ok(findings)
    }
}

/// Comparable form of a URL: no scheme, no "www.", no trailing slash
fn normalize_url(url: &str) -> String {
    let lower = url.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme)
        .trim_end_matches('/')
        .to_string()
}

fn looks_like_url(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.")
}

pub struct LinkTextCheck;

impl Checker for LinkTextCheck {
    fn name(&self) -> &str {
        "check_link_text"
    }

    fn category(&self) -> Category {
        Category::Accessibility
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let generic = &terminology.accessibility.generic_link_text;
        let mut findings = Vec::new();

        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            for link in &paragraph.hyperlinks {
                let text = collapse_whitespace(&link.text);
                let key = text
                    .trim_end_matches(|c: char| c.is_ascii_punctuation())
                    .to_lowercase();

                if generic.iter().any(|g| g.to_lowercase() == key) {
                    findings.push(
                        Finding::warning(
                            Category::Accessibility,
                            format!("Link text '{text}' does not describe the destination."),
                        )
                        .with_suggestion("Use link text that names the linked page or document.")
                        .at_paragraph(index),
                    );
                } else if looks_like_url(&text) || normalize_url(&text) == normalize_url(&link.url) {
                    findings.push(
                        Finding::warning(
                            Category::Accessibility,
                            format!("Link text '{text}' is a bare URL."),
                        )
                        .with_suggestion("Replace the URL with a description of the destination.")
                        .at_paragraph(index),
                    );
                }
            }
        }
        Ok(findings)
    }
}

/// Named highlight colors Word writes instead of hex values
fn named_color(name: &str) -> Option<(u8, u8, u8)> {
    let rgb = match name.to_lowercase().as_str() {
        "black" => (0x00, 0x00, 0x00),
        "white" => (0xFF, 0xFF, 0xFF),
        "yellow" => (0xFF, 0xFF, 0x00),
        "green" => (0x00, 0xFF, 0x00),
        "cyan" => (0x00, 0xFF, 0xFF),
        "magenta" => (0xFF, 0x00, 0xFF),
        "blue" => (0x00, 0x00, 0xFF),
        "red" => (0xFF, 0x00, 0x00),
        "darkblue" => (0x00, 0x00, 0x80),
        "darkcyan" => (0x00, 0x80, 0x80),
        "darkgreen" => (0x00, 0x80, 0x00),
        "darkmagenta" => (0x80, 0x00, 0x80),
        "darkred" => (0x80, 0x00, 0x00),
        "darkyellow" => (0x80, 0x80, 0x00),
        "darkgray" => (0x80, 0x80, 0x80),
        "lightgray" => (0xC0, 0xC0, 0xC0),
        _ => return None,
    };
    Some(rgb)
}

/// "1F1F1F", "#1f1f1f" or a named color. "auto" and "none" yield `None`.
pub(crate) fn parse_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some((channel(0)?, channel(2)?, channel(4)?));
    }
    named_color(hex)
}

fn relative_luminance((r, g, b): (u8, u8, u8)) -> f64 {
    let linear = |channel: u8| {
        let c = channel as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// WCAG 2 contrast ratio, from 1.0 to 21.0
pub(crate) fn contrast_ratio(foreground: (u8, u8, u8), background: (u8, u8, u8)) -> f64 {
    let a = relative_luminance(foreground);
    let b = relative_luminance(background);
    let (lighter, darker) = if a > b { (a, b) } else { (b, a) };
    (lighter + 0.05) / (darker + 0.05)
}

pub struct ColorContrastCheck;

impl Checker for ColorContrastCheck {
    fn name(&self) -> &str {
        "check_color_contrast"
    }

    fn category(&self) -> Category {
        Category::Accessibility
    }

    fn run(
        &self,
        document: &DocumentModel,
        _doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>> {
        let minimum = terminology.accessibility.min_contrast_ratio;
        let mut findings = Vec::new();

        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            for run in &paragraph.runs {
                if run.text.trim().is_empty() {
                    continue;
                }
                let Some(foreground) = run.color.as_deref().and_then(parse_color) else {
                    continue;
                };
                let background = run
                    .highlight
                    .as_deref()
                    .and_then(parse_color)
                    .unwrap_or(DEFAULT_BACKGROUND);
                let ratio = contrast_ratio(foreground, background);
                if ratio < minimum {
                    findings.push(
                        Finding::warning(
                            Category::Accessibility,
                            format!(
                                "Text '{}' has a contrast ratio of {:.2}:1. The minimum is {minimum}:1.",
                                preview(&run.text, 40),
                                ratio
                            ),
                        )
                        .with_suggestion("Use a darker text color or a lighter background.")
                        .at_paragraph(index),
                    );
                }
            }
        }
        Ok(findings)
    }
}
