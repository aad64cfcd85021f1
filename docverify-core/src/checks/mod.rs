// Check engine - the Checker capability plus one module per rule family.
// - registry.rs: CheckRegistry, discovery and drift validation
// - heading.rs, acronym.rs, terminology.rs: rulebook wording checks
// - format.rs, reference.rs: formatting, captions and cross-references
// - structure.rs, readability.rs: length, balance and plain-language metrics
// - accessibility.rs: Section 508 checks
// - document_status.rs: watermark and document-type markers

pub mod accessibility;
pub mod acronym;
pub mod document_status;
pub mod format;
pub mod heading;
pub mod readability;
pub mod reference;
pub mod registry;
pub mod structure;
pub mod terminology;

pub use registry::{
    default_registry, discover, CheckModule, CheckRegistry, ValidationReport, CHECK_MODULES,
};

use crate::config::{ResolvedDocType, TerminologyData};
use crate::types::{Category, DocumentModel, Finding, Paragraph};
use anyhow::Result;
use std::sync::Arc;

/// One rule family run against a parsed document.
///
/// Implementations read the document, the resolved document-type config and
/// the terminology corpus, and return findings. Malformed-but-parseable
/// content becomes findings; `Err` is reserved for conditions the checker
/// cannot recover from and is isolated by the engine.
pub trait Checker: Send + Sync {
    /// Stable identifier, `check_` prefixed
    fn name(&self) -> &str;
    /// Category the checker reports into
    fn category(&self) -> Category;
    fn run(
        &self,
        document: &DocumentModel,
        doc_type: &ResolvedDocType,
        terminology: &TerminologyData,
    ) -> Result<Vec<Finding>>;
}

pub type CheckerRef = Arc<dyn Checker>;

/// Non-heading paragraphs with their index
pub(crate) fn body_paragraphs(
    document: &DocumentModel,
) -> impl Iterator<Item = (usize, &Paragraph)> {
    document
        .paragraphs
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_heading())
}

/// Every paragraph's text with its index, skipping blanks
pub(crate) fn paragraph_texts(document: &DocumentModel) -> Vec<(usize, String)> {
    document
        .paragraphs
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.full_text()))
        .filter(|(_, text)| !text.trim().is_empty())
        .collect()
}

/// Locate a match at byte `offset` of paragraph `index`. Paragraphs with soft
/// line breaks also get the one-based line of the match.
pub(crate) fn at_match(finding: Finding, index: usize, text: &str, offset: usize) -> Finding {
    let finding = finding.at_paragraph(index);
    if !text.contains('\n') {
        return finding;
    }
    let line = text
        .get(..offset)
        .map(|before| before.matches('\n').count() + 1)
        .unwrap_or(1);
    finding.at_line(line)
}

/// True when byte span `[start, end)` overlaps any of `spans`
pub(crate) fn overlaps(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}
