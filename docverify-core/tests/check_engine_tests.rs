//! End-to-end tests for the check engine.
//!
//! Every test goes through `DocumentChecker` with the embedded terminology
//! corpus, so they cover registry order, document-type resolution,
//! aggregation and rendering together:
//!
//! - Result invariants (has_errors, category partition, idempotence)
//! - Registry drift validation
//! - The acronym, heading, spacing, date and watermark scenarios
//! - Rendering with visibility filters
//! - Custom acronyms flowing from the store into a run

use docverify_core::checks::discover;
use docverify_core::{
    default_registry, render_html, Category, CheckResult, DocumentChecker, DocumentModel, EngineConfig, GroupBy,
    Paragraph, Severity, TerminologyStore, VisibilitySettings,
};
use std::sync::Arc;

// ============================================================================
// Fixture helpers
// ============================================================================

fn checker() -> DocumentChecker {
    DocumentChecker::builtin().expect("embedded corpus loads")
}

fn check_lines(lines: &[&str], doc_type: &str) -> CheckResult {
    checker().run_all_document_checks(&DocumentModel::from_text_lines(lines), doc_type)
}

fn advisory_circular(headings: &[&str], body: &[&str]) -> DocumentModel {
    let mut paragraphs: Vec<Paragraph> = headings.iter().map(|h| Paragraph::heading(1, *h)).collect();
    paragraphs.extend(body.iter().map(|b| Paragraph::new(*b)));
    DocumentModel::from_paragraphs(paragraphs)
}

/// A deliberately messy document that trips many checkers at once
fn messy_document() -> DocumentModel {
    let mut paragraphs = vec![
        Paragraph::heading(1, "PURPOSE"),
        Paragraph::new("We must comply with 49 USC 106(g) prior to the deadline of 7/25/2006."),
        Paragraph::heading(3, "Scope"),
        Paragraph::new("The FAA  will review it. See Table 2 and click here. TBD"),
        Paragraph::new("(a) first item;"),
        Paragraph::new("(b) second item"),
    ];
    paragraphs[3].hyperlinks.push(docverify_core::Hyperlink {
        text: "click here".to_string(),
        url: "https://www.faa.gov".to_string(),
    });
    paragraphs[3].images.push(docverify_core::ImageInfo {
        name: "Picture 1".to_string(),
        ..Default::default()
    });
    DocumentModel::from_paragraphs(paragraphs)
}

// ============================================================================
// Result invariants
// ============================================================================

mod result_invariants {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC_TYPES: &[&str] = &[
        "Advisory Circular",
        "AC",
        "Order",
        "Policy Statement",
        "Notice of Proposed Rulemaking",
        "Memo to File",
        "",
    ];

    fn documents() -> Vec<DocumentModel> {
        vec![
            DocumentModel::default(),
            DocumentModel::from_text_lines(&["This order establishes FAA policy."]),
            DocumentModel::from_text_lines(&["Nothing to report here."]),
            messy_document(),
        ]
    }

    #[test]
    fn has_errors_matches_error_findings() {
        let checker = checker();
        for document in documents() {
            for doc_type in DOC_TYPES {
                let result = checker.run_all_document_checks(&document, doc_type);
                let any_error = result.findings.iter().any(|f| f.severity == Severity::Error);
                assert_eq!(result.has_errors, any_error, "doc type '{doc_type}'");
            }
        }
    }

    #[test]
    fn by_category_partitions_findings() {
        let checker = checker();
        for document in documents() {
            let result = checker.run_all_document_checks(&document, "Advisory Circular");

            for (category, findings) in &result.by_category {
                assert!(findings.iter().all(|f| f.category == *category));
                let expected: Vec<_> = result.findings.iter().filter(|f| f.category == *category).collect();
                assert_eq!(findings.iter().collect::<Vec<_>>(), expected);
            }
            let total: usize = result.by_category.values().map(Vec::len).sum();
            assert_eq!(total, result.findings.len());

            let total: usize = result.by_severity.values().map(Vec::len).sum();
            assert_eq!(total, result.findings.len());
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let checker = checker();
        let document = messy_document();
        let first = checker.run_all_document_checks(&document, "Order");
        let second = checker.run_all_document_checks(&document, "Order");
        assert_eq!(first, second);
        assert!(!first.findings.is_empty());
    }

    #[test]
    fn findings_follow_registry_order() {
        let result = checker().run_all_document_checks(&messy_document(), "Order");
        let rank = |category: Category| {
            default_registry()
                .categories()
                .iter()
                .position(|c| *c == category)
                .unwrap_or(usize::MAX)
        };
        // Each category registers as one contiguous block, so findings never go backwards
        let ranks: Vec<usize> = result.findings.iter().map(|f| rank(f.category)).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn unknown_document_type_degrades_to_marker() {
        let result = check_lines(&["Nothing to report here."], "Memo to File");
        let status = result.for_category(Category::DocumentStatus);
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].severity, Severity::Info);
    }

    #[test]
    fn document_json_round_trips_through_a_run() {
        let json = r#"{
            "paragraphs": [
                {"text": "PURPOSE.", "style": "Heading 1"},
                {"text": "This order establishes FAA policy."}
            ],
            "metadata": {"title": "Order 8900.1", "created": "2024-03-05T12:00:00Z"}
        }"#;
        let document: DocumentModel = serde_json::from_str(json).unwrap();
        let result = checker().run_all_document_checks(&document, "Order");

        assert_eq!(result.metadata.title.as_deref(), Some("Order 8900.1"));
        assert_eq!(result.for_category(Category::Acronym).len(), 1);

        let parsed: CheckResult = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(parsed, result);
    }
}

// ============================================================================
// Registry drift
// ============================================================================

mod registry {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn full_registry_validates_clean() {
        let report = default_registry().validate();
        assert!(report.unregistered.is_empty(), "{:?}", report.unregistered);
        assert!(report.orphaned.is_empty(), "{:?}", report.orphaned);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn discovery_covers_every_category() {
        let discovered = discover();
        for category in Category::ALL {
            assert!(
                discovered.get(&category).is_some_and(|names| !names.is_empty()),
                "no checks discovered for {category}"
            );
        }
    }

    #[test]
    fn cleared_registry_reports_everything_unregistered() {
        let mut registry = default_registry();
        let total = registry.len();
        registry.clear();

        let report = registry.validate();
        assert_eq!(report.unregistered.len(), total);
        assert!(!report.is_clean());
    }
}

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn undefined_acronym() {
        let result = check_lines(&["This order establishes FAA policy."], "Order");
        let acronyms = result.for_category(Category::Acronym);

        assert_eq!(acronyms.len(), 1);
        assert_eq!(acronyms[0].severity, Severity::Error);
        assert_eq!(
            acronyms[0].suggestion.as_deref(),
            Some("Federal Aviation Administration (FAA)")
        );
    }

    #[test]
    fn advisory_circular_missing_applicability() {
        let document = advisory_circular(
            &["PURPOSE.", "RELATED MATERIAL.", "DEFINITION OF KEY TERMS."],
            &["This guidance describes an acceptable means of compliance."],
        );
        let result = checker().run_all_document_checks(&document, "Advisory Circular");
        let headings = result.for_category(Category::Heading);

        let errors: Vec<_> = headings.iter().filter(|f| f.severity == Severity::Error).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("APPLICABILITY."));

        let infos: Vec<_> = headings.iter().filter(|f| f.severity == Severity::Info).collect();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].message.contains("CANCELLATION."));
        assert_eq!(headings.len(), 2);
    }

    #[test]
    fn spacing_errors() {
        let result = check_lines(&["AC25.25 states that  SFAR88"], "Order");
        let format = result.for_category(Category::Format);

        assert_eq!(format.len(), 2);
        assert!(format.iter().all(|f| f.severity == Severity::Error));
        assert_eq!(format[0].suggestion.as_deref(), Some("AC 25"));
        assert_eq!(format[1].suggestion.as_deref(), Some("AC25.25 states that SFAR88"));
    }

    #[test]
    fn slash_date_in_body() {
        let result = check_lines(&["The policy dated 7/25/2006."], "Order");
        let dates: Vec<_> = result
            .for_category(Category::Format)
            .iter()
            .filter(|f| f.message.contains("date format"))
            .collect();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].severity, Severity::Error);
        assert_eq!(dates[0].suggestion.as_deref(), Some("July 25, 2006"));
    }

    #[test]
    fn draft_watermark_follows_review_stage() {
        let mut document = DocumentModel::from_text_lines(&["This guidance is open for comment."]);
        document.metadata.watermark = Some("Draft for FAA review".to_string());

        let checker = checker();
        let internal =
            checker.run_document_checks_at_stage(&document, "Order", Some("internal review"));
        assert!(internal.for_category(Category::DocumentStatus).is_empty());

        let public =
            checker.run_document_checks_at_stage(&document, "Order", Some("public_comment"));
        let status = public.for_category(Category::DocumentStatus);
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].severity, Severity::Error);
        assert_eq!(status[0].suggestion.as_deref(), Some("draft for public comments"));
        assert!(public.has_errors);

        document.metadata.watermark = None;
        let missing = checker.run_all_document_checks(&document, "Advisory Circular");
        let status = missing.for_category(Category::DocumentStatus);
        assert_eq!(status.len(), 1);
        assert!(status[0].message.contains("require a watermark"));
    }

    #[test]
    fn tso_identifier_is_not_a_date() {
        let result = check_lines(&["Comply with TSO-C7/25/2006 for this equipment."], "Order");
        assert!(result
            .for_category(Category::Format)
            .iter()
            .all(|f| !f.message.contains("date format")));
    }
}

// ============================================================================
// Rendering
// ============================================================================

mod rendering {
    use super::*;

    #[test]
    fn all_hidden_renders_only_the_header() {
        let result = checker().run_all_document_checks(&messy_document(), "Order");
        assert!(!result.findings.is_empty());

        let html = render_html(&result, GroupBy::Category, &VisibilitySettings::all_hidden());
        assert!(html.contains("report-metadata"));
        assert!(html.contains("Not available"));
        assert!(!html.contains("report-group"));
        assert!(!html.contains("class=\"finding\""));
        // Hiding never drops findings from the result itself
        assert!(!result.findings.is_empty());
    }

    #[test]
    fn hidden_category_is_omitted_in_both_groupings() {
        let result = check_lines(&["This order establishes FAA policy."], "Order");
        let mut visibility = VisibilitySettings::default();
        visibility.hide(Category::Acronym);

        for group_by in [GroupBy::Category, GroupBy::Severity] {
            let html = render_html(&result, group_by, &visibility);
            assert!(!html.contains("Federal Aviation Administration (FAA)"), "{group_by}");
        }
    }

    #[test]
    fn messages_are_escaped() {
        let result = check_lines(&["Use <b>bold</b> & \"quotes\" per AC  25."], "Order");
        let html = render_html(&result, GroupBy::Severity, &VisibilitySettings::default());
        assert!(!html.contains("<b>bold</b>"));
    }
}

// ============================================================================
// Terminology store
// ============================================================================

mod terminology_store {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn custom_acronym_reaches_the_next_run() {
        let store = Arc::new(TerminologyStore::builtin().unwrap());
        let checker = DocumentChecker::new(store.clone(), EngineConfig::builtin());
        let document = DocumentModel::from_text_lines(&["Crews keep the QRH on board."]);

        let before = checker.run_all_document_checks(&document, "Order");
        assert_eq!(
            before.for_category(Category::Acronym)[0].suggestion.as_deref(),
            Some("Define 'QRH' on first use.")
        );

        store.add_custom_acronym("QRH", "Quick Reference Handbook").unwrap();
        let after = checker.run_all_document_checks(&document, "Order");
        assert_eq!(
            after.for_category(Category::Acronym)[0].suggestion.as_deref(),
            Some("Quick Reference Handbook (QRH)")
        );
    }

    #[test]
    fn saved_corpus_reloads_with_custom_acronym() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terminology.json");

        let store = TerminologyStore::builtin().unwrap();
        store.add_custom_acronym("QRH", "Quick Reference Handbook").unwrap();
        store.save_to(&path).unwrap();

        let reloaded = TerminologyStore::load(&path).unwrap();
        assert_eq!(
            reloaded.snapshot().get_acronym("QRH"),
            Some("Quick Reference Handbook")
        );
        assert_eq!(reloaded.fingerprint().unwrap(), store.fingerprint().unwrap());
    }
}
