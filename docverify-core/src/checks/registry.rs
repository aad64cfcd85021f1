use super::{
    accessibility, acronym, document_status, format, heading, readability, reference, structure,
    terminology,
};
use super::CheckerRef;
use crate::error::RegistrationError;
use crate::types::Category;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix every discoverable checker name carries
pub const CHECK_PREFIX: &str = "check_";

/// A module of checker implementations, as seen by discovery.
pub struct CheckModule {
    pub name: &'static str,
    pub implementations: fn() -> Vec<CheckerRef>,
}

/// Every checker module in the crate. Discovery scans these.
pub const CHECK_MODULES: &[CheckModule] = &[
    CheckModule {
        name: "heading_checks",
        implementations: heading::implementations,
    },
    CheckModule {
        name: "acronym_checks",
        implementations: acronym::implementations,
    },
    CheckModule {
        name: "terminology_checks",
        implementations: terminology::implementations,
    },
    CheckModule {
        name: "format_checks",
        implementations: format::implementations,
    },
    CheckModule {
        name: "reference_checks",
        implementations: reference::implementations,
    },
    CheckModule {
        name: "structure_checks",
        implementations: structure::implementations,
    },
    CheckModule {
        name: "readability_checks",
        implementations: readability::implementations,
    },
    CheckModule {
        name: "accessibility_checks",
        implementations: accessibility::implementations,
    },
    CheckModule {
        name: "document_status_checks",
        implementations: document_status::implementations,
    },
];

/// What *should* be registered: category -> checker names found in `modules`
/// that follow the `check_` naming convention.
pub fn discover_in(modules: &[CheckModule]) -> IndexMap<Category, IndexSet<String>> {
    let mut discovered: IndexMap<Category, IndexSet<String>> = IndexMap::new();
    for module in modules {
        for checker in (module.implementations)() {
            let name = checker.name();
            if !name.starts_with(CHECK_PREFIX) {
                debug!(module = module.name, name, "skipping non-check implementation");
                continue;
            }
            discovered
                .entry(checker.category())
                .or_default()
                .insert(name.to_string());
        }
    }
    discovered
}

/// Discovery over the crate's own checker modules
pub fn discover() -> IndexMap<Category, IndexSet<String>> {
    discover_in(CHECK_MODULES)
}

/// Result of diffing discovery against the live registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Implemented but never registered
    pub unregistered: Vec<RegistrationError>,
    /// Registered with no matching implementation
    pub orphaned: Vec<RegistrationError>,
    /// Same checker registered under two categories, or under a category other than its own
    pub conflicts: Vec<RegistrationError>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.unregistered.is_empty() && self.orphaned.is_empty() && self.conflicts.is_empty()
    }

    pub fn errors(&self) -> Vec<RegistrationError> {
        self.unregistered
            .iter()
            .chain(self.orphaned.iter())
            .chain(self.conflicts.iter())
            .cloned()
            .collect()
    }

    pub fn into_result(self) -> Result<(), Vec<RegistrationError>> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(self.errors())
        }
    }
}

/// Category -> checkers table, built explicitly at startup and read-only during runs.
#[derive(Default)]
pub struct CheckRegistry {
    /// Registration order across all categories
    order: Vec<(Category, CheckerRef)>,
    /// name -> category it was first registered under
    index: HashMap<String, Category>,
    conflicts: Vec<RegistrationError>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `checker` under `category`.
    ///
    /// A checker is registered once per name: repeating the same registration
    /// is a no-op, and registering it under a second category is kept as a
    /// conflict for [`validate`](Self::validate) instead of overwriting.
    pub fn register(&mut self, category: Category, checker: CheckerRef) -> &mut Self {
        let name = checker.name().to_string();
        match self.index.get(&name) {
            Some(existing) if *existing == category => {
                debug!(check = %name, %category, "already registered");
            }
            Some(existing) => {
                warn!(check = %name, first = %existing, second = %category, "checker registered under two categories");
                self.conflicts.push(RegistrationError::CategoryConflict {
                    check: name,
                    first: *existing,
                    second: category,
                });
            }
            None => {
                self.index.insert(name, category);
                self.order.push((category, checker));
            }
        }
        self
    }

    pub fn register_all(
        &mut self,
        category: Category,
        checkers: impl IntoIterator<Item = CheckerRef>,
    ) -> &mut Self {
        for checker in checkers {
            self.register(category, checker);
        }
        self
    }

    /// Checkers for one category in registration order
    pub fn get_checks(&self, category: Category) -> Vec<CheckerRef> {
        self.order
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, checker)| Arc::clone(checker))
            .collect()
    }

    /// Every registered checker in registration order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CheckerRef)> {
        self.order.iter().map(|(c, checker)| (*c, checker))
    }

    pub fn get_category_mappings(&self) -> IndexMap<Category, Vec<String>> {
        let mut mappings: IndexMap<Category, Vec<String>> = IndexMap::new();
        for (category, checker) in &self.order {
            mappings
                .entry(*category)
                .or_default()
                .push(checker.name().to_string());
        }
        mappings
    }

    pub fn categories(&self) -> Vec<Category> {
        self.get_category_mappings().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
        self.conflicts.clear();
    }

    /// Diff the crate's checker modules against this registry
    pub fn validate(&self) -> ValidationReport {
        self.validate_against(&discover())
    }

    pub fn validate_against(
        &self,
        discovered: &IndexMap<Category, IndexSet<String>>,
    ) -> ValidationReport {
        let mut report = ValidationReport {
            conflicts: self.conflicts.clone(),
            ..Default::default()
        };

        let mut implemented: HashMap<&str, Category> = HashMap::new();
        for (category, names) in discovered {
            for name in names {
                implemented.insert(name.as_str(), *category);
                match self.index.get(name) {
                    None => report.unregistered.push(RegistrationError::Unregistered {
                        category: *category,
                        check: name.clone(),
                    }),
                    Some(registered) if registered != category => {
                        report.conflicts.push(RegistrationError::CategoryConflict {
                            check: name.clone(),
                            first: *category,
                            second: *registered,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        for (category, checker) in &self.order {
            if !implemented.contains_key(checker.name()) {
                report.orphaned.push(RegistrationError::Orphaned {
                    category: *category,
                    check: checker.name().to_string(),
                });
            }
        }

        report
    }
}

/// The full production checker set, registered category by category.
/// Order here is the output order of a run.
pub fn default_registry() -> CheckRegistry {
    let mut registry = CheckRegistry::new();

    registry.register_all(
        Category::Heading,
        [
            Arc::new(heading::RequiredHeadingsCheck) as CheckerRef,
            Arc::new(heading::HeadingPeriodsCheck),
            Arc::new(heading::HeadingLengthCheck),
            Arc::new(heading::HeadingSequenceCheck),
        ],
    );
    registry.register_all(
        Category::Acronym,
        [
            Arc::new(acronym::AcronymDefinitionCheck) as CheckerRef,
            Arc::new(acronym::AcronymUsageCheck),
        ],
    );
    registry.register_all(
        Category::Terminology,
        [
            Arc::new(terminology::PatternRuleCheck) as CheckerRef,
            Arc::new(terminology::TermReplacementCheck),
            Arc::new(terminology::ForbiddenTermCheck),
            Arc::new(terminology::TermConsistencyCheck),
            Arc::new(terminology::ProposedWordingCheck),
            Arc::new(terminology::ObsoleteCitationCheck),
        ],
    );
    registry.register_all(
        Category::Format,
        [
            Arc::new(format::DateFormatCheck) as CheckerRef,
            Arc::new(format::PlaceholderCheck),
            Arc::new(format::PhoneNumberCheck),
            Arc::new(format::SpacingCheck),
            Arc::new(format::SectionSymbolCheck),
            Arc::new(format::ParenthesesCheck),
            Arc::new(format::PunctuationCheck),
            Arc::new(format::ListFormattingCheck),
            Arc::new(reference::CaptionFormatCheck),
            Arc::new(reference::TableFigureReferenceCheck),
        ],
    );
    registry.register_all(
        Category::Structure,
        [
            Arc::new(structure::ParagraphLengthCheck) as CheckerRef,
            Arc::new(structure::SentenceLengthCheck),
            Arc::new(structure::SectionBalanceCheck),
            Arc::new(structure::RequiredLanguageCheck),
            Arc::new(structure::FootnoteCheck),
        ],
    );
    registry.register_all(
        Category::Readability,
        [
            Arc::new(readability::ReadabilityMetricsCheck) as CheckerRef,
            Arc::new(readability::PassiveVoiceCheck),
            Arc::new(readability::PlainLanguageCheck),
        ],
    );
    registry.register_all(
        Category::Accessibility,
        [
            Arc::new(accessibility::ImageAltTextCheck) as CheckerRef,
            Arc::new(accessibility::HeadingStructureCheck),
            Arc::new(accessibility::LinkTextCheck),
            Arc::new(accessibility::ColorContrastCheck),
        ],
    );
    registry.register_all(
        Category::DocumentStatus,
        [
            Arc::new(document_status::WatermarkCheck) as CheckerRef,
            Arc::new(document_status::DocumentTypeMarkerCheck),
        ],
    );

    registry
}
