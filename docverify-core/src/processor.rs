use crate::checks::{default_registry, CheckRegistry, Checker};
use crate::config::{EngineConfig, ResolvedDocType, TerminologyData};
use crate::error::{CheckerExecutionError, ConfigError};
use crate::formatter::aggregate;
use crate::terminology::TerminologyStore;
use crate::types::{Category, CheckResult, DocumentModel, Finding};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Simple profiler that collects timings for each checker
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        self.timings.push((step_name.to_string(), start.elapsed()));
        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.2}ms ({:.1}%)",
                step,
                duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        println!("   {:.<35} {:.2}ms", "Total", total.as_secs_f64() * 1000.0);
    }
}

/// Runs every registered checker over a document and aggregates the findings.
///
/// Checkers run one after another in registration order. A checker that
/// returns an error or panics contributes a single ERROR finding naming it;
/// the remaining checkers still run.
pub struct DocumentChecker {
    registry: CheckRegistry,
    terminology: Arc<TerminologyStore>,
    engine_config: EngineConfig,
}

impl DocumentChecker {
    /// Checker over the full default registry
    pub fn new(terminology: Arc<TerminologyStore>, engine_config: EngineConfig) -> Self {
        Self::with_registry(default_registry(), terminology, engine_config)
    }

    /// Create DocumentChecker with an explicit registry (tests, partial pipelines)
    pub fn with_registry(
        registry: CheckRegistry,
        terminology: Arc<TerminologyStore>,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            terminology,
            engine_config,
        }
    }

    /// Embedded terminology corpus and engine settings
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(Self::new(
            Arc::new(TerminologyStore::builtin()?),
            EngineConfig::builtin(),
        ))
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    pub fn terminology(&self) -> &Arc<TerminologyStore> {
        &self.terminology
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine_config
    }

    pub fn run_all_document_checks(&self, document: &DocumentModel, doc_type: &str) -> CheckResult {
        self.run_document_checks_at_stage(document, doc_type, None)
    }

    /// Check a draft at a review stage ("public_comment", "final_draft", ...).
    /// The stage selects the watermark the draft must carry.
    pub fn run_document_checks_at_stage(
        &self,
        document: &DocumentModel,
        doc_type: &str,
        stage: Option<&str>,
    ) -> CheckResult {
        let mut profiler = StepProfiler::new(self.engine_config.profile);
        let result =
            self.run_all_document_checks_with_profiler(document, doc_type, stage, &mut profiler);
        profiler.print_summary();
        result
    }

    /// Same as [`run_document_checks_at_stage`](Self::run_document_checks_at_stage),
    /// timing each checker into `profiler`
    pub fn run_all_document_checks_with_profiler(
        &self,
        document: &DocumentModel,
        doc_type: &str,
        stage: Option<&str>,
        profiler: &mut StepProfiler,
    ) -> CheckResult {
        let start_time = Instant::now();
        let terminology = self.terminology.snapshot();
        let resolved = terminology.get_document_type_config(doc_type).at_stage(stage);

        let mut findings_by_checker: Vec<Vec<Finding>> = Vec::with_capacity(self.registry.len());
        let mut executed = 0usize;

        for (category, checker) in self.registry.iter() {
            let name = checker.name();
            if !self.engine_config.pipeline.is_enabled(name) {
                debug!(check = name, "skipping disabled check");
                continue;
            }

            let findings = profiler.time_step(name, || {
                run_checker(checker.as_ref(), category, document, &resolved, &terminology)
            });
            debug!(check = name, findings = findings.len(), "check complete");
            findings_by_checker.push(findings);
            executed += 1;
        }

        let result = aggregate(findings_by_checker, document.metadata.clone());
        let summary = result.summary();
        info!(
            doc_type = %resolved.name,
            stage = resolved.stage.as_deref().unwrap_or("-"),
            checks = executed,
            errors = summary.errors,
            warnings = summary.warnings,
            info = summary.info,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "document check complete"
        );
        result
    }
}

/// Run one checker, converting an error or panic into a single ERROR finding
fn run_checker(
    checker: &dyn Checker,
    category: Category,
    document: &DocumentModel,
    doc_type: &ResolvedDocType,
    terminology: &TerminologyData,
) -> Vec<Finding> {
    let outcome = catch_unwind(AssertUnwindSafe(|| checker.run(document, doc_type, terminology)));
    let reason = match outcome {
        Ok(Ok(findings)) => return findings,
        Ok(Err(e)) => format!("{e:#}"),
        Err(payload) => panic_message(payload.as_ref()),
    };

    warn!(check = checker.name(), %reason, "check failed");
    vec![CheckerExecutionError {
        checker: checker.name().to_string(),
        category,
        reason,
    }
    .into_finding()]
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

/// Check a document with the embedded terminology corpus and engine settings.
///
/// Fails only when the embedded corpus is invalid; individual checker
/// failures are reported as findings.
pub fn run_all_document_checks(
    document: &DocumentModel,
    doc_type: &str,
) -> Result<CheckResult, ConfigError> {
    Ok(DocumentChecker::builtin()?.run_all_document_checks(document, doc_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::format::SpacingCheck;
    use crate::config::CheckConfig;
    use crate::types::Severity;
    use anyhow::{bail, Result};
    use pretty_assertions::assert_eq;

    struct FailingCheck;

    impl Checker for FailingCheck {
        fn name(&self) -> &str {
            "check_always_fails"
        }
        fn category(&self) -> Category {
            Category::Structure
        }
        fn run(
            &self,
            _: &DocumentModel,
            _: &ResolvedDocType,
            _: &TerminologyData,
        ) -> Result<Vec<Finding>> {
            bail!("corrupt document object")
        }
    }

    struct PanickingCheck;

    impl Checker for PanickingCheck {
        fn name(&self) -> &str {
            "check_always_panics"
        }
        fn category(&self) -> Category {
            Category::Readability
        }
        fn run(
            &self,
            _: &DocumentModel,
            _: &ResolvedDocType,
            _: &TerminologyData,
        ) -> Result<Vec<Finding>> {
            panic!("index out of range")
        }
    }

    fn checker_with(registry: CheckRegistry, engine_config: EngineConfig) -> DocumentChecker {
        let store = Arc::new(TerminologyStore::builtin().unwrap());
        DocumentChecker::with_registry(registry, store, engine_config)
    }

    fn spacing_document() -> DocumentModel {
        DocumentModel::from_text_lines(&["AC25.25 states that  SFAR88"])
    }

    #[test]
    fn test_failing_checkers_do_not_block_siblings() {
        let mut registry = CheckRegistry::new();
        registry
            .register(Category::Structure, Arc::new(FailingCheck))
            .register(Category::Readability, Arc::new(PanickingCheck))
            .register(Category::Format, Arc::new(SpacingCheck));

        let result = checker_with(registry, EngineConfig::default())
            .run_all_document_checks(&spacing_document(), "Order");

        assert_eq!(result.findings.len(), 4);
        assert_eq!(
            result.findings[0].message,
            "Checker 'check_always_fails' failed: corrupt document object"
        );
        assert_eq!(result.findings[0].category, Category::Structure);
        assert_eq!(
            result.findings[1].message,
            "Checker 'check_always_panics' failed: panicked: index out of range"
        );
        assert_eq!(result.findings[1].severity, Severity::Error);
        assert_eq!(result.for_category(Category::Format).len(), 2);
    }

    #[test]
    fn test_disabled_checks_are_skipped() {
        let mut registry = CheckRegistry::new();
        registry.register(Category::Format, Arc::new(SpacingCheck));

        let mut config = EngineConfig::default();
        config.pipeline.checks.push(CheckConfig {
            name: "check_spacing".to_string(),
            enabled: false,
        });

        let result =
            checker_with(registry, config).run_all_document_checks(&spacing_document(), "Order");
        assert!(result.findings.is_empty());
        assert!(!result.has_errors);
    }

    #[test]
    fn test_profiler_records_each_enabled_check() {
        let mut registry = CheckRegistry::new();
        registry
            .register(Category::Format, Arc::new(SpacingCheck))
            .register(Category::Structure, Arc::new(FailingCheck));

        let checker = checker_with(registry, EngineConfig::default());
        let mut profiler = StepProfiler::new(true);
        checker.run_all_document_checks_with_profiler(
            &spacing_document(),
            "Order",
            None,
            &mut profiler,
        );

        let steps: Vec<&str> = profiler.timings().iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(steps, vec!["check_spacing", "check_always_fails"]);

        let mut disabled = StepProfiler::new(false);
        checker.run_all_document_checks_with_profiler(
            &spacing_document(),
            "Order",
            None,
            &mut disabled,
        );
        assert!(disabled.timings().is_empty());
    }

    #[test]
    fn test_metadata_is_carried_into_result() {
        let mut document = spacing_document();
        document.metadata.title = Some("Draft AC".to_string());
        let result = run_all_document_checks(&document, "Advisory Circular").unwrap();
        assert_eq!(result.metadata.title.as_deref(), Some("Draft AC"));
    }
}
