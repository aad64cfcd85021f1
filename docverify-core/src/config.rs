use crate::formatter::{GroupBy, VisibilitySettings};
use crate::text_utils::normalize_document_type;
use crate::types::{Category, Finding};
use anyhow::Result;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use tracing::warn;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_min_acronym_length() -> usize {
    2
}

fn default_max_acronym_length() -> usize {
    10
}

fn default_max_heading_depth() -> u8 {
    6
}

fn default_contrast_ratio() -> f64 {
    4.5
}

/// "Public Comment", "public-comment" -> "public_comment"
pub fn normalize_stage(stage: &str) -> String {
    normalize_document_type(stage).replace(' ', "_")
}

/// Name of the fallback document type used for unrecognized inputs
pub const OTHER_DOCUMENT_TYPE: &str = "Other";

// ===== TERMINOLOGY CORPUS =====
// Mirrors the terminology JSON. Unknown top-level keys are carried through
// `extra` so a save never drops data this crate doesn't model.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminologyData {
    pub acronyms: AcronymTables,
    #[serde(default)]
    pub acronym_rules: AcronymRules,
    /// Pattern groups keyed by concern (pronouns, citations, section_symbol, ...)
    pub patterns: IndexMap<String, Vec<PatternRule>>,
    /// Document type name -> standard language that must appear verbatim
    #[serde(default)]
    pub required_language: IndexMap<String, Vec<String>>,
    pub valid_words: ValidWords,
    #[serde(default)]
    pub heading_words: Vec<String>,
    /// Document type name -> whether headings end with a period
    #[serde(default)]
    pub heading_periods: IndexMap<String, bool>,
    pub document_types: IndexMap<String, DocumentTypeConfig>,
    /// Review stage -> the watermark a draft must carry at that stage
    #[serde(default)]
    pub watermarks: IndexMap<String, String>,
    #[serde(default)]
    pub accessibility: AccessibilityRules,
    #[serde(default)]
    pub readability: ReadabilityRules,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,

    #[serde(skip)]
    pub(crate) compiled: CompiledRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcronymTables {
    pub standard: BTreeMap<String, String>,
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidWords {
    #[serde(default)]
    pub standard: Vec<String>,
    #[serde(default)]
    pub custom: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcronymRules {
    #[serde(default = "default_min_acronym_length")]
    pub min_length: usize,
    #[serde(default = "default_max_acronym_length")]
    pub max_length: usize,
    /// Upper-case tokens never treated as acronyms (roman numerals, headings words, ...)
    #[serde(default)]
    pub exempt: Vec<String>,
    /// Regexes for regulatory identifiers that look like acronyms (e.g. `AC\s*\d+`)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

impl Default for AcronymRules {
    fn default() -> Self {
        Self {
            min_length: default_min_acronym_length(),
            max_length: default_max_acronym_length(),
            exempt: Vec::new(),
            ignore_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessibilityRules {
    #[serde(default = "default_max_heading_depth")]
    pub max_heading_depth: u8,
    #[serde(default = "default_contrast_ratio")]
    pub min_contrast_ratio: f64,
    /// Link texts that don't describe their target
    #[serde(default)]
    pub generic_link_text: Vec<String>,
}

impl Default for AccessibilityRules {
    fn default() -> Self {
        Self {
            max_heading_depth: default_max_heading_depth(),
            min_contrast_ratio: default_contrast_ratio(),
            generic_link_text: Vec::new(),
        }
    }
}

/// Length and readability thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadabilityRules {
    pub max_sentences_per_paragraph: usize,
    pub max_lines_per_paragraph: usize,
    /// Characters per rendered line, used to estimate paragraph line counts
    pub chars_per_line: usize,
    pub max_sentence_words: usize,
    pub min_flesch_reading_ease: f64,
    pub max_flesch_kincaid_grade: f64,
    pub max_gunning_fog: f64,
    pub max_passive_voice_percent: f64,
    /// Section balance: multiplier over the cohort average for normal sections
    pub section_ratio: f64,
    pub list_section_ratio: f64,
    /// Section balance: minimum paragraph count before a section can be flagged
    pub section_min_paragraphs: usize,
    pub list_section_min_paragraphs: usize,
    pub max_heading_length: usize,
}

impl Default for ReadabilityRules {
    fn default() -> Self {
        Self {
            max_sentences_per_paragraph: 6,
            max_lines_per_paragraph: 8,
            chars_per_line: 80,
            max_sentence_words: 35,
            min_flesch_reading_ease: 50.0,
            max_flesch_kincaid_grade: 12.0,
            max_gunning_fog: 12.0,
            max_passive_voice_percent: 10.0,
            section_ratio: 1.5,
            list_section_ratio: 2.0,
            section_min_paragraphs: 10,
            list_section_min_paragraphs: 20,
            max_heading_length: 25,
        }
    }
}

// ===== PATTERN RULES =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub description: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacements: Option<BTreeMap<String, String>>,
}

/// How a matched span is turned into a suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementStrategy {
    None,
    Single(String),
    /// Keyed by the lower-cased matched text
    PerMatch(BTreeMap<String, String>),
}

/// What a rule does when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Report an ERROR finding
    Flag,
    /// Report an INFO finding carrying the replacement
    Advise,
    /// Allow-list the span: suppresses overlapping `Flag` matches, reports nothing
    Allow,
}

impl PatternRule {
    pub fn strategy(&self) -> ReplacementStrategy {
        if let Some(map) = &self.replacements {
            let lowered = map
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect();
            ReplacementStrategy::PerMatch(lowered)
        } else if let Some(single) = &self.replacement {
            ReplacementStrategy::Single(single.clone())
        } else {
            ReplacementStrategy::None
        }
    }

    pub fn action(&self) -> RuleAction {
        if self.is_error {
            RuleAction::Flag
        } else if self.strategy() == ReplacementStrategy::None {
            RuleAction::Allow
        } else {
            RuleAction::Advise
        }
    }
}

impl ReplacementStrategy {
    pub fn resolve(&self, matched: &str) -> Option<String> {
        match self {
            ReplacementStrategy::None => None,
            ReplacementStrategy::Single(s) => Some(s.clone()),
            ReplacementStrategy::PerMatch(map) => map.get(&matched.to_lowercase()).cloned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledPatternRule {
    pub group: String,
    pub regex: Regex,
    pub description: String,
    pub action: RuleAction,
    pub strategy: ReplacementStrategy,
}

/// Everything derived from the raw corpus at load time
#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledRules {
    pub pattern_rules: Vec<CompiledPatternRule>,
    pub acronym_ignore: Vec<Regex>,
    pub document_types: ConfigManager,
}

// ===== DOCUMENT TYPES =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionScheme {
    /// "Table 3-1": chapter-relative numbering (Advisory Circulars, Orders)
    Chaptered,
    /// "Table 3"
    #[default]
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingCondition {
    IfCancelsPrevious,
    /// A condition name this engine can't evaluate; treated as not detected
    Unknown(String),
}

impl HeadingCondition {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "if_cancels_previous" | "cancels_previous" => HeadingCondition::IfCancelsPrevious,
            other => HeadingCondition::Unknown(other.to_string()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            HeadingCondition::IfCancelsPrevious => "if_cancels_previous",
            HeadingCondition::Unknown(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingPresence {
    Required,
    Optional,
    Conditional(HeadingCondition),
}

/// One required heading. Accepts either a bare string or
/// `{ "name": ..., "optional": bool, "condition": "if_cancels_previous" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRequiredHeading", into = "RawRequiredHeading")]
pub struct RequiredHeading {
    pub name: String,
    pub presence: HeadingPresence,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawRequiredHeading {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        optional: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
}

impl From<RawRequiredHeading> for RequiredHeading {
    fn from(raw: RawRequiredHeading) -> Self {
        match raw {
            RawRequiredHeading::Name(name) => RequiredHeading {
                name,
                presence: HeadingPresence::Required,
            },
            RawRequiredHeading::Detailed {
                name,
                optional,
                condition,
            } => {
                let presence = match condition {
                    Some(c) => HeadingPresence::Conditional(HeadingCondition::parse(&c)),
                    None if optional => HeadingPresence::Optional,
                    None => HeadingPresence::Required,
                };
                RequiredHeading { name, presence }
            }
        }
    }
}

impl From<RequiredHeading> for RawRequiredHeading {
    fn from(heading: RequiredHeading) -> Self {
        match heading.presence {
            HeadingPresence::Required => RawRequiredHeading::Name(heading.name),
            HeadingPresence::Optional => RawRequiredHeading::Detailed {
                name: heading.name,
                optional: true,
                condition: None,
            },
            HeadingPresence::Conditional(condition) => RawRequiredHeading::Detailed {
                name: heading.name,
                optional: true,
                condition: Some(condition.as_str().to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentTypeConfig {
    /// Alternate spellings that resolve to this type ("AC", "ADVISORY_CIRCULAR")
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub required_headings: Vec<RequiredHeading>,
    #[serde(default)]
    pub caption_scheme: CaptionScheme,
    /// Standard language specific to this type, merged with `required_language`
    #[serde(default)]
    pub required_language: Vec<String>,
    /// Final (non-draft) documents must not carry "proposed" wording
    #[serde(default = "default_true")]
    pub final_document: bool,
    /// Drafts of this type circulate with a stage watermark
    #[serde(default)]
    pub requires_watermark: bool,
    /// Types without a fixed heading set skip the required-headings check
    #[serde(default)]
    pub skip_title_check: bool,
}

/// A document type resolved against the corpus.
#[derive(Debug, Clone)]
pub struct ResolvedDocType {
    /// Canonical name as it appears in `document_types` (or "Other")
    pub name: String,
    /// The caller's original string
    pub requested: String,
    pub config: DocumentTypeConfig,
    pub recognized: bool,
    /// Whether headings require a trailing period (from `heading_periods`)
    pub heading_periods: Option<bool>,
    pub required_language: Vec<String>,
    /// Normalized review stage ("public_comment", "final_draft", ...), if one was requested
    pub stage: Option<String>,
}

impl ResolvedDocType {
    /// INFO marker reported when the requested type was not recognized
    pub fn marker(&self) -> Option<Finding> {
        if self.recognized {
            return None;
        }
        Some(
            Finding::info(
                Category::DocumentStatus,
                format!(
                    "Document type '{}' is not recognized. Checks ran with the '{}' rules.",
                    self.requested, OTHER_DOCUMENT_TYPE
                ),
            )
            .with_suggestion("Select one of the supported document types for type-specific checks."),
        )
    }

    /// Attach a review stage. Blank stages are ignored.
    pub fn at_stage(mut self, stage: Option<&str>) -> Self {
        self.stage = stage.map(normalize_stage).filter(|s| !s.is_empty());
        self
    }

    pub fn is_chaptered(&self) -> bool {
        self.config.caption_scheme == CaptionScheme::Chaptered
    }
}

/// Resolves document-type strings to configs, falling back to "Other".
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    /// normalized key -> canonical name
    keys: HashMap<String, String>,
    configs: IndexMap<String, DocumentTypeConfig>,
    default_config: DocumentTypeConfig,
}

impl ConfigManager {
    pub fn new(document_types: &IndexMap<String, DocumentTypeConfig>) -> Self {
        let mut manager = Self {
            keys: HashMap::new(),
            configs: IndexMap::new(),
            default_config: document_types
                .get(OTHER_DOCUMENT_TYPE)
                .cloned()
                .unwrap_or_default(),
        };

        for (name, config) in document_types {
            manager.keys.insert(normalize_document_type(name), name.clone());
            for alias in &config.aliases {
                manager
                    .keys
                    .insert(normalize_document_type(alias), name.clone());
            }
            manager.configs.insert(name.clone(), config.clone());
        }

        manager
    }

    /// Canonical name for a requested type, if recognized
    pub fn canonical_name(&self, doc_type: &str) -> Option<&str> {
        self.keys
            .get(&normalize_document_type(doc_type))
            .map(String::as_str)
    }

    pub fn get_config(&self, doc_type: &str) -> (&str, &DocumentTypeConfig, bool) {
        match self.canonical_name(doc_type) {
            Some(name) if name != OTHER_DOCUMENT_TYPE => {
                let config = self.configs.get(name).unwrap_or(&self.default_config);
                (name, config, true)
            }
            Some(name) => (name, &self.default_config, true),
            None => (OTHER_DOCUMENT_TYPE, &self.default_config, false),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }
}

impl TerminologyData {
    /// Resolve a document-type string. Never fails: unknown types get the
    /// "Other" config and a marker (see [`ResolvedDocType::marker`]).
    pub fn get_document_type_config(&self, doc_type: &str) -> ResolvedDocType {
        let (name, config, recognized) = self.compiled.document_types.get_config(doc_type);
        if !recognized {
            warn!(
                requested = doc_type,
                "unrecognized document type, falling back to '{}'", OTHER_DOCUMENT_TYPE
            );
        }

        let mut required_language = self
            .required_language
            .get(name)
            .cloned()
            .unwrap_or_default();
        required_language.extend(config.required_language.iter().cloned());

        ResolvedDocType {
            name: name.to_string(),
            requested: doc_type.to_string(),
            config: config.clone(),
            recognized,
            heading_periods: self.heading_periods.get(name).copied(),
            required_language,
            stage: None,
        }
    }

    /// Watermark text expected at a (normalized) review stage
    pub fn watermark_for_stage(&self, stage: &str) -> Option<&str> {
        self.watermarks
            .iter()
            .find(|(key, _)| normalize_stage(key) == stage)
            .map(|(_, text)| text.as_str())
    }

    pub fn pattern_rules(&self) -> &[CompiledPatternRule] {
        &self.compiled.pattern_rules
    }

    pub fn acronym_ignore_patterns(&self) -> &[Regex] {
        &self.compiled.acronym_ignore
    }

    pub fn document_type_names(&self) -> Vec<String> {
        self.compiled
            .document_types
            .names()
            .map(str::to_string)
            .collect()
    }

    /// Expansion of an acronym, checking standard entries before custom ones
    pub fn get_acronym(&self, acronym: &str) -> Option<&str> {
        self.acronyms
            .standard
            .get(acronym)
            .or_else(|| self.acronyms.custom.get(acronym))
            .map(String::as_str)
    }

    pub fn is_standard_acronym(&self, acronym: &str) -> bool {
        self.acronyms.standard.contains_key(acronym)
    }

    pub fn all_acronyms(&self) -> BTreeMap<String, String> {
        let mut all = self.acronyms.custom.clone();
        all.extend(
            self.acronyms
                .standard
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        all
    }

    /// Upper-cased valid words, heading words and acronym exemptions
    pub fn is_valid_word(&self, word: &str) -> bool {
        let upper = word.to_uppercase();
        self.valid_words
            .standard
            .iter()
            .chain(self.valid_words.custom.iter())
            .chain(self.heading_words.iter())
            .chain(self.acronym_rules.exempt.iter())
            .any(|w| w.to_uppercase() == upper)
    }
}

// ===== ENGINE SETTINGS (YAML) =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Checkers to enable or disable by name; unlisted checkers run
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub render: RenderConfig,
    /// Collect and print per-checker timings
    #[serde(default)]
    pub profile: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub checks: Vec<CheckConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Name of the checker, e.g. "check_spacing"
    pub name: String,
    /// Whether this checker is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub group_by: GroupBy,
    #[serde(default)]
    pub visibility: VisibilitySettings,
}

impl PipelineConfig {
    pub fn is_enabled(&self, check_name: &str) -> bool {
        self.checks
            .iter()
            .find(|c| c.name == check_name)
            .map(|c| c.enabled)
            .unwrap_or(true)
    }
}

impl EngineConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                warn!("failed to load engine config from {p}: {e}, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn builtin() -> Self {
        serde_yaml::from_str(BUILTIN_ENGINE_CONFIG).unwrap_or_default()
    }
}

pub const BUILTIN_ENGINE_CONFIG: &str = include_str!("../config/engine.yaml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_heading_accepts_string_and_record() {
        let headings: Vec<RequiredHeading> = serde_json::from_str(
            r#"["PURPOSE.", {"name": "CANCELLATION.", "optional": true, "condition": "if_cancels_previous"}, {"name": "APPENDIX.", "optional": true}]"#,
        )
        .unwrap();

        assert_eq!(headings[0].presence, HeadingPresence::Required);
        assert_eq!(
            headings[1].presence,
            HeadingPresence::Conditional(HeadingCondition::IfCancelsPrevious)
        );
        assert_eq!(headings[2].presence, HeadingPresence::Optional);
    }

    #[test]
    fn test_replacement_strategy_resolution() {
        let rule: PatternRule = serde_json::from_str(
            r#"{"pattern": "\\b(we|us)\\b", "description": "pronoun", "is_error": true,
                "replacements": {"We": "The FAA", "us": "the FAA"}}"#,
        )
        .unwrap();
        assert_eq!(rule.action(), RuleAction::Flag);
        let strategy = rule.strategy();
        assert_eq!(strategy.resolve("we"), Some("The FAA".to_string()));
        assert_eq!(strategy.resolve("US"), Some("the FAA".to_string()));
        assert_eq!(strategy.resolve("our"), None);
    }

    #[test]
    fn test_non_error_rule_without_replacement_is_allow_list() {
        let rule: PatternRule = serde_json::from_str(
            r#"{"pattern": "U\\.S\\.C\\.", "description": "correct citation", "is_error": false}"#,
        )
        .unwrap();
        assert_eq!(rule.action(), RuleAction::Allow);
    }

    #[test]
    fn test_stage_is_normalized() {
        assert_eq!(normalize_stage("Public Comment"), "public_comment");
        assert_eq!(normalize_stage(" agc-final-review "), "agc_final_review");

        let resolved = ResolvedDocType {
            name: "Order".to_string(),
            requested: "Order".to_string(),
            config: DocumentTypeConfig::default(),
            recognized: true,
            heading_periods: None,
            required_language: Vec::new(),
            stage: None,
        };
        assert_eq!(
            resolved.clone().at_stage(Some("Final Draft")).stage.as_deref(),
            Some("final_draft")
        );
        assert_eq!(resolved.at_stage(Some("  ")).stage, None);
    }

    #[test]
    fn test_pipeline_enables_unlisted_checks() {
        let config: EngineConfig = serde_yaml::from_str(
            "pipeline:\n  checks:\n    - name: check_spacing\n      enabled: false\n",
        )
        .unwrap();
        assert!(!config.pipeline.is_enabled("check_spacing"));
        assert!(config.pipeline.is_enabled("check_date_formats"));
    }

    #[test]
    fn test_builtin_engine_config_parses() {
        let parsed: EngineConfig = serde_yaml::from_str(BUILTIN_ENGINE_CONFIG).unwrap();
        assert_eq!(parsed.render.group_by, GroupBy::Category);
    }

    #[test]
    fn test_load_with_fallback_uses_defaults_for_missing_file() {
        let config = EngineConfig::load_with_fallback(Some("/nonexistent/engine.yaml"));
        assert!(!config.profile);
        assert!(config.pipeline.checks.is_empty());
    }
}
