use crate::config::{
    CompiledPatternRule, CompiledRules, ConfigManager, ResolvedDocType, TerminologyData,
};
use crate::error::ConfigError;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info};

/// Default rule corpus shipped with the crate
pub const BUILTIN_TERMINOLOGY: &str = include_str!("../config/terminology.json");

/// Parse and validate a terminology corpus.
///
/// Fails with a [`ConfigError`] naming the first missing or malformed key.
/// Regex patterns are compiled here so a bad pattern never reaches a checker.
pub fn load_terminology(json: &str) -> Result<TerminologyData, ConfigError> {
    let value: Value = serde_json::from_str(json)?;
    validate_structure(&value)?;
    let mut data: TerminologyData = serde_path_to_error::deserialize(value).map_err(|e| {
        let key = match e.path().to_string() {
            path if path == "." => "<root>".to_string(),
            path => path,
        };
        ConfigError::InvalidValue {
            key,
            source: e.into_inner(),
        }
    })?;
    data.compile()?;
    Ok(data)
}

fn expect_object<'a>(
    parent: &'a serde_json::Map<String, Value>,
    key: &str,
    path: &str,
    required: bool,
) -> Result<Option<&'a serde_json::Map<String, Value>>, ConfigError> {
    match parent.get(key) {
        None if required => Err(ConfigError::missing(path)),
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ConfigError::malformed(path, "an object")),
    }
}

fn expect_array<'a>(
    parent: &'a serde_json::Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'a Vec<Value>>, ConfigError> {
    match parent.get(key) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(ConfigError::malformed(path, "a list")),
    }
}

fn validate_structure(value: &Value) -> Result<(), ConfigError> {
    let root = value
        .as_object()
        .ok_or_else(|| ConfigError::malformed("<root>", "a JSON object"))?;

    // acronyms
    if let Some(acronyms) = expect_object(root, "acronyms", "acronyms", true)? {
        expect_object(acronyms, "standard", "acronyms.standard", true)?;
        expect_object(acronyms, "custom", "acronyms.custom", false)?;
    }

    // patterns: group -> list of rule objects
    if let Some(patterns) = expect_object(root, "patterns", "patterns", true)? {
        for (group, rules) in patterns {
            let rules = rules
                .as_array()
                .ok_or_else(|| ConfigError::malformed(format!("patterns.{group}"), "a list"))?;
            for (i, rule) in rules.iter().enumerate() {
                let has_pattern = rule
                    .get("pattern")
                    .map(Value::is_string)
                    .unwrap_or(false);
                if !has_pattern {
                    return Err(ConfigError::malformed(
                        format!("patterns.{group}[{i}]"),
                        "an object with a 'pattern' string",
                    ));
                }
            }
        }
    }

    // document_types: name -> object
    if let Some(types) = expect_object(root, "document_types", "document_types", true)? {
        for (name, config) in types {
            if !config.is_object() {
                return Err(ConfigError::malformed(
                    format!("document_types.{name}"),
                    "an object",
                ));
            }
        }
    }

    // valid_words: { standard: [...], custom: [...] }, both lists optional
    if let Some(valid_words) = expect_object(root, "valid_words", "valid_words", true)? {
        expect_array(valid_words, "standard", "valid_words.standard")?;
        expect_array(valid_words, "custom", "valid_words.custom")?;
    }

    // Optional keys still have to be the right shape when present
    expect_array(root, "heading_words", "heading_words")?;
    expect_object(root, "heading_periods", "heading_periods", false)?;
    expect_object(root, "required_language", "required_language", false)?;
    expect_object(root, "acronym_rules", "acronym_rules", false)?;
    expect_object(root, "accessibility", "accessibility", false)?;
    expect_object(root, "readability", "readability", false)?;

    Ok(())
}

impl TerminologyData {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        load_terminology(json)
    }

    pub fn builtin() -> Result<Self, ConfigError> {
        load_terminology(BUILTIN_TERMINOLOGY)
    }

    pub(crate) fn compile(&mut self) -> Result<(), ConfigError> {
        let mut pattern_rules = Vec::new();
        for (group, rules) in &self.patterns {
            for (i, rule) in rules.iter().enumerate() {
                let regex = Regex::new(&rule.pattern).map_err(|e| {
                    ConfigError::malformed(
                        format!("patterns.{group}[{i}].pattern"),
                        format!("a valid regular expression ({e})"),
                    )
                })?;
                pattern_rules.push(CompiledPatternRule {
                    group: group.clone(),
                    regex,
                    description: rule.description.clone(),
                    action: rule.action(),
                    strategy: rule.strategy(),
                });
            }
        }

        let mut acronym_ignore = Vec::new();
        for (i, pattern) in self.acronym_rules.ignore_patterns.iter().enumerate() {
            let regex = Regex::new(pattern).map_err(|e| {
                ConfigError::malformed(
                    format!("acronym_rules.ignore_patterns[{i}]"),
                    format!("a valid regular expression ({e})"),
                )
            })?;
            acronym_ignore.push(regex);
        }

        debug!(
            pattern_rules = pattern_rules.len(),
            document_types = self.document_types.len(),
            "compiled terminology corpus"
        );

        self.compiled = CompiledRules {
            pattern_rules,
            acronym_ignore,
            document_types: ConfigManager::new(&self.document_types),
        };
        Ok(())
    }
}

/// Shared terminology corpus with a serialized mutation path.
///
/// Readers take cheap snapshots; `add_custom_acronym` and `save` hold the
/// write lock for their whole duration so concurrent writers never race on
/// the backing file.
pub struct TerminologyStore {
    path: Option<PathBuf>,
    data: RwLock<Arc<TerminologyData>>,
    write_lock: Mutex<()>,
}

impl TerminologyStore {
    pub fn new(data: TerminologyData, path: Option<PathBuf>) -> Self {
        Self {
            path,
            data: RwLock::new(Arc::new(data)),
            write_lock: Mutex::new(()),
        }
    }

    /// Load the corpus from a JSON file. The path is remembered for `save`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data = load_terminology(&json)?;
        info!(path = %path.display(), "loaded terminology corpus");
        Ok(Self::new(data, Some(path.to_path_buf())))
    }

    /// The embedded default corpus, with no backing file
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(Self::new(TerminologyData::builtin()?, None))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Immutable view used for a check run
    pub fn snapshot(&self) -> Arc<TerminologyData> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get_document_type_config(&self, doc_type: &str) -> ResolvedDocType {
        self.snapshot().get_document_type_config(doc_type)
    }

    /// Insert or overwrite a custom acronym. Keys are matched exactly (case-sensitive).
    /// The change is in memory until [`save`](Self::save) is called.
    pub fn add_custom_acronym(&self, acronym: &str, expansion: &str) -> Result<(), ConfigError> {
        let acronym = acronym.trim();
        if acronym.is_empty() || acronym.chars().any(char::is_whitespace) {
            return Err(ConfigError::malformed(
                "acronyms.custom",
                "a non-empty acronym without whitespace",
            ));
        }
        if expansion.trim().is_empty() {
            return Err(ConfigError::malformed(
                format!("acronyms.custom.{acronym}"),
                "a non-empty expansion",
            ));
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let mut updated = TerminologyData::clone(&data);
        updated
            .acronyms
            .custom
            .insert(acronym.to_string(), expansion.trim().to_string());
        *data = Arc::new(updated);
        debug!(acronym, "added custom acronym");
        Ok(())
    }

    /// Persist the corpus to the path it was loaded from
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| ConfigError::Persist {
                path: PathBuf::from("<builtin>"),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "store has no backing file",
                ),
            })?;
        self.save_to(&path)
    }

    /// Atomically write the corpus to `path`: write a sibling temp file, then rename over the target.
    /// On any failure the existing file is left untouched.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.snapshot();

        let persist_err = |source: std::io::Error| ConfigError::Persist {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_string_pretty(&*snapshot).map_err(ConfigError::Encode)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(persist_err)?;
        temp.write_all(json.as_bytes()).map_err(persist_err)?;
        temp.write_all(b"\n").map_err(persist_err)?;
        temp.as_file().sync_all().map_err(persist_err)?;
        temp.persist(path).map_err(|e| persist_err(e.error))?;

        info!(path = %path.display(), "saved terminology corpus");
        Ok(())
    }

    /// SHA-256 of the serialized corpus; changes whenever the corpus does
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(&*self.snapshot()).map_err(ConfigError::Encode)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}
