// All core functionality is in docverify-core
// This CLI acts as a thin wrapper around the core library

use anyhow::{bail, Context, Result};
use docverify_core::{DocumentModel, TerminologyStore};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// Re-export core types for convenience
pub use docverify_core::*;

/// Per-user terminology corpus, e.g. ~/.config/docverify/terminology.json
pub fn default_terminology_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docverify").join("terminology.json"))
}

/// Per-user engine settings, e.g. ~/.config/docverify/engine.yaml
pub fn default_engine_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docverify").join("engine.yaml"))
}

/// Read a parsed document (JSON) from disk
pub fn load_document(path: &Path) -> Result<DocumentModel> {
    if !path.exists() {
        bail!("Input document not found at: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing document JSON {}", path.display()))
}

/// Load the terminology store from an explicit path, the per-user corpus
/// if one exists, or the embedded corpus.
pub fn load_store(path: Option<&str>) -> Result<TerminologyStore> {
    if let Some(path) = path {
        debug!(path, "loading terminology from explicit path");
        return TerminologyStore::load(path)
            .with_context(|| format!("loading terminology from {path}"));
    }
    match default_terminology_path().filter(|p| p.exists()) {
        Some(path) => {
            debug!(path = %path.display(), "loading per-user terminology");
            TerminologyStore::load(&path)
                .with_context(|| format!("loading terminology from {}", path.display()))
        }
        None => {
            debug!("using embedded terminology");
            Ok(TerminologyStore::builtin()?)
        }
    }
}

/// Load a store that can be saved: the file at `path`, seeded from the
/// embedded corpus when it doesn't exist yet.
pub fn load_writable_store(path: &Path) -> Result<TerminologyStore> {
    if path.exists() {
        return TerminologyStore::load(path)
            .with_context(|| format!("loading terminology from {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    info!(path = %path.display(), "seeding new terminology corpus from embedded defaults");
    Ok(TerminologyStore::new(TerminologyData::builtin()?, Some(path.to_path_buf())))
}
