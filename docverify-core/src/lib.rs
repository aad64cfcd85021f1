// DocVerify Core Library
//
// Style and compliance check engine for parsed Word documents.
// Main interface for running the registered checkers and rendering results.

pub mod types;
pub mod error;
pub mod config;
pub mod terminology;
pub mod text_utils;
pub mod checks;
pub mod formatter;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{CheckerExecutionError, ConfigError, RegistrationError};
pub use config::{DocumentTypeConfig, EngineConfig, ResolvedDocType, TerminologyData};
pub use terminology::{load_terminology, TerminologyStore};
pub use checks::{default_registry, discover, CheckRegistry, Checker, CheckerRef, ValidationReport};
pub use formatter::{aggregate, render_html, GroupBy, VisibilitySettings};
pub use processor::{run_all_document_checks, DocumentChecker, StepProfiler};
