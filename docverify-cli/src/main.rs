use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use docverify::{
    default_engine_config_path, default_terminology_path, load_document, load_store, load_writable_store,
    render_html, Category, CheckResult, DocumentChecker, EngineConfig, GroupBy, StepProfiler, TerminologyData,
};

#[derive(Parser)]
#[command(name = "docverify")]
#[command(about = "Check parsed Word documents against a style and compliance rulebook")]
struct Args {
    /// Log debug output from the check engine
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every enabled check over a parsed document (JSON)
    Check {
        /// Path to the parsed document JSON
        input: String,

        /// Document type, e.g. "Advisory Circular", "Order", "AC"
        #[arg(short, long, default_value = "Other")]
        doc_type: String,

        /// Review stage of a draft, e.g. "public_comment" or "final_draft"
        #[arg(short, long)]
        stage: Option<String>,

        /// Terminology corpus (JSON). Defaults to the per-user corpus, then the embedded one
        #[arg(short, long)]
        terminology: Option<String>,

        /// Engine settings (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Group the report by category or severity
        #[arg(short, long)]
        group_by: Option<GroupBy>,

        /// Hide a category from the rendered report (repeatable)
        #[arg(long = "hide")]
        hide: Vec<Category>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,

        /// Output file path (if not specified, auto-generated based on input)
        #[arg(short, long)]
        output: Option<String>,

        /// Print per-check timings
        #[arg(long)]
        profile: bool,
    },

    /// Check that every implemented checker is registered and vice versa
    ValidateRegistry,

    /// Add or overwrite a custom acronym and save the terminology corpus
    AddAcronym {
        acronym: String,
        expansion: String,

        /// Corpus to update. Defaults to the per-user corpus
        #[arg(short, long)]
        terminology: Option<String>,
    },

    /// List registered checks by category
    ListChecks,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Html,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Check {
            input,
            doc_type,
            stage,
            terminology,
            config,
            group_by,
            hide,
            format,
            output,
            profile,
        } => run_check(CheckOptions {
            input,
            doc_type,
            stage,
            terminology,
            config,
            group_by,
            hide,
            format,
            output,
            profile,
        }),
        Command::ValidateRegistry => validate_registry(),
        Command::AddAcronym {
            acronym,
            expansion,
            terminology,
        } => add_acronym(&acronym, &expansion, terminology.as_deref()),
        Command::ListChecks => {
            list_checks();
            Ok(())
        }
    }
}

struct CheckOptions {
    input: String,
    doc_type: String,
    stage: Option<String>,
    terminology: Option<String>,
    config: Option<String>,
    group_by: Option<GroupBy>,
    hide: Vec<Category>,
    format: OutputFormat,
    output: Option<String>,
    profile: bool,
}

fn load_engine_config(path: Option<&str>) -> EngineConfig {
    if let Some(path) = path {
        println!("📋 Loaded config from: {}", path);
        return EngineConfig::load_with_fallback(Some(path));
    }
    match default_engine_config_path().filter(|p| p.exists()) {
        Some(path) => {
            println!("📋 Loaded config from: {}", path.display());
            EngineConfig::load_with_fallback(path.to_str())
        }
        None => {
            println!("📋 Using default config");
            EngineConfig::builtin()
        }
    }
}

fn run_check(options: CheckOptions) -> Result<()> {
    println!("🦀 DocVerify Document Checker");

    let document = match load_document(Path::new(&options.input)) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("❌ {e:#}");
            eprintln!("   Please check the file path.");
            std::process::exit(1);
        }
    };

    let store = match load_store(options.terminology.as_deref()) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Terminology configuration is invalid: {e:#}");
            std::process::exit(1);
        }
    };

    let mut engine_config = load_engine_config(options.config.as_deref());
    if options.profile {
        engine_config.profile = true;
    }
    let group_by = options.group_by.unwrap_or(engine_config.render.group_by);
    let mut visibility = engine_config.render.visibility.clone();
    for category in &options.hide {
        visibility.hide(*category);
    }

    match options.stage.as_deref() {
        Some(stage) => println!(
            "📄 Checking: {} as '{}' at stage '{stage}'",
            options.input, options.doc_type
        ),
        None => println!("📄 Checking: {} as '{}'", options.input, options.doc_type),
    }
    let profile = engine_config.profile;
    let checker = DocumentChecker::new(store.into(), engine_config);

    let mut profiler = StepProfiler::new(profile);
    let result = checker.run_all_document_checks_with_profiler(
        &document,
        &options.doc_type,
        options.stage.as_deref(),
        &mut profiler,
    );
    profiler.print_summary();

    print_summary(&result);

    let output_path = options.output.clone().unwrap_or_else(|| {
        let input_name = Path::new(&options.input)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let extension = match options.format {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        };
        format!("{input_name}_docverify.{extension}")
    });

    let rendered = match options.format {
        OutputFormat::Html => render_html(&result, group_by, &visibility),
        OutputFormat::Json => result.to_json()?,
    };
    std::fs::write(&output_path, rendered).with_context(|| format!("writing {output_path}"))?;
    println!("💾 Report saved to: {}", output_path);

    Ok(())
}

fn print_summary(result: &CheckResult) {
    let summary = result.summary();
    if result.has_errors {
        println!("❌ Document has errors");
    } else {
        println!("✅ No errors found");
    }
    println!("📊 Findings:");
    println!("   - Errors: {}", summary.errors);
    println!("   - Warnings: {}", summary.warnings);
    println!("   - Info: {}", summary.info);
    for (category, findings) in &result.by_category {
        println!("   {:.<25} {}", category.display_name(), findings.len());
    }
}

fn validate_registry() -> Result<()> {
    let registry = docverify::default_registry();
    let report = registry.validate();

    if report.is_clean() {
        println!("✅ Registry is consistent: {} checks registered", registry.len());
        return Ok(());
    }

    for error in report.errors() {
        eprintln!("❌ {error}");
    }
    std::process::exit(1);
}

fn add_acronym(acronym: &str, expansion: &str, terminology: Option<&str>) -> Result<()> {
    let path = match terminology {
        Some(path) => PathBuf::from(path),
        None => default_terminology_path().context("no config directory available; pass --terminology")?,
    };

    let store = load_writable_store(&path)?;
    let snapshot = store.snapshot();
    if snapshot.is_standard_acronym(acronym) {
        println!("⚠️  {acronym} is a standard acronym; its standard expansion still takes precedence");
    } else if let Some(existing) = snapshot.get_acronym(acronym) {
        println!("⚠️  Replacing existing expansion for {acronym}: {existing}");
    }
    store.add_custom_acronym(acronym, expansion)?;
    store.save()?;

    println!("✅ Added {acronym} ({expansion})");
    println!("💾 Saved terminology to: {}", path.display());
    Ok(())
}

fn list_checks() {
    let registry = docverify::default_registry();
    println!("\n📋 Registered checks:");
    for (category, names) in registry.get_category_mappings() {
        println!("\n{} ({}):", category.display_name(), category.as_str());
        for name in names {
            println!("  {name}");
        }
    }
    println!("\n{} checks in {} categories", registry.len(), registry.categories().len());

    match TerminologyData::builtin() {
        Ok(terminology) => {
            println!("\n📄 Document types:");
            for name in terminology.document_type_names() {
                println!("  {name}");
            }
            println!("\n🏷️  Review stages:");
            for (stage, watermark) in &terminology.watermarks {
                println!("  {stage} ({watermark})");
            }
        }
        Err(e) => eprintln!("⚠️  Embedded terminology is invalid: {e}"),
    }
}
