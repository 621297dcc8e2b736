//! sisloc CLI - localize language branches of kiosk workflows and registration experiences

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use sisloc::client::{ApiClient, DocumentStore, FileStore};
use sisloc::config::{redact, Config, Overrides};
use sisloc::document::Document;
use sisloc::error::{FixSuggestion, SislocError};
use sisloc::limits::RateLimiter;
use sisloc::locate::{language_page, locate};
use sisloc::pipeline::{run, RunOptions};
use sisloc::schema::SchemaKind;
use sisloc::translate::{create_translator, TranslationService};
use sisloc::validate::validate;

#[derive(Parser)]
#[command(name = "sisloc")]
#[command(about = "Mirror the template language branch into every wired language")]
#[command(version)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize language branches (dry run unless --write)
    Sync(SyncArgs),

    /// Check a document file without changing it
    Validate {
        /// Path to a JSON document
        #[arg(short, long)]
        file: PathBuf,

        /// kiosk | registration
        #[arg(short, long)]
        experience: Option<SchemaKind>,
    },

    /// Print a sample document usable with `sync --file`
    Sample {
        /// kiosk | registration
        #[arg(short, long)]
        experience: Option<SchemaKind>,
    },
}

#[derive(Args)]
struct SyncArgs {
    /// kiosk | registration
    #[arg(short, long)]
    experience: Option<SchemaKind>,

    /// Workflow / registration experience id
    #[arg(long)]
    id: Option<String>,

    /// Read the document from a file instead of the API
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Write to this file instead of back to --file
    #[arg(short, long, requires = "file")]
    output: Option<PathBuf>,

    /// API token
    #[arg(long)]
    token: Option<String>,

    /// Label of the template language choice
    #[arg(long)]
    source_label: Option<String>,

    /// Label→code overrides: JSON object or `Spanish:es,French:fr`
    #[arg(long)]
    language_map: Option<String>,

    /// mock | deepl | google | libretranslate
    #[arg(short, long)]
    translator: Option<String>,

    #[arg(long)]
    translator_api_key: Option<String>,

    #[arg(long)]
    translator_endpoint: Option<String>,

    /// Translator requests per second
    #[arg(long)]
    rate_limit: Option<f64>,

    /// Persist the result (default is a dry run)
    #[arg(long)]
    write: bool,
}

impl SyncArgs {
    fn overrides(&self, log_level: Option<String>) -> Overrides {
        Overrides {
            experience: self.experience,
            resource_id: self.id.clone(),
            api_token: self.token.clone(),
            source_label: self.source_label.clone(),
            language_map: self.language_map.clone(),
            translator: self.translator.clone(),
            translator_api_key: self.translator_api_key.clone(),
            translator_endpoint: self.translator_endpoint.clone(),
            rate_limit_qps: self.rate_limit,
            write: self.write,
            log_level,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("SIS_LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Sync(args) => sync_command(args, cli.log_level).await,
        Commands::Validate { file, experience } => validate_command(&file, experience).await,
        Commands::Sample { experience } => sample_command(experience),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn sync_command(args: SyncArgs, log_level: Option<String>) -> Result<(), SislocError> {
    let config = Config::from_env()?.apply(args.overrides(log_level))?;
    config.validate(args.file.is_none())?;

    let translator = create_translator(
        &config.translator,
        config.translator_api_key.as_deref(),
        config.translator_endpoint.as_deref(),
    )?;
    let limiter = Arc::new(RateLimiter::per_second(config.rate_limit_qps));
    let service = TranslationService::new(translator, limiter);

    let store: Box<dyn DocumentStore> = match &args.file {
        Some(path) => {
            let mut store = FileStore::new(path);
            if let Some(output) = &args.output {
                store = store.with_output(output);
            }
            Box::new(store)
        }
        None => Box::new(ApiClient::new(
            &config.api_base_url,
            config.api_token.clone().unwrap_or_default(),
        )?),
    };
    let id = config.resource_id.clone().unwrap_or_default();

    println!(
        "{} {} {} | translator: {} | source: {}",
        "→".cyan(),
        config.experience.name().cyan().bold(),
        if id.is_empty() { store.describe() } else { redact(&id) },
        service.translator_name().cyan(),
        config.source_label
    );

    let options = RunOptions {
        schema: config.experience,
        source_label: config.source_label.clone(),
        language_map: config.language_map.clone(),
        dry_run: config.dry_run,
    };
    let outcome = run(store.as_ref(), &id, &service, &options).await?;

    print!("{}", outcome.report.render(config.dry_run));
    if !outcome.report.has_changes() {
        println!("{} Every language branch is already in sync", "✓".green());
    }
    if outcome.persisted {
        println!("{} Persisted ({} nodes added)", "✓".green(), outcome.diff.added.len());
    }
    Ok(())
}

async fn validate_command(file: &Path, experience: Option<SchemaKind>) -> Result<(), SislocError> {
    let schema = match experience {
        Some(kind) => kind,
        None => Config::from_env()?.experience,
    };
    let text = tokio::fs::read_to_string(file).await?;
    let document = Document::parse(&text, schema)?;
    let graph = document.graph()?;

    let page = language_page(locate(&graph, schema)?, schema)?;
    println!("{} Document '{}' parsed ({} nodes)", "✓".green(), file.display(), graph.len());
    println!("  Language page: {}", page.node_id);
    for choice in &page.choices {
        let target = choice.target.as_deref().unwrap_or("(unwired)");
        println!("  - {} → {}", choice.label, target);
    }

    let issues = validate(&graph);
    for issue in &issues {
        println!("  {}", issue);
    }
    let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
    match errors.first() {
        Some(first) => Err(SislocError::ValidationFailed {
            count: errors.len(),
            first: first.message.clone(),
        }),
        None => Ok(()),
    }
}

fn sample_command(experience: Option<SchemaKind>) -> Result<(), SislocError> {
    let document = Document::sample(experience.unwrap_or_default());
    println!("{}", serde_json::to_string_pretty(&document.to_value())?);
    Ok(())
}
