use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};

use claimdoc::auth::CredentialSource;
use claimdoc::logging::{LogLevel, init_logging, init_logging_with_filter};
use claimdoc::{
    BatchOptions, ClaimDocError, Config, DocumentClassifier, DocumentOutcome, Task, TaskOutput,
    Variant, VertexClient, read_file_list, run_batch,
};

const SEPARATOR: &str = "=============================================================";

/// Classify (or extract information from) medical-claim documents with Gemini on Vertex AI
#[derive(Parser, Debug)]
#[command(name = "claimdoc", version, about)]
struct Cli {
    /// Comma-separated list of document names
    #[arg(long, default_value = "file_list.txt")]
    file_list: PathBuf,

    /// Send local files inline, or reference files under FILES_URL
    #[arg(long, value_enum, default_value_t = VariantArg::Inline)]
    variant: VariantArg,

    /// Classify document type, or extract claim details as text
    #[arg(long, value_enum, default_value_t = ModeArg::Classify)]
    mode: ModeArg,

    /// Local document directory (inline variant); overrides DOCS_PATH
    #[arg(long)]
    docs_path: Option<PathBuf>,

    /// MIME type for every document instead of guessing from the extension
    #[arg(long)]
    mime_type: Option<String>,

    /// Model id; overrides MODEL_ID
    #[arg(long)]
    model: Option<String>,

    /// Vertex AI location; overrides LOCATION
    #[arg(long)]
    location: Option<String>,

    /// Where bearer tokens come from
    #[arg(long, value_enum, default_value_t = CredentialsArg::Auto)]
    credentials: CredentialsArg,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Documents processed at once; output order always follows the file list
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,

    /// Stop at the first failed document
    #[arg(long)]
    fail_fast: bool,

    /// Save each raw response envelope as JSON in this directory
    #[arg(long)]
    save_responses: Option<PathBuf>,

    /// Do not print the prompt before processing
    #[arg(long)]
    quiet_prompt: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Explicit tracing filter, e.g. "claimdoc=debug"
    #[arg(long)]
    log_filter: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Inline,
    Storage,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Classify,
    Extract,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CredentialsArg {
    /// GOOGLE_OAUTH_ACCESS_TOKEN, else Application Default Credentials
    Auto,
    /// `gcloud auth print-access-token`
    Gcloud,
    /// Compute Engine / Cloud Run metadata server
    Metadata,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Inline => Variant::Inline,
            VariantArg::Storage => Variant::Storage,
        }
    }
}

impl From<ModeArg> for Task {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Classify => Task::Classify,
            ModeArg::Extract => Task::Extract,
        }
    }
}

impl From<CredentialsArg> for CredentialSource {
    fn from(arg: CredentialsArg) -> Self {
        match arg {
            CredentialsArg::Auto => CredentialSource::Auto,
            CredentialsArg::Gcloud => CredentialSource::Gcloud,
            CredentialsArg::Metadata => CredentialSource::Metadata,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match &cli.log_filter {
        Some(filter) => init_logging_with_filter(filter),
        None => init_logging(LogLevel::from_verbosity(cli.verbose)),
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            match e.downcast_ref::<ClaimDocError>() {
                Some(ClaimDocError::ConfigurationMissing { .. }) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    let mut config = Config::from_env(cli.variant.into())?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(location) = cli.location {
        config = config.with_location(location);
    }
    if let Some(docs_path) = cli.docs_path {
        config = config.with_docs_path(docs_path);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    println!("configurations initialized");

    let tokens = CredentialSource::from(cli.credentials).into_provider();
    let client = VertexClient::new(config, tokens)?;

    let task = Task::from(cli.mode);
    let mut classifier = DocumentClassifier::new(client).task(task);
    if let Some(mime_type) = cli.mime_type {
        classifier = classifier.mime_type(mime_type);
    }
    if let Some(dir) = cli.save_responses {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating response directory {}", dir.display()))?;
        classifier = classifier.save_responses(dir);
    }

    let names = read_file_list(&cli.file_list).await?;

    match task {
        Task::Classify => {
            println!("=========Check Document Type====================");
            if !cli.quiet_prompt {
                println!("This is the prompt used to check document type");
                println!("{}", task.prompt());
            }
        }
        Task::Extract => {
            println!("=========Extract Info====================");
            if !cli.quiet_prompt {
                println!("This is the prompt used to extract document info");
                println!("{}", task.prompt());
            }
        }
    }

    let options = BatchOptions {
        concurrency: usize::from(cli.concurrency),
        fail_fast: cli.fail_fast,
    };
    let summary = run_batch(&classifier, &names, options, |outcome| {
        print_outcome(task, outcome)
    }).await;

    if summary.stopped_early {
        println!(
            "Stopped after {} of {} documents",
            summary.outcomes.len(),
            names.len()
        );
    }
    if summary.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} of {} documents failed",
            summary.failed(),
            summary.outcomes.len()
        );
        Ok(ExitCode::FAILURE)
    }
}

fn print_outcome(task: Task, outcome: &DocumentOutcome) {
    println!("{}{}", SEPARATOR, outcome.file_name);
    println!("{}", task.progress_line(&outcome.file_name));
    match &outcome.result {
        Ok(TaskOutput::Classification { raw_text, result }) => {
            println!("{}", raw_text);
            println!("Output: ");
            println!("{} document type is: {}", outcome.file_name, result.doc_type);
        }
        Ok(TaskOutput::Extraction(extraction)) => {
            println!("Output: ");
            println!("{} Extracted Info:", outcome.file_name);
            println!("{}", extraction.text);
        }
        Err(e) => {
            println!("{} failed [{}]: {}", outcome.file_name, e.kind(), e);
        }
    }
}
