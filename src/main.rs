use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gcpflow::{
    get_all_endpoint_keys, get_endpoint, get_service_endpoint_keys, AppConfig, BlockEvent, Invoker,
};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Workflow-automation blocks for Google Cloud REST APIs
#[derive(Parser, Debug)]
#[command(name = "gcpflow", version = gcpflow::VERSION, about, long_about = None)]
struct Args {
    /// GCP project to use (overrides config and environment)
    #[arg(short, long)]
    project: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered blocks
    List {
        /// Only show blocks for one service (compute, container, run, cloudbuild)
        #[arg(short, long)]
        service: Option<String>,
    },
    /// Show a block's method, path template, scopes, and fields
    Describe {
        /// Block key, e.g. compute.firewalls.get
        block: String,
    },
    /// Invoke a block and print the emitted event
    Invoke {
        /// Block key, e.g. compute.firewalls.get
        block: String,
        /// Invocation input as a JSON object
        #[arg(short, long, default_value = "{}")]
        input: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return None;
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcpflow started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcpflow").join("gcpflow.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcpflow").join("gcpflow.log");
    }
    PathBuf::from("gcpflow.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = AppConfig::load();
    if let Some(project) = args.project {
        config.project_id = Some(project);
    }

    match args.command {
        Command::List { service } => list_blocks(service.as_deref()),
        Command::Describe { block } => describe_block(&block),
        Command::Invoke { block, input } => invoke_block(config, &block, &input).await,
    }
}

fn list_blocks(service: Option<&str>) -> Result<()> {
    let keys = match service {
        Some(service) => get_service_endpoint_keys(service),
        None => get_all_endpoint_keys(),
    };

    if keys.is_empty() {
        anyhow::bail!("No blocks registered for that service");
    }

    for key in keys {
        let endpoint = get_endpoint(key).expect("key from registry listing");
        println!("{:<45} {}", key, endpoint.display_name);
    }

    Ok(())
}

fn describe_block(key: &str) -> Result<()> {
    let endpoint = get_endpoint(key)
        .with_context(|| format!("Unknown block: {}", key))?;

    println!("{} ({})", key, endpoint.display_name);
    println!("  {} {}/{}", endpoint.http_method, endpoint.base_url, endpoint.path);
    println!("  scopes:");
    for scope in &endpoint.scopes {
        println!("    {}", scope);
    }
    if !endpoint.fields.is_empty() {
        println!("  fields:");
        for field in &endpoint.fields {
            let required = if field.required { " (required)" } else { "" };
            let description = field
                .description
                .as_deref()
                .map(|d| format!(" - {}", d))
                .unwrap_or_default();
            println!("    {}: {}{}{}", field.name, field.field_type, required, description);
        }
    }

    Ok(())
}

async fn invoke_block(config: AppConfig, key: &str, input: &str) -> Result<()> {
    let input: serde_json::Value =
        serde_json::from_str(input).context("--input must be a JSON object")?;

    let (sink, mut events) = tokio::sync::mpsc::unbounded_channel::<BlockEvent>();
    let invoker = Invoker::new(config)?.with_event_sink(sink);

    invoker
        .invoke(key, &input)
        .await
        .with_context(|| format!("Invocation of {} failed", key))?;

    // One event per successful invocation
    let event = events.recv().await.expect("successful invocation emits an event");
    println!("{}", serde_json::to_string_pretty(&event)?);

    Ok(())
}
