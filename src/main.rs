use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gcp_plane::collection::{CollectionError, DeleteOutcome, ParentRef};
use gcp_plane::config::Config;
use gcp_plane::gcp::auth::GcpCredentials;
use gcp_plane::gcp::client::GcpClient;
use gcp_plane::gcp::http::format_api_error;
use gcp_plane::resource::{
    get_all_collection_keys, get_all_resource_keys, get_collection, get_resource,
    EmbeddedResource, JsonResourceData,
};
use gcp_plane::version::{FeatureSet, ResolveMode};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Control-plane helpers for GCP resources
#[derive(Parser, Debug)]
#[command(name = "gcp-plane", version, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// GCP region to use
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// OAuth access token (defaults to GOOGLE_OAUTH_ACCESS_TOKEN, then ADC)
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the API version a resource configuration needs
    Resolve {
        /// Resource or collection key, e.g. compute-instance
        resource: String,
        /// Declared configuration (JSON or YAML)
        #[arg(long)]
        config: PathBuf,
        /// Previously persisted state (JSON or YAML)
        #[arg(long)]
        prior: Option<PathBuf>,
        /// Resolve for an update instead of a create
        #[arg(long)]
        update: bool,
    },
    /// Manage one element of an embedded collection
    Item {
        /// Collection key, e.g. compute-router-nat
        collection: String,
        #[arg(value_enum)]
        verb: Verb,
        /// Parent object name
        #[arg(long)]
        parent: String,
        /// Natural key of the element
        #[arg(long)]
        key: String,
        /// Region or zone of the parent (defaults to the region, or `global`)
        #[arg(long)]
        location: Option<String>,
        /// Element fields (JSON or YAML)
        #[arg(long)]
        payload: Option<PathBuf>,
        /// Element as last persisted, for update (JSON or YAML)
        #[arg(long)]
        prior: Option<PathBuf>,
    },
    /// List known resources and collections
    List,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Verb {
    Get,
    Create,
    Update,
    Delete,
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

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // RUST_LOG narrows further, e.g. `gcp_plane::collection=trace`
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcp-plane started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcp-plane").join("gcp-plane.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcp-plane").join("gcp-plane.log");
    }
    PathBuf::from("gcp-plane.log")
}

/// Read a JSON or YAML document, picked by extension
fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
    }
}

fn load_object(path: Option<&Path>) -> Result<Map<String, Value>> {
    let Some(path) = path else {
        return Ok(Map::new());
    };
    match load_document(path)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => bail!("{} must contain an object", path.display()),
    }
}

fn feature_set_for(key: &str) -> Result<FeatureSet> {
    if let Some(def) = get_resource(key) {
        return Ok(def.feature_set()?);
    }
    if let Some(def) = get_collection(key) {
        return Ok(def.feature_set()?);
    }
    bail!(
        "Unknown resource {:?}; known: {}",
        key,
        [get_all_resource_keys(), get_all_collection_keys()]
            .concat()
            .join(", ")
    )
}

fn run_resolve(resource: &str, config: &Path, prior: Option<&Path>, update: bool) -> Result<()> {
    let features = feature_set_for(resource)?;
    let declared = load_document(config)?;
    let data = match prior {
        Some(path) => JsonResourceData::with_state(declared, load_document(path)?),
        None => JsonResourceData::new(declared),
    };
    let mode = if update {
        ResolveMode::AtUpdate
    } else {
        ResolveMode::AtCreate
    };

    for feature in features.active_features(&data, mode) {
        eprintln!("{} needs {}", feature.field_path, feature.version);
    }
    println!("{}", features.resolve(&data, mode));
    Ok(())
}

async fn connect(args: &Args, config: &Config) -> Result<GcpClient> {
    let Some(project) = config.effective_project(args.project.as_deref()) else {
        bail!("No project configured; pass --project or set CLOUDSDK_CORE_PROJECT");
    };
    let region = config.effective_region(args.region.as_deref());

    let credentials = GcpCredentials::resolve(args.access_token.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(format_api_error(&e)))?;
    let mut client = GcpClient::with_credentials(credentials, &project, &region)?;
    if let Some(endpoint) = &config.compute_endpoint {
        client = client.with_compute_endpoint(endpoint);
    }
    Ok(client)
}

#[allow(clippy::too_many_arguments)]
async fn run_item(
    client: &GcpClient,
    config: &Config,
    collection: &str,
    verb: Verb,
    parent: &str,
    key: &str,
    location: Option<&str>,
    payload: Option<&Path>,
    prior: Option<&Path>,
) -> Result<()> {
    let Some(def) = get_collection(collection) else {
        bail!(
            "Unknown collection {:?}; known: {}",
            collection,
            get_all_collection_keys().join(", ")
        );
    };

    let location = match location {
        Some(location) => location.to_string(),
        None if def.collection.parent_path.contains("{location}") => client.region.clone(),
        None => "global".to_string(),
    };
    let parent = ParentRef::new(location, parent);
    let payload = load_object(payload)?;

    let waiter = config.operation_waiter();
    let item = EmbeddedResource::new(client, &waiter, def)?;
    let data = JsonResourceData::new(Value::Object(payload.clone()));

    let result = match verb {
        Verb::Get => item
            .read(&parent, key, &data)
            .await
            .map(|found| found.unwrap_or(Value::Null)),
        Verb::Create => item.create(&parent, key, payload).await,
        Verb::Update => {
            let prior = prior.map(load_document).transpose()?;
            item.update(&parent, key, payload, prior.as_ref()).await
        }
        Verb::Delete => item.delete(&parent, key, &data).await.map(|outcome| match outcome {
            DeleteOutcome::Removed => Value::String("deleted".to_string()),
            DeleteOutcome::AlreadyAbsent => Value::String("already absent".to_string()),
        }),
    };

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(CollectionError::Request { activity, source }) => {
            bail!("Error {}: {}", activity, format_api_error(&source))
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;
    let config = Config::load()?;

    match &args.command {
        Command::Resolve {
            resource,
            config: config_path,
            prior,
            update,
        } => run_resolve(resource, config_path, prior.as_deref(), *update),
        Command::Item {
            collection,
            verb,
            parent,
            key,
            location,
            payload,
            prior,
        } => {
            let client = connect(&args, &config).await?;
            run_item(
                &client,
                &config,
                collection,
                *verb,
                parent,
                key,
                location.as_deref(),
                payload.as_deref(),
                prior.as_deref(),
            )
            .await
        }
        Command::List => {
            for key in get_all_resource_keys() {
                println!("resource    {key}");
            }
            for key in get_all_collection_keys() {
                println!("collection  {key}");
            }
            Ok(())
        }
    }
}
