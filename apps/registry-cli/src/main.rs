//! One-shot lifecycle commands against the model registry.
//!
//! `register` logs both local artifacts under a run and registers them,
//! `status` prints the versions of the named entries, and `delete`
//! removes every version and then the entry itself, verifying afterwards.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tabgate::ArtifactModel;
use tabgate::loader::{CLASSIFICATION_ARTIFACT, CLUSTERING_ARTIFACT};
use tabgate_registry::{
    RegistryClient, get_or_create_experiment, log_model, purge_model, verify_deleted,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CLASSIFICATION_NAME: &str = "Tabgate_Classification_Model";
const DEFAULT_CLUSTERING_NAME: &str = "Tabgate_Clustering_Model";

#[derive(Debug, Parser)]
#[command(name = "tabgate-registry", version, about = "Model registry lifecycle commands")]
struct Cli {
    /// Tracking server URI; falls back to the MLFLOW_TRACKING_URI env var
    #[arg(long)]
    tracking_uri: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log the local artifacts under a run and register them
    Register(RegisterArgs),
    /// Print versions, stages and statuses of the named entries
    Status(StatusArgs),
    /// Delete every version of each named entry, then the entry itself
    Delete(DeleteArgs),
}

#[derive(Debug, Parser)]
struct RegisterArgs {
    /// Directory holding the artifact files
    #[arg(long, default_value = "model")]
    model_dir: PathBuf,
    /// Experiment the registration run is logged under
    #[arg(long, default_value = "Tabgate_Model_Registration")]
    experiment: String,
    #[arg(long, default_value = "Initial_Registration")]
    run_name: String,
    #[arg(long, default_value = DEFAULT_CLASSIFICATION_NAME)]
    classification_name: String,
    #[arg(long, default_value = DEFAULT_CLUSTERING_NAME)]
    clustering_name: String,
}

#[derive(Debug, Parser)]
struct StatusArgs {
    /// Model names to inspect; repeatable
    #[arg(long = "model")]
    models: Vec<String>,
}

#[derive(Debug, Parser)]
struct DeleteArgs {
    /// Model names to delete; repeatable
    #[arg(long = "model")]
    models: Vec<String>,
}

fn default_model_names() -> Vec<String> {
    vec![
        DEFAULT_CLASSIFICATION_NAME.to_string(),
        DEFAULT_CLUSTERING_NAME.to_string(),
    ]
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Unexpected error: {e:#}");
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted by user");
            0
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let tracking_uri = cli
        .tracking_uri
        .or_else(|| std::env::var("MLFLOW_TRACKING_URI").ok())
        .context("no tracking URI: pass --tracking-uri or set MLFLOW_TRACKING_URI")?;
    let client = RegistryClient::new(&tracking_uri);

    match cli.command {
        Command::Register(args) => register(&client, args).await,
        Command::Status(args) => status(&client, args).await,
        Command::Delete(args) => delete(&client, &tracking_uri, args).await,
    }
}

async fn register(client: &RegistryClient, args: RegisterArgs) -> Result<i32> {
    let experiment_id = get_or_create_experiment(client, &args.experiment)
        .await
        .context("failed to resolve experiment")?;
    let run = client
        .create_run(&experiment_id, &args.run_name)
        .await
        .context("failed to create run")?;

    let roles = [
        (CLASSIFICATION_ARTIFACT, "classification_model_artifact", &args.classification_name),
        (CLUSTERING_ARTIFACT, "clustering_model_artifact", &args.clustering_name),
    ];

    for (filename, artifact_path, registered_name) in roles {
        let path = args.model_dir.join(filename);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("failed to read artifact {}", path.display()))?;
        // same validation the gateway applies at startup
        let model = ArtifactModel::from_bytes(&bytes)
            .with_context(|| format!("failed to decode artifact {}", path.display()))?;

        let version = log_model(client, registered_name, &run, artifact_path, bytes)
            .await
            .with_context(|| format!("failed to register {registered_name}"))?;
        println!(
            "Registered {registered_name} ({model}) as version {}",
            version.version
        );
    }

    client
        .terminate_run(&run.run_id)
        .await
        .context("failed to finish run")?;

    println!("Models registered!");
    Ok(0)
}

async fn status(client: &RegistryClient, args: StatusArgs) -> Result<i32> {
    let models = if args.models.is_empty() {
        default_model_names()
    } else {
        args.models
    };

    println!("Checking model details...\n");
    for name in &models {
        match client.get_registered_model(name).await {
            Ok(model) => {
                println!("Model: {}", model.name);
                for version in &model.latest_versions {
                    println!("  Version {}:", version.version);
                    println!("    Stage: {}", version.current_stage.as_deref().unwrap_or("None"));
                    println!("    Status: {}", version.status.as_deref().unwrap_or("UNKNOWN"));
                }
                println!();
            }
            Err(e) => println!("Error checking {name}: {e}\n"),
        }
    }
    Ok(0)
}

async fn delete(client: &RegistryClient, tracking_uri: &str, args: DeleteArgs) -> Result<i32> {
    let models = if args.models.is_empty() {
        default_model_names()
    } else {
        args.models
    };

    println!("Connecting to tracking server at {tracking_uri}...");
    if let Err(e) = client.search_experiments(1).await {
        eprintln!("Connection failed: {e}");
        eprintln!("Check the tracking URI, the server, and network connectivity.");
        return Ok(1);
    }
    println!("Connected.\n");

    let mut failed: Vec<&String> = Vec::new();
    for name in &models {
        println!("Deleting model: {name}");
        match purge_model(client, name).await {
            Ok(()) => println!("  Model '{name}' completely removed from registry"),
            Err(e) => {
                println!("  ERROR deleting '{name}': {e}");
                failed.push(name);
            }
        }
    }

    println!("\nVerifying deletions...");
    for name in &models {
        match verify_deleted(client, name).await {
            Ok(true) => println!("  Confirmed: '{name}' no longer exists"),
            Ok(false) => println!("  WARNING: '{name}' still exists!"),
            Err(e) => println!("  Could not verify '{name}': {e}"),
        }
    }

    let succeeded = models.len() - failed.len();
    println!("\nSuccessfully deleted: {succeeded}/{}", models.len());
    if !failed.is_empty() {
        println!("Failed: {}/{}", failed.len(), models.len());
        for name in &failed {
            println!("  - {name}");
        }
    }

    Ok(0)
}
