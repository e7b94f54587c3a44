#[cfg(not(any(all(target_os = "macos", target_arch = "aarch64"), target_os = "ios")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use dotenv::dotenv;
use tabgate::ModelArtifacts;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod router;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Tabgate Model-Serving Gateway");

    let config = config::Config::from_env()?;
    tracing::info!(
        "Loaded configuration: port={}, model_dir={}",
        config.port,
        config.model_dir.display()
    );

    // Artifacts load exactly once, before the listener binds. A failed
    // role leaves the service degraded (answering 503) rather than crashed.
    let artifacts = ModelArtifacts::load(&config.model_dir);
    if !artifacts.is_ready() {
        tracing::warn!("Starting degraded: prediction requests will be rejected with 503");
    }

    let state = router::GatewayState::new(artifacts);
    let app = router::gateway_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
