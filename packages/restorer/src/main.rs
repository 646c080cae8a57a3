use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use restorer::{
    InvocationRequest, RestorerAppConfig, default_registry, invocation_context, run_invocation,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RestorerAppConfig::load().context("Failed to load config")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store = config
        .open_store()
        .await
        .context("Failed to open snapshot store")?;
    info!(backend = ?config.store.backend, "Snapshot store opened");

    let registry = default_registry(store, &config.binder).context("Failed to register actions")?;
    for action in registry.infos() {
        info!(name = %action.name, action = %action.action, resources = ?action.resources, "Action registered");
    }

    let request = InvocationRequest::read_from(tokio::io::stdin())
        .await
        .context("Failed to read invocation from stdin")?;

    let ctx = invocation_context(&config.runner);
    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling invocation");
            token.cancel();
        }
    });

    let output = run_invocation(&registry, &ctx, request).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
