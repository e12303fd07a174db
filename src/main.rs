use anyhow::{Result, anyhow};
use tokio::net::TcpListener;
use zipsend::{config::ServerConfig, delivery::Delivery, server::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = ServerConfig::from_env()?;
    zipsend::tracing::init_tracing(cfg.level_filter());

    let listener = TcpListener::bind(cfg.addr()?).await?;
    let state = AppState::new(cfg.root.clone(), Delivery::default());

    tokio::select! {
        res = zipsend::serve(listener, state) => res.map_err(|e| anyhow!(e))?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}
