use buswatch_dashboard::{DashboardConfig, run_dashboard, term};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they do not fight the frame redraws on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cfg = DashboardConfig::from_env();
    tracing::info!(endpoint = %cfg.endpoint, "starting dashboard");

    let (render, status) = term::term_sinks(cfg.history_rows);
    run_dashboard(cfg, render, status).await;
    Ok(())
}
