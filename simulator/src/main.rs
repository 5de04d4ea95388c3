use std::time::Duration;

use buswatch_simulator::{AppState, feed::Feed, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("BUSWATCH_SIM_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let interval_ms: u64 = std::env::var("BUSWATCH_SIM_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(200)
        .clamp(10, 60_000);

    let state = AppState::new(100);

    // Feed task: synthesize one reading per tick.
    let feed_state = state.clone();
    tokio::spawn(async move {
        let mut feed = Feed::new();
        let mut tick = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            tick.tick().await;
            feed_state.publish(feed.next_record());
        }
    });

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, interval_ms, "simulator serving");
    axum::serve(listener, app).await?;
    Ok(())
}
