//! Bracket auction binary entrypoint wiring configuration, bracket data, REST and WebSocket layers.

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::{
    net::TcpListener,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bracket_auction_back::{
    config::AppConfig,
    dao::bracket::{BracketProvider, StaticBracket},
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let (bracket, from_file) = load_bracket(&config);
    if let Some(period) = config.results_refresh().filter(|_| from_file) {
        tokio::spawn(refresh_results(
            bracket.clone(),
            config.bracket_path().clone(),
            period,
        ));
    }
    let app_state = AppState::new(config, bracket);

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Read the bracket named by the configuration, or fall back to a generated field.
///
/// The flag reports whether the bracket came from disk.
fn load_bracket(config: &AppConfig) -> (Arc<StaticBracket>, bool) {
    let path = config.bracket_path();
    match StaticBracket::from_json_file(path) {
        Ok(bracket) => {
            info!(
                path = %path.display(),
                teams = bracket.teams().len(),
                results = bracket.match_results().len(),
                "loaded bracket"
            );
            (Arc::new(bracket), true)
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "bracket unavailable; using generated 64-team field"
            );
            (Arc::new(StaticBracket::generated()), false)
        }
    }
}

/// Periodically re-read match results so scores follow the tournament.
async fn refresh_results(bracket: Arc<StaticBracket>, path: PathBuf, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match bracket.reload_results(&path) {
            Ok(results) => info!(path = %path.display(), results, "reloaded match results"),
            Err(err) => warn!(
                path = %path.display(),
                error = %err,
                "failed to reload match results; keeping previous ones"
            ),
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
