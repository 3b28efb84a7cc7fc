mod auth;
mod csrf;
mod db;
mod error;
mod forms;
mod handlers;
mod middleware;
mod models;
mod routes;
mod session;
mod state;
mod template;
mod validator;

use anyhow::Context;
use clap::Parser;
use state::AppState;
use std::path::PathBuf;
use template::TemplateFuncs;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are purged from the store.
const SESSION_SWEEP_SECS: u64 = 60;

#[derive(Parser, Debug)]
#[command(name = "snippetbox", about = "Share text snippets that expire")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "4000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// SQLite database file. Created if missing.
    #[arg(long, env = "DATABASE_PATH", default_value = "snippetbox.db")]
    dsn: PathBuf,

    /// Hours of inactivity after which a session expires.
    #[arg(
        long,
        env = "SESSION_HOURS",
        default_value_t = 12,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    session_hours: i64,

    /// Mark session cookies `Secure`. Turn off only when serving plain HTTP locally.
    #[arg(long, env = "SECURE_COOKIES", default_value_t = true, action = clap::ArgAction::Set)]
    secure_cookies: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snippetbox=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present (silently ignored if absent).
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing::info!("database: {}", args.dsn.display());
    let pool = db::init_pool(&args.dsn).await?;

    let store = SqliteStore::new(pool.clone());
    store
        .migrate()
        .await
        .context("Failed to create session table")?;
    let sweeper = tokio::task::spawn(
        store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(SESSION_SWEEP_SECS)),
    );

    if !args.secure_cookies {
        tracing::warn!("Session cookies are not marked Secure");
    }
    let sessions = session::manager_layer(store, args.secure_cookies, args.session_hours);

    let state = AppState::new(pool, TemplateFuncs::default());
    let app = routes::app(state, sessions);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;

    tracing::info!("Listening on http://{addr}");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    sweeper.abort();
    served
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Cannot register SIGTERM handler: {}", e);
                tokio::signal::ctrl_c().await.ok();
                tracing::info!("Shutting down gracefully");
                return;
            }
        };
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result { tracing::error!("ctrl-c error: {}", e); }
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
    tracing::info!("Shutting down gracefully");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_hours_must_be_positive() {
        for hours in ["0", "-3"] {
            let parsed = Args::try_parse_from(["snippetbox", "--session-hours", hours]);
            assert!(parsed.is_err(), "{hours}");
        }
        let args = Args::try_parse_from(["snippetbox", "--session-hours", "1"]).unwrap();
        assert_eq!(args.session_hours, 1);
    }
}
