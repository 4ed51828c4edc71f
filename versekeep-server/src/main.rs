//! VerseKeep server binary

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use versekeep_server::{
    routes, AppState, Config, ConsoleEmailSender, EmailSender, SmtpConfig,
    SmtpEmailSender, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "versekeep_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    // Open the database
    let store = SqliteStore::open(&config.database_path)?;
    tracing::info!(path = %config.database_path, "Opened database");

    // Pick the email transport: SMTP when configured, console otherwise
    let email_sender: Box<dyn EmailSender> = match SmtpConfig::from_env() {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, "Using SMTP email sender");
            Box::new(SmtpEmailSender::new(smtp).map_err(anyhow::Error::msg)?)
        }
        None => {
            tracing::info!("SMTP not configured, login codes go to the log");
            Box::new(ConsoleEmailSender::new())
        }
    };

    // Create app state
    let state = Arc::new(
        AppState::new(store, email_sender)
            .with_session_ttl(config.session_ttl_days)
            .with_login_code_ttl(config.login_code_ttl_minutes),
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("VerseKeep listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
