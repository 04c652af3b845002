//! Warden Server — application entry point.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warden_auth::{AccountService, NotificationDispatcher};
use warden_avatar::AvatarPipeline;
use warden_db::DbManager;
use warden_db::repository::SurrealAccountDirectory;
use warden_server::{MailGateway, ServerConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warden=info".parse()?))
        .json()
        .init();

    info!("Starting warden server...");

    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    let db = DbManager::connect(&config.db)
        .await
        .context("Failed to connect to SurrealDB")?;
    let directory = SurrealAccountDirectory::new(db.client().clone());

    let avatars = AvatarPipeline::new(config.avatar.clone());
    avatars
        .prepare()
        .await
        .context("Failed to prepare avatar directories")?;

    let gateway = MailGateway::from_config(&config.mail).context("Failed to build mail gateway")?;
    if matches!(gateway, MailGateway::Log(_)) {
        info!("No mail provider configured, notifications will only be logged");
    }
    let (notifier, _dispatcher) = NotificationDispatcher::spawn(gateway, config.mail.queue_capacity);

    let service = AccountService::new(directory, avatars, notifier, config.auth.clone())
        .context("Failed to initialize account service")?;
    let app = create_router(service);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app).await?;

    info!("Warden server stopped.");
    Ok(())
}
