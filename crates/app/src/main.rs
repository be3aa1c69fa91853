use std::sync::Arc;

use engine::{LogNotifier, Notifier};
use migration::{Migrator, MigratorTrait};
use settings::{Database, Mail};

mod notifier;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bank={level},server={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let notifier: Arc<dyn Notifier> = match settings.mail {
        Mail::Log => Arc::new(LogNotifier),
        Mail::Webhook { url } => {
            tracing::info!("Sending one-time passcodes to {url}");
            Arc::new(notifier::WebhookNotifier::new(url))
        }
    };
    let engine = engine::Engine::builder()
        .database(db)
        .notifier(notifier)
        .build()
        .await?;

    let auth = server::AuthConfig {
        jwt_secret: settings.auth.jwt_secret,
        token_ttl_minutes: settings.auth.token_ttl_minutes,
    };
    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tasks.spawn(async move {
        if let Err(err) = server::run_with_listener(engine, auth, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite { path } => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("Database ready");
    Ok(database)
}
