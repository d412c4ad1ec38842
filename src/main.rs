use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btp_api::{
    config::Config,
    db, routes,
    services::{email::EmailService, metrics, reminder_scheduler},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis = match config.redis_url.as_deref() {
        Some(url) => {
            let client = redis::Client::open(url)?;
            match client.get_multiplexed_async_connection().await {
                Ok(conn) => {
                    info!("Redis connected");
                    Some(conn)
                }
                Err(e) => {
                    warn!("Redis unavailable, assistant rate limiting disabled: {e}");
                    None
                }
            }
        }
        None => {
            info!("REDIS_URL not set, assistant rate limiting disabled");
            None
        }
    };

    let email = EmailService::new(&config).map(Arc::new);
    match &email {
        Some(email) => {
            info!("SMTP email service configured");
            reminder_scheduler::start(pool.clone(), email.clone(), config.reminder_send_hour);
        }
        None => info!("SMTP not configured, payment reminders will not be emailed"),
    }

    metrics::start(pool.clone());

    let state = AppState {
        db: pool,
        redis,
        config: config.clone(),
        email,
    };

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("BTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
