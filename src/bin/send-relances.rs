/// Send every payment reminder that has fallen due.
/// Same pass the API's daily scheduler runs; use it from cron when the API
/// runs without SMTP, or to replay a given day.
///
/// Usage: send-relances [--tenant UUID] [--date YYYY-MM-DD] [--dry-run]

use chrono::{Local, NaiveDate};
use clap::Parser;
use uuid::Uuid;

use btp_api::{config::Config, db, services::email::EmailService, services::relances::RelanceService};

#[derive(Parser)]
#[command(name = "send-relances", about = "Send due payment reminders")]
struct Args {
    /// Only this tenant (all active tenants if not specified)
    #[arg(long)]
    tenant: Option<Uuid>,

    /// Reminders due on or before this date (today if not specified)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// List due reminders without sending or updating anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, 5).await?;
    let email = EmailService::new(&config);
    if email.is_none() && !args.dry_run {
        tracing::warn!("SMTP not configured, due reminders will only be listed");
    }

    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    tracing::info!("Dispatching reminders due on or before {today}");

    let report =
        RelanceService::dispatch_due(&pool, email.as_ref(), args.tenant, today, args.dry_run)
            .await?;

    tracing::info!(
        "Reminder dispatch done: {} sent, {} failed, {} skipped",
        report.sent,
        report.failed,
        report.skipped
    );
    Ok(())
}
