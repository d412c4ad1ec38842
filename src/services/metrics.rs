use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref QUOTES_COUNTER: CounterVec = register_counter_vec!(
        "btp_devis_created_total",
        "Devis créés par tenant",
        &["tenant"]
    ).unwrap();

    pub static ref INVOICES_COUNTER: CounterVec = register_counter_vec!(
        "btp_factures_created_total",
        "Factures créées par tenant et type",
        &["tenant", "type"]
    ).unwrap();

    pub static ref REMINDERS_SCHEDULED_COUNTER: CounterVec = register_counter_vec!(
        "btp_relances_scheduled_total",
        "Relances planifiées par tenant",
        &["tenant"]
    ).unwrap();

    pub static ref REMINDERS_DISPATCHED_COUNTER: CounterVec = register_counter_vec!(
        "btp_relances_dispatched_total",
        "Relances traitées par statut",
        &["status"]
    ).unwrap();

    pub static ref ASSISTANT_ACTIONS_COUNTER: CounterVec = register_counter_vec!(
        "btp_assistant_actions_total",
        "Actions routées par assistant",
        &["assistant", "action"]
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref OUTSTANDING_GAUGE: GaugeVec = register_gauge_vec!(
        "btp_factures_outstanding_ttc",
        "Montant TTC des factures non réglées par tenant",
        &["tenant"]
    ).unwrap();

    pub static ref PENDING_REMINDERS_GAUGE: GaugeVec = register_gauge_vec!(
        "btp_relances_pending_total",
        "Relances planifiées non envoyées par tenant",
        &["tenant"]
    ).unwrap();

    pub static ref TENANTS_GAUGE: Gauge = register_gauge!(
        "btp_tenants_active_total",
        "Nombre de tenants actifs"
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let tenants: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM tenants WHERE is_active = TRUE")
        .fetch_all(pool)
        .await?;

    TENANTS_GAUGE.set(tenants.len() as f64);

    let outstanding: Vec<(Uuid, Decimal)> = sqlx::query_as(
        "SELECT tenant_id, COALESCE(SUM(montant_ttc), 0)
         FROM factures
         WHERE statut IN ('envoyee', 'en_retard')
         GROUP BY tenant_id",
    )
    .fetch_all(pool)
    .await?;

    let pending: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT tenant_id, COUNT(*)::BIGINT
         FROM relances
         WHERE statut = 'planifie'
         GROUP BY tenant_id",
    )
    .fetch_all(pool)
    .await?;

    for tenant in &tenants {
        let label = tenant.to_string();
        let amount = outstanding
            .iter()
            .find(|(id, _)| id == tenant)
            .and_then(|(_, amount)| amount.to_f64())
            .unwrap_or(0.0);
        OUTSTANDING_GAUGE.with_label_values(&[&label]).set(amount);

        let count = pending
            .iter()
            .find(|(id, _)| id == tenant)
            .map(|(_, count)| *count)
            .unwrap_or(0);
        PENDING_REMINDERS_GAUGE.with_label_values(&[&label]).set(count as f64);
    }

    info!("Metrics: collected for {} tenant(s)", tenants.len());
    Ok(())
}
