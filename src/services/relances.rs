use chrono::{Duration, NaiveDate};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        facture::Facture,
        relance::{DueRelance, ListRelancesRequest, Relance, ReminderStatus, REMINDER_OFFSETS_DAYS},
    },
    services::{
        email::EmailService,
        metrics::{REMINDERS_DISPATCHED_COUNTER, REMINDERS_SCHEDULED_COUNTER},
        tenants::TenantService,
    },
};

/// `(niveau, date_prevue)` of the three reminders of an invoice due on `due`.
/// Levels whose date falls past the calendar's range are left out.
pub fn reminder_dates(due: NaiveDate) -> Vec<(i16, NaiveDate)> {
    REMINDER_OFFSETS_DAYS
        .iter()
        .filter_map(|(niveau, days)| {
            due.checked_add_signed(Duration::days(*days))
                .map(|date| (*niveau, date))
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct RelanceService;

impl RelanceService {
    /// Plans the three reminders of a freshly created invoice.
    ///
    /// Runs after the invoice is committed: a failure here is logged and
    /// leaves the invoice without reminders rather than failing the request.
    pub async fn schedule_for(pool: &PgPool, facture: &Facture) -> Vec<Relance> {
        let (niveaux, dates): (Vec<i16>, Vec<NaiveDate>) =
            reminder_dates(facture.date_echeance).into_iter().unzip();

        let result = sqlx::query_as::<_, Relance>(
            "INSERT INTO relances (tenant_id, facture_id, niveau, date_prevue, statut)
             SELECT $1, $2, n, d, 'planifie'
             FROM UNNEST($3::SMALLINT[], $4::DATE[]) AS t(n, d)
             RETURNING *",
        )
        .bind(facture.tenant_id)
        .bind(facture.id)
        .bind(&niveaux)
        .bind(&dates)
        .fetch_all(pool)
        .await;

        match result {
            Ok(mut relances) => {
                relances.sort_by_key(|r| r.niveau);
                REMINDERS_SCHEDULED_COUNTER
                    .with_label_values(&[&facture.tenant_id.to_string()])
                    .inc_by(relances.len() as f64);
                relances
            }
            Err(e) => {
                warn!(
                    facture_id = %facture.id,
                    numero = %facture.numero,
                    "Reminder scheduling failed: {e}"
                );
                Vec::new()
            }
        }
    }

    pub async fn list(pool: &PgPool, req: &ListRelancesRequest) -> Result<Vec<Relance>, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;

        let relances = sqlx::query_as::<_, Relance>(
            "SELECT * FROM relances
             WHERE tenant_id = $1
               AND ($2::UUID IS NULL OR facture_id = $2)
               AND ($3::TEXT IS NULL OR statut = $3)
             ORDER BY date_prevue, niveau",
        )
        .bind(req.tenant_id)
        .bind(req.facture_id)
        .bind(req.statut.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;
        Ok(relances)
    }

    /// Cancels the reminders of `facture_id` that have not gone out yet.
    pub async fn cancel_pending(conn: &mut PgConnection, facture_id: Uuid) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE relances SET statut = 'annulee'
             WHERE facture_id = $1 AND statut = 'planifie'",
        )
        .bind(facture_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Reminders due on or before `today` whose invoice is still unpaid.
    pub async fn due(
        pool: &PgPool,
        tenant_id: Option<Uuid>,
        today: NaiveDate,
    ) -> Result<Vec<DueRelance>, ApiError> {
        let rows = sqlx::query_as::<_, DueRelance>(
            "SELECT r.id, r.tenant_id, r.niveau,
                    f.numero, f.montant_ttc, f.date_echeance,
                    c.nom AS client_nom, c.prenom AS client_prenom,
                    c.entreprise AS client_entreprise, c.email AS client_email,
                    t.nom AS tenant_nom
             FROM relances r
             JOIN factures f ON f.id = r.facture_id
             JOIN clients  c ON c.id = f.client_id
             JOIN tenants  t ON t.id = r.tenant_id
             WHERE r.statut = 'planifie'
               AND r.date_prevue <= $1
               AND f.statut NOT IN ('payee', 'annulee')
               AND t.is_active = TRUE
               AND ($2::UUID IS NULL OR r.tenant_id = $2)
             ORDER BY r.date_prevue, r.niveau",
        )
        .bind(today)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn mark(pool: &PgPool, id: Uuid, status: ReminderStatus) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE relances
             SET statut = $2,
                 sent_at = CASE WHEN $2 = 'envoyee' THEN NOW() ELSE sent_at END
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Sends every due reminder. Without an email service, or in dry-run,
    /// nothing is sent or updated and due reminders are counted as skipped.
    pub async fn dispatch_due(
        pool: &PgPool,
        email: Option<&EmailService>,
        tenant_id: Option<Uuid>,
        today: NaiveDate,
        dry_run: bool,
    ) -> Result<DispatchReport, ApiError> {
        let due = Self::due(pool, tenant_id, today).await?;

        let email = match email {
            Some(email) if !dry_run => email,
            _ => {
                for relance in &due {
                    info!(
                        relance_id = %relance.id,
                        numero = %relance.numero,
                        niveau = relance.niveau,
                        "Reminder due (not sent)"
                    );
                }
                return Ok(DispatchReport {
                    skipped: due.len(),
                    ..DispatchReport::default()
                });
            }
        };

        Ok(Self::send_all(pool, email, &due).await)
    }

    /// Emails each reminder and records the outcome. A status update that
    /// fails is logged and the batch goes on.
    pub async fn send_all(pool: &PgPool, email: &EmailService, due: &[DueRelance]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for relance in due {
            let status = match relance.client_email.as_deref().filter(|e| !e.trim().is_empty()) {
                None => {
                    warn!(relance_id = %relance.id, numero = %relance.numero, "Client has no email address");
                    ReminderStatus::Echec
                }
                Some(to) => match email.send_relance(to, relance).await {
                    Ok(()) => {
                        info!(relance_id = %relance.id, numero = %relance.numero, niveau = relance.niveau, "Reminder sent → {to}");
                        ReminderStatus::Envoyee
                    }
                    Err(e) => {
                        warn!(relance_id = %relance.id, numero = %relance.numero, "Reminder send failed: {e}");
                        ReminderStatus::Echec
                    }
                },
            };

            REMINDERS_DISPATCHED_COUNTER
                .with_label_values(&[status.as_str()])
                .inc();
            match status {
                ReminderStatus::Envoyee => report.sent += 1,
                _ => report.failed += 1,
            }

            if let Err(e) = Self::mark(pool, relance.id, status).await {
                warn!(
                    relance_id = %relance.id,
                    numero = %relance.numero,
                    statut = status.as_str(),
                    "Reminder status update failed: {e}"
                );
            }
        }

        report
    }
}
