use std::collections::HashMap;

use chrono::{Datelike, Local};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::{
    db::numbering::{next_numero, DocumentKind},
    error::{is_unique_violation, ApiError},
    models::{
        devis::Devis,
        facture::{
            CreateFactureFromDevisRequest, Facture, FactureCreee, InvoiceType, LigneFacture,
            ListFacturesRequest, UpdateFactureStatutRequest,
        },
    },
    services::{
        conditions::ConditionService,
        devis::DevisService,
        invoice_split::{already_exists, plan_invoice, proportional_lines, solde_lines, suggest_next_type, LineDraft},
        metrics::INVOICES_COUNTER,
        relances::RelanceService,
        tenants::TenantService,
    },
};

const DEFAULT_LIST_LIMIT: i64 = 50;

pub struct FactureService;

impl FactureService {
    pub async fn list_for_devis<'e>(
        db: impl PgExecutor<'e>,
        tenant_id: Uuid,
        devis_id: Uuid,
    ) -> Result<Vec<Facture>, ApiError> {
        let factures = sqlx::query_as::<_, Facture>(
            "SELECT * FROM factures
             WHERE tenant_id = $1 AND devis_id = $2
             ORDER BY created_at",
        )
        .bind(tenant_id)
        .bind(devis_id)
        .fetch_all(db)
        .await?;
        Ok(factures)
    }

    /// HT already invoiced against each quote line, solde invoices excluded.
    async fn invoiced_ht_by_line<'e>(
        db: impl PgExecutor<'e>,
        devis_id: Uuid,
    ) -> Result<HashMap<Uuid, Decimal>, ApiError> {
        let rows: Vec<(Uuid, Decimal)> = sqlx::query_as(
            "SELECT lf.ligne_devis_id, COALESCE(SUM(lf.total_ht), 0)
             FROM lignes_facture lf
             JOIN factures f ON f.id = lf.facture_id
             WHERE f.devis_id = $1
               AND f.type_facture <> 'solde'
               AND lf.ligne_devis_id IS NOT NULL
             GROUP BY lf.ligne_devis_id",
        )
        .bind(devis_id)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn create_from_devis(
        pool: &PgPool,
        req: &CreateFactureFromDevisRequest,
    ) -> Result<FactureCreee, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;
        let devis = DevisService::resolve(pool, req.tenant_id, &req.devis_id).await?;

        let no_template = || {
            ApiError::rule(
                "NO_TEMPLATE",
                format!("Le devis {} n'a pas de conditions de paiement", devis.numero),
            )
        };
        let template_id = devis.template_id.ok_or_else(no_template)?;
        let template = ConditionService::find(pool, req.tenant_id, template_id)
            .await?
            .ok_or_else(no_template)?;

        let mut tx = pool.begin().await?;

        // Locking the quote serializes invoices of the same quote, so the
        // solde sees every slice committed before it. Line batches take the
        // same lock and may have moved the totals, hence the re-read.
        let devis = sqlx::query_as::<_, Devis>("SELECT * FROM devis WHERE id = $1 FOR UPDATE")
            .bind(devis.id)
            .fetch_one(&mut *tx)
            .await?;

        let prior = Self::list_for_devis(&mut *tx, req.tenant_id, devis.id).await?;
        let emission = req.date_emission.unwrap_or_else(|| Local::now().date_naive());
        let plan = plan_invoice(&devis, &template, req.type_facture, &prior, emission)?;

        let lignes_devis = DevisService::lines(&mut *tx, req.tenant_id, devis.id).await?;
        let drafts: Vec<LineDraft> = match plan.percentage {
            Some(pct) => proportional_lines(&lignes_devis, pct, plan.amounts.ht),
            None => {
                let invoiced = Self::invoiced_ht_by_line(&mut *tx, devis.id).await?;
                solde_lines(&lignes_devis, &invoiced, plan.amounts.ht)
            }
        };

        let numero = next_numero(
            &mut *tx,
            req.tenant_id,
            DocumentKind::Facture,
            emission.year(),
            Some(plan.kind.suffix()),
        )
        .await?;

        let inserted = sqlx::query_as::<_, Facture>(
            "INSERT INTO factures
                (tenant_id, client_id, devis_id, numero, type_facture, statut,
                 montant_ht, montant_tva, montant_ttc, date_emission, date_echeance)
             VALUES ($1, $2, $3, $4, $5, 'brouillon', $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(req.tenant_id)
        .bind(devis.client_id)
        .bind(devis.id)
        .bind(&numero)
        .bind(plan.kind)
        .bind(plan.amounts.ht)
        .bind(plan.amounts.tva)
        .bind(plan.amounts.ttc)
        .bind(plan.date_emission)
        .bind(plan.date_echeance)
        .fetch_one(&mut *tx)
        .await;

        // A concurrent request may have created the same slice since the lookup.
        let facture = match inserted {
            Ok(f) => f,
            Err(e) if is_unique_violation(&e, "factures_devis_type_uniq") => {
                let mut existing: Vec<InvoiceType> = prior.iter().map(|f| f.type_facture).collect();
                existing.push(plan.kind);
                return Err(already_exists(plan.kind, &existing, suggest_next_type(&existing, &template)));
            }
            Err(e) => return Err(e.into()),
        };

        let mut lignes = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            let ligne = sqlx::query_as::<_, LigneFacture>(
                "INSERT INTO lignes_facture
                    (tenant_id, facture_id, ligne_devis_id, ordre, designation,
                     quantite, unite, prix_unitaire_ht, tva_pct)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 RETURNING *",
            )
            .bind(req.tenant_id)
            .bind(facture.id)
            .bind(draft.ligne_devis_id)
            .bind(draft.ordre)
            .bind(&draft.designation)
            .bind(draft.quantite)
            .bind(&draft.unite)
            .bind(draft.prix_unitaire_ht)
            .bind(draft.tva_pct)
            .fetch_one(&mut *tx)
            .await?;
            lignes.push(ligne);
        }

        tx.commit().await?;

        INVOICES_COUNTER
            .with_label_values(&[&req.tenant_id.to_string(), facture.type_facture.as_str()])
            .inc();
        tracing::info!(
            tenant_id = %req.tenant_id,
            devis = %devis.numero,
            numero = %facture.numero,
            type_facture = facture.type_facture.as_str(),
            montant_ttc = %facture.montant_ttc,
            "Invoice created from quote"
        );

        let relances = if facture.type_facture.schedules_reminders() {
            RelanceService::schedule_for(pool, &facture).await
        } else {
            Vec::new()
        };

        Ok(FactureCreee {
            facture,
            lignes,
            relances,
        })
    }

    pub async fn list(pool: &PgPool, req: &ListFacturesRequest) -> Result<Vec<Facture>, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;

        let devis_id = match req.devis_id.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => Some(DevisService::resolve(pool, req.tenant_id, raw).await?.id),
            None => None,
        };

        let factures = sqlx::query_as::<_, Facture>(
            "SELECT * FROM factures
             WHERE tenant_id = $1
               AND ($2::UUID IS NULL OR devis_id = $2)
               AND ($3::TEXT IS NULL OR statut = $3)
             ORDER BY date_emission DESC, created_at DESC
             LIMIT $4",
        )
        .bind(req.tenant_id)
        .bind(devis_id)
        .bind(req.statut.map(|s| s.as_str()))
        .bind(req.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .fetch_all(pool)
        .await?;
        Ok(factures)
    }

    pub async fn update_statut(
        pool: &PgPool,
        req: &UpdateFactureStatutRequest,
    ) -> Result<Facture, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;

        let mut tx = pool.begin().await?;

        let facture = sqlx::query_as::<_, Facture>(
            "UPDATE factures SET statut = $3
             WHERE tenant_id = $1 AND id = $2
             RETURNING *",
        )
        .bind(req.tenant_id)
        .bind(req.facture_id)
        .bind(req.statut.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(
                "FACTURE_NOT_FOUND",
                format!("Facture {} introuvable", req.facture_id),
            )
        })?;

        let cancelled = if req.statut.closes_reminders() {
            RelanceService::cancel_pending(&mut *tx, facture.id).await?
        } else {
            0
        };

        tx.commit().await?;

        tracing::info!(
            tenant_id = %req.tenant_id,
            numero = %facture.numero,
            statut = req.statut.as_str(),
            cancelled_relances = cancelled,
            "Invoice status updated"
        );
        Ok(facture)
    }
}
