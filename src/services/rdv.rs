use sqlx::PgPool;

use crate::{
    error::ApiError,
    models::rdv::{CreateRdvRequest, ListRdvRequest, Rdv},
    services::{clients::ClientService, tenants::TenantService},
};

pub struct RdvService;

impl RdvService {
    pub async fn create(pool: &PgPool, req: &CreateRdvRequest) -> Result<Rdv, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;
        let client = ClientService::require(pool, req.tenant_id, req.client_id).await?;

        let rdv = sqlx::query_as::<_, Rdv>(
            "INSERT INTO rdv (tenant_id, client_id, titre, date_debut, date_fin, adresse, notes, statut)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'planifie')
             RETURNING *",
        )
        .bind(req.tenant_id)
        .bind(client.id)
        .bind(req.titre.trim())
        .bind(req.date_debut)
        .bind(req.date_fin)
        // Site address defaults to the client's own.
        .bind(req.adresse.as_ref().or(client.adresse.as_ref()))
        .bind(&req.notes)
        .fetch_one(pool)
        .await?;

        tracing::info!(tenant_id = %req.tenant_id, rdv_id = %rdv.id, client_id = %client.id, "Appointment created");
        Ok(rdv)
    }

    pub async fn list(pool: &PgPool, req: &ListRdvRequest) -> Result<Vec<Rdv>, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;

        let rdvs = sqlx::query_as::<_, Rdv>(
            "SELECT * FROM rdv
             WHERE tenant_id = $1
               AND date_debut >= $2 AND date_debut < $3
               AND ($4::UUID IS NULL OR client_id = $4)
             ORDER BY date_debut",
        )
        .bind(req.tenant_id)
        .bind(req.from)
        .bind(req.to)
        .bind(req.client_id)
        .fetch_all(pool)
        .await?;
        Ok(rdvs)
    }
}
