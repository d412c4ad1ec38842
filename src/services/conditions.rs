use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::condition::{ConditionPaiement, CreateConditionRequest},
    services::tenants::TenantService,
};

pub struct ConditionService;

impl ConditionService {
    pub async fn find(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ConditionPaiement>, ApiError> {
        let template = sqlx::query_as::<_, ConditionPaiement>(
            "SELECT * FROM conditions_paiement WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(template)
    }

    /// Template for a quote of `amount`: the highest `montant_min` not above
    /// it, the default one winning ties.
    pub async fn select_for_amount(
        pool: &PgPool,
        tenant_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<ConditionPaiement>, ApiError> {
        let template = sqlx::query_as::<_, ConditionPaiement>(
            "SELECT * FROM conditions_paiement
             WHERE tenant_id = $1 AND montant_min <= $2
             ORDER BY montant_min DESC, is_default DESC, created_at
             LIMIT 1",
        )
        .bind(tenant_id)
        .bind(amount)
        .fetch_optional(pool)
        .await?;
        Ok(template)
    }

    pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<ConditionPaiement>, ApiError> {
        TenantService::require_active(pool, tenant_id).await?;

        let templates = sqlx::query_as::<_, ConditionPaiement>(
            "SELECT * FROM conditions_paiement
             WHERE tenant_id = $1
             ORDER BY montant_min, nom",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;
        Ok(templates)
    }

    pub async fn create(
        pool: &PgPool,
        req: &CreateConditionRequest,
    ) -> Result<ConditionPaiement, ApiError> {
        check_split(&[
            req.pourcentage_acompte,
            req.pourcentage_intermediaire,
            req.pourcentage_solde,
        ])?;
        TenantService::require_active(pool, req.tenant_id).await?;

        let mut tx = pool.begin().await?;

        if req.is_default {
            sqlx::query("UPDATE conditions_paiement SET is_default = FALSE WHERE tenant_id = $1")
                .bind(req.tenant_id)
                .execute(&mut *tx)
                .await?;
        }

        let template = sqlx::query_as::<_, ConditionPaiement>(
            "INSERT INTO conditions_paiement
                (tenant_id, nom, montant_min,
                 pourcentage_acompte, pourcentage_intermediaire, pourcentage_solde,
                 delai_acompte_jours, delai_intermediaire_jours, delai_solde_jours, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(req.tenant_id)
        .bind(req.nom.trim())
        .bind(req.montant_min.unwrap_or(Decimal::ZERO))
        .bind(req.pourcentage_acompte)
        .bind(req.pourcentage_intermediaire)
        .bind(req.pourcentage_solde)
        .bind(req.delai_acompte_jours.unwrap_or(0))
        .bind(req.delai_intermediaire_jours.unwrap_or(30))
        .bind(req.delai_solde_jours.unwrap_or(30))
        .bind(req.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %req.tenant_id, template_id = %template.id, "Payment template created");
        Ok(template)
    }
}

/// The percentages that are set must add up to exactly 100.
pub fn check_split(percentages: &[Option<Decimal>]) -> Result<(), ApiError> {
    let total: Decimal = percentages.iter().flatten().sum();
    if total != Decimal::ONE_HUNDRED {
        return Err(ApiError::validation(format!(
            "Les pourcentages doivent totaliser 100 (total actuel : {total})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn split_must_total_one_hundred() {
        assert!(check_split(&[Some(dec!(30)), Some(dec!(30)), Some(dec!(40))]).is_ok());
        assert!(check_split(&[None, None, Some(dec!(100))]).is_ok());
        assert!(check_split(&[Some(dec!(33.33)), Some(dec!(33.33)), Some(dec!(33.34))]).is_ok());

        let err = check_split(&[Some(dec!(30)), None, Some(dec!(40))]).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(check_split(&[None, None, None]).is_err());
    }
}
