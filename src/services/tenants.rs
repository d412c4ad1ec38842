use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::ApiError, models::tenant::Tenant};

pub struct TenantService;

impl TenantService {
    /// Every business operation starts here: the tenant must exist and be active.
    pub async fn require_active(pool: &PgPool, tenant_id: Uuid) -> Result<Tenant, ApiError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;

        match tenant {
            Some(t) if t.is_active => Ok(t),
            Some(_) => Err(ApiError::not_found(
                "TENANT_NOT_FOUND",
                "Ce compte est désactivé",
            )),
            None => Err(ApiError::not_found(
                "TENANT_NOT_FOUND",
                format!("Aucun compte pour le tenant {tenant_id}"),
            )),
        }
    }
}
