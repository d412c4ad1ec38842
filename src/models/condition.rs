use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::facture::InvoiceType;

/// Payment-conditions template: how a quote is split across invoices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConditionPaiement {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub nom: String,
    /// Smallest quote amount this template applies to.
    pub montant_min: Decimal,
    pub pourcentage_acompte: Option<Decimal>,
    pub pourcentage_intermediaire: Option<Decimal>,
    pub pourcentage_solde: Option<Decimal>,
    pub delai_acompte_jours: i32,
    pub delai_intermediaire_jours: i32,
    pub delai_solde_jours: i32,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl ConditionPaiement {
    /// Percentage of the quote billed by this slice; `None` when the slice
    /// is absent or zero.
    pub fn percentage(&self, kind: InvoiceType) -> Option<Decimal> {
        let pct = match kind {
            InvoiceType::Acompte => self.pourcentage_acompte,
            InvoiceType::Intermediaire => self.pourcentage_intermediaire,
            InvoiceType::Solde => self.pourcentage_solde,
        };
        pct.filter(|p| *p > Decimal::ZERO)
    }

    pub fn delay_days(&self, kind: InvoiceType) -> i64 {
        let days = match kind {
            InvoiceType::Acompte => self.delai_acompte_jours,
            InvoiceType::Intermediaire => self.delai_intermediaire_jours,
            InvoiceType::Solde => self.delai_solde_jours,
        };
        i64::from(days.max(0))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateConditionRequest {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub nom: String,
    #[validate(custom(function = "super::non_negative"))]
    pub montant_min: Option<Decimal>,
    #[validate(custom(function = "super::percentage"))]
    pub pourcentage_acompte: Option<Decimal>,
    #[validate(custom(function = "super::percentage"))]
    pub pourcentage_intermediaire: Option<Decimal>,
    #[validate(custom(function = "super::percentage"))]
    pub pourcentage_solde: Option<Decimal>,
    #[validate(range(min = 0, max = 365))]
    pub delai_acompte_jours: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub delai_intermediaire_jours: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub delai_solde_jours: Option<i32>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListConditionsRequest {
    pub tenant_id: Uuid,
}
