use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::facture::Facture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevisStatus {
    Brouillon,
    Envoye,
    Accepte,
    Refuse,
}

impl DevisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevisStatus::Brouillon => "brouillon",
            DevisStatus::Envoye => "envoye",
            DevisStatus::Accepte => "accepte",
            DevisStatus::Refuse => "refuse",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Devis {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub numero: String,
    pub titre: String,
    pub description: Option<String>,
    pub statut: String,
    pub montant_ht: Decimal,
    pub montant_tva: Decimal,
    pub montant_ttc: Decimal,
    pub template_id: Option<Uuid>,
    pub date_creation: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Quote line. `total_*` columns are generated by the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LigneDevis {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub devis_id: Uuid,
    pub ordre: i32,
    pub designation: String,
    pub quantite: Decimal,
    pub unite: String,
    pub prix_unitaire_ht: Decimal,
    pub tva_pct: Decimal,
    pub total_ht: Decimal,
    pub total_tva: Decimal,
    pub total_ttc: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDevisRequest {
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    #[validate(length(max = 255))]
    pub titre: Option<String>,
    pub description: Option<String>,
    pub template_id: Option<Uuid>,
}

/// `lignes` stays untyped so that a missing, empty or non-array value can be
/// answered with `INVALID_LIGNES` rather than a generic parse error.
#[derive(Debug, Deserialize, Validate)]
pub struct AddLignesRequest {
    pub tenant_id: Uuid,
    /// UUID or human numero.
    #[validate(length(min = 1))]
    pub devis_id: String,
    #[serde(default)]
    pub lignes: Value,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NouvelleLigne {
    #[validate(length(min = 1))]
    pub designation: String,
    #[validate(custom(function = "super::positive"))]
    pub quantite: Decimal,
    #[validate(length(min = 1, max = 16))]
    pub unite: Option<String>,
    #[validate(custom(function = "super::non_negative"))]
    pub prix_unitaire_ht: Decimal,
    #[validate(custom(function = "super::percentage"))]
    pub tva_pct: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct LignesAjoutees {
    pub devis_id: Uuid,
    pub lignes: Vec<LigneDevis>,
    /// Totals of the inserted lines only.
    pub total_ht: Decimal,
    pub total_tva: Decimal,
    pub total_ttc: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GetDevisRequest {
    pub tenant_id: Uuid,
    #[validate(length(min = 1))]
    pub devis_id: String,
}

#[derive(Debug, Serialize)]
pub struct DevisDetail {
    #[serde(flatten)]
    pub devis: Devis,
    pub lignes: Vec<LigneDevis>,
    pub factures: Vec<Facture>,
}
