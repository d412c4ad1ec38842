use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::relance::Relance;

/// Which slice of a quote an invoice bills. Stored in its own column; the
/// numero suffix (`-A`, `-I`, `-S`) is only for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "type_facture", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceType {
    Acompte,
    #[serde(alias = "intermédiaire")]
    Intermediaire,
    Solde,
}

impl InvoiceType {
    /// Billing order of the slices of one quote.
    pub const SEQUENCE: [InvoiceType; 3] = [
        InvoiceType::Acompte,
        InvoiceType::Intermediaire,
        InvoiceType::Solde,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Acompte => "acompte",
            InvoiceType::Intermediaire => "intermediaire",
            InvoiceType::Solde => "solde",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceType::Acompte => "Acompte",
            InvoiceType::Intermediaire => "Intermédiaire",
            InvoiceType::Solde => "Solde",
        }
    }

    pub fn suffix(&self) -> char {
        match self {
            InvoiceType::Acompte => 'A',
            InvoiceType::Intermediaire => 'I',
            InvoiceType::Solde => 'S',
        }
    }

    /// First and last slices get payment reminders.
    pub fn schedules_reminders(&self) -> bool {
        matches!(self, InvoiceType::Acompte | InvoiceType::Solde)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Brouillon,
    Envoyee,
    Payee,
    Annulee,
    EnRetard,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Brouillon => "brouillon",
            InvoiceStatus::Envoyee => "envoyee",
            InvoiceStatus::Payee => "payee",
            InvoiceStatus::Annulee => "annulee",
            InvoiceStatus::EnRetard => "en_retard",
        }
    }

    /// Nothing left to chase once an invoice is paid or cancelled.
    pub fn closes_reminders(&self) -> bool {
        matches!(self, InvoiceStatus::Payee | InvoiceStatus::Annulee)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Facture {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub devis_id: Option<Uuid>,
    pub numero: String,
    pub type_facture: InvoiceType,
    pub statut: String,
    pub montant_ht: Decimal,
    pub montant_tva: Decimal,
    pub montant_ttc: Decimal,
    pub date_emission: NaiveDate,
    pub date_echeance: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LigneFacture {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub facture_id: Uuid,
    pub ligne_devis_id: Option<Uuid>,
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
pub struct CreateFactureFromDevisRequest {
    pub tenant_id: Uuid,
    /// UUID or human numero.
    #[validate(length(min = 1))]
    pub devis_id: String,
    #[serde(rename = "type")]
    pub type_facture: InvoiceType,
    /// Defaults to today.
    pub date_emission: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct FactureCreee {
    pub facture: Facture,
    pub lignes: Vec<LigneFacture>,
    pub relances: Vec<Relance>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListFacturesRequest {
    pub tenant_id: Uuid,
    pub devis_id: Option<String>,
    pub statut: Option<InvoiceStatus>,
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFactureStatutRequest {
    pub tenant_id: Uuid,
    pub facture_id: Uuid,
    pub statut: InvoiceStatus,
}
