use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::client;

/// Day offsets from the due date of the three reminder levels.
pub const REMINDER_OFFSETS_DAYS: [(i16, i64); 3] = [(1, 3), (2, 10), (3, 21)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Planifie,
    Envoyee,
    Annulee,
    Echec,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Planifie => "planifie",
            ReminderStatus::Envoyee => "envoyee",
            ReminderStatus::Annulee => "annulee",
            ReminderStatus::Echec => "echec",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Relance {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub facture_id: Uuid,
    pub niveau: i16,
    pub date_prevue: NaiveDate,
    pub statut: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A reminder that is due, joined with what the email needs.
#[derive(Debug, Clone, FromRow)]
pub struct DueRelance {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub niveau: i16,
    pub numero: String,
    pub montant_ttc: Decimal,
    pub date_echeance: NaiveDate,
    pub client_nom: String,
    pub client_prenom: Option<String>,
    pub client_entreprise: Option<String>,
    pub client_email: Option<String>,
    pub tenant_nom: String,
}

impl DueRelance {
    pub fn client_display_name(&self) -> String {
        client::display_name(
            &self.client_nom,
            self.client_prenom.as_deref(),
            self.client_entreprise.as_deref(),
        )
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListRelancesRequest {
    pub tenant_id: Uuid,
    pub facture_id: Option<Uuid>,
    pub statut: Option<ReminderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_names_the_client_like_the_client_record() {
        let mut relance = DueRelance {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            niveau: 2,
            numero: "FAC-2026-0002-A".into(),
            montant_ttc: Decimal::new(12000, 2),
            date_echeance: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            client_nom: "Durand".into(),
            client_prenom: Some("Léa".into()),
            client_entreprise: Some("  ".into()),
            client_email: None,
            tenant_nom: "Renov Pro".into(),
        };
        assert_eq!(relance.client_display_name(), "Léa Durand");

        relance.client_entreprise = Some("Durand SARL".into());
        assert_eq!(relance.client_display_name(), "Durand SARL");

        relance.client_entreprise = None;
        relance.client_prenom = None;
        assert_eq!(relance.client_display_name(), "Durand");
    }
}
