use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub nom: String,
    pub prenom: Option<String>,
    pub entreprise: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub code_postal: Option<String>,
    pub ville: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company name when there is one, otherwise "Prénom Nom".
pub fn display_name(nom: &str, prenom: Option<&str>, entreprise: Option<&str>) -> String {
    if let Some(entreprise) = entreprise.filter(|e| !e.trim().is_empty()) {
        return entreprise.to_string();
    }
    match prenom.filter(|p| !p.trim().is_empty()) {
        Some(prenom) => format!("{prenom} {nom}"),
        None => nom.to_string(),
    }
}

impl Client {
    pub fn display_name(&self) -> String {
        display_name(&self.nom, self.prenom.as_deref(), self.entreprise.as_deref())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub nom: String,
    #[validate(length(max = 128))]
    pub prenom: Option<String>,
    #[validate(length(max = 255))]
    pub entreprise: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    #[validate(length(max = 16))]
    pub code_postal: Option<String>,
    #[validate(length(max = 128))]
    pub ville: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchClientRequest {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub query: String,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<i64>,
}
