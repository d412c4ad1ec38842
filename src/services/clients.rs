use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::client::{Client, CreateClientRequest, SearchClientRequest},
    services::tenants::TenantService,
};

const DEFAULT_SEARCH_LIMIT: i64 = 10;

/// How a free-text client query is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Query contains `@`: case-insensitive match on email only.
    Email(String),
    /// Digits and phone punctuation only: match on normalized phone digits.
    Phone(String),
    /// Anything else: match on name fields.
    Name(String),
}

impl SearchMode {
    pub fn classify(query: &str) -> Option<Self> {
        let q = query.trim();
        if q.is_empty() {
            return None;
        }

        if q.contains('@') {
            return Some(SearchMode::Email(q.to_lowercase()));
        }

        let phone_like = q
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '.' | '-' | '(' | ')' | '/'));
        if phone_like && q.chars().any(|c| c.is_ascii_digit()) {
            return Some(SearchMode::Phone(normalize_phone(q)));
        }

        Some(SearchMode::Name(q.to_string()))
    }
}

/// Keeps the digits; longer numbers are cut to their last nine so that
/// `+33 6 12 34 56 78` and `06 12 34 56 78` compare equal.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > 9 {
        digits[digits.len() - 9..].to_string()
    } else {
        digits
    }
}

/// `%term%` with LIKE metacharacters escaped.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

pub struct ClientService;

impl ClientService {
    pub async fn find(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Option<Client>, ApiError> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(client)
    }

    pub async fn require(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Client, ApiError> {
        Self::find(pool, tenant_id, id)
            .await?
            .ok_or_else(|| ApiError::not_found("CLIENT_NOT_FOUND", format!("Client {id} introuvable")))
    }

    pub async fn create(pool: &PgPool, req: &CreateClientRequest) -> Result<Client, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;

        let client = sqlx::query_as::<_, Client>(
            "INSERT INTO clients
                (tenant_id, nom, prenom, entreprise, email, telephone, adresse, code_postal, ville)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(req.tenant_id)
        .bind(req.nom.trim())
        .bind(&req.prenom)
        .bind(&req.entreprise)
        .bind(req.email.as_deref().map(str::to_lowercase))
        .bind(&req.telephone)
        .bind(&req.adresse)
        .bind(&req.code_postal)
        .bind(&req.ville)
        .fetch_one(pool)
        .await?;

        tracing::info!(tenant_id = %req.tenant_id, client_id = %client.id, "Client created");
        Ok(client)
    }

    pub async fn search(pool: &PgPool, req: &SearchClientRequest) -> Result<Vec<Client>, ApiError> {
        let mode = SearchMode::classify(&req.query)
            .ok_or_else(|| ApiError::validation("La recherche ne peut pas être vide"))?;
        TenantService::require_active(pool, req.tenant_id).await?;

        let limit = req.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let (condition, term) = match &mode {
            SearchMode::Email(email) => ("LOWER(email) LIKE $2", contains_pattern(email)),
            SearchMode::Phone(digits) => (
                "regexp_replace(COALESCE(telephone, ''), '[^0-9]', '', 'g') LIKE $2",
                contains_pattern(digits),
            ),
            SearchMode::Name(name) => (
                "(nom ILIKE $2
                  OR prenom ILIKE $2
                  OR entreprise ILIKE $2
                  OR (prenom || ' ' || nom) ILIKE $2
                  OR (nom || ' ' || prenom) ILIKE $2)",
                contains_pattern(name),
            ),
        };

        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT * FROM clients
             WHERE tenant_id = $1 AND {condition}
             ORDER BY nom, prenom
             LIMIT $3"
        ))
        .bind(req.tenant_id)
        .bind(term)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        tracing::debug!(tenant_id = %req.tenant_id, ?mode, found = clients.len(), "Client search");
        Ok(clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_with_at_sign_searches_email() {
        assert_eq!(
            SearchMode::classify("a@b.com"),
            Some(SearchMode::Email("a@b.com".into()))
        );
        assert_eq!(
            SearchMode::classify("  Jean.Dupont@Exemple.FR "),
            Some(SearchMode::Email("jean.dupont@exemple.fr".into()))
        );
    }

    #[test]
    fn digits_and_punctuation_search_phone() {
        assert_eq!(
            SearchMode::classify("+33 6 12 34 56 78"),
            Some(SearchMode::Phone("612345678".into()))
        );
        assert_eq!(
            SearchMode::classify("06.12.34.56.78"),
            Some(SearchMode::Phone("612345678".into()))
        );
        assert_eq!(
            SearchMode::classify("(01) 23-45"),
            Some(SearchMode::Phone("012345".into()))
        );
    }

    #[test]
    fn everything_else_searches_names() {
        assert_eq!(
            SearchMode::classify("Jean Dupont"),
            Some(SearchMode::Name("Jean Dupont".into()))
        );
        // punctuation without digits is not a phone number
        assert_eq!(SearchMode::classify("--"), Some(SearchMode::Name("--".into())));
        assert_eq!(
            SearchMode::classify("Maçonnerie 2000"),
            Some(SearchMode::Name("Maçonnerie 2000".into()))
        );
    }

    #[test]
    fn blank_query_has_no_mode() {
        assert_eq!(SearchMode::classify("   "), None);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
