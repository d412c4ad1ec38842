use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::{
    db::numbering::{next_numero, DocumentKind},
    error::ApiError,
    middleware::validated_json::from_value,
    models::{
        client::Client,
        devis::{
            AddLignesRequest, CreateDevisRequest, Devis, DevisDetail, DevisStatus, GetDevisRequest,
            LigneDevis, LignesAjoutees, NouvelleLigne,
        },
    },
    services::{
        clients::ClientService, conditions::ConditionService, factures::FactureService,
        metrics::QUOTES_COUNTER, tenants::TenantService,
    },
};

const MAX_LIGNES_PER_BATCH: usize = 200;
const DEFAULT_TVA_PCT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// A quote named either by its UUID or by its human numero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevisRef {
    Id(Uuid),
    Numero(String),
}

impl DevisRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match Uuid::parse_str(raw) {
            Ok(id) => DevisRef::Id(id),
            Err(_) => DevisRef::Numero(raw.to_uppercase()),
        }
    }
}

pub fn default_titre(client: &Client, date: NaiveDate) -> String {
    format!("Devis {} - {}", client.display_name(), date.format("%d/%m/%Y"))
}

pub fn default_description(client: &Client, date: NaiveDate) -> String {
    format!("Devis pour {} du {}", client.display_name(), date.format("%d/%m/%Y"))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Validates the raw `lignes` field of a batch insert.
pub fn parse_lignes(raw: &Value) -> Result<Vec<NouvelleLigne>, ApiError> {
    let items = match raw {
        Value::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(ApiError::rule(
                "INVALID_LIGNES",
                "`lignes` doit être un tableau non vide",
            ))
        }
    };
    if items.len() > MAX_LIGNES_PER_BATCH {
        return Err(ApiError::validation(format!(
            "Au plus {MAX_LIGNES_PER_BATCH} lignes par envoi"
        )));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            from_value::<NouvelleLigne>(item.clone()).map_err(|e| match e {
                ApiError::Validation { message, details } => ApiError::Validation {
                    message: format!("Ligne {} : {message}", i + 1),
                    details,
                },
                other => other,
            })
        })
        .collect()
}

/// `ordre` values for `count` lines appended after `last_ordre`.
pub fn next_ordres(last_ordre: i32, count: usize) -> Vec<i32> {
    (1..).take(count).map(|n| last_ordre + n).collect()
}

pub struct DevisService;

impl DevisService {
    pub async fn resolve(pool: &PgPool, tenant_id: Uuid, raw: &str) -> Result<Devis, ApiError> {
        let devis = match DevisRef::parse(raw) {
            DevisRef::Id(id) => {
                sqlx::query_as::<_, Devis>("SELECT * FROM devis WHERE tenant_id = $1 AND id = $2")
                    .bind(tenant_id)
                    .bind(id)
                    .fetch_optional(pool)
                    .await?
            }
            DevisRef::Numero(numero) => {
                sqlx::query_as::<_, Devis>(
                    "SELECT * FROM devis WHERE tenant_id = $1 AND numero = $2",
                )
                .bind(tenant_id)
                .bind(numero)
                .fetch_optional(pool)
                .await?
            }
        };

        devis.ok_or_else(|| ApiError::not_found("DEVIS_NOT_FOUND", format!("Devis {raw} introuvable")))
    }

    pub async fn lines<'e>(
        db: impl PgExecutor<'e>,
        tenant_id: Uuid,
        devis_id: Uuid,
    ) -> Result<Vec<LigneDevis>, ApiError> {
        let lines = sqlx::query_as::<_, LigneDevis>(
            "SELECT * FROM lignes_devis
             WHERE tenant_id = $1 AND devis_id = $2
             ORDER BY ordre",
        )
        .bind(tenant_id)
        .bind(devis_id)
        .fetch_all(db)
        .await?;
        Ok(lines)
    }

    pub async fn create(pool: &PgPool, req: &CreateDevisRequest) -> Result<Devis, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;
        let client = ClientService::require(pool, req.tenant_id, req.client_id).await?;

        // No lines yet, so the template is picked for an amount of zero.
        let template = match req.template_id {
            Some(id) => Some(ConditionService::find(pool, req.tenant_id, id).await?.ok_or_else(
                || ApiError::not_found("TEMPLATE_NOT_FOUND", format!("Modèle {id} introuvable")),
            )?),
            None => ConditionService::select_for_amount(pool, req.tenant_id, Decimal::ZERO).await?,
        };

        let today = Local::now().date_naive();
        let titre = non_blank(req.titre.as_deref()).unwrap_or_else(|| default_titre(&client, today));
        let description = non_blank(req.description.as_deref())
            .unwrap_or_else(|| default_description(&client, today));

        let mut tx = pool.begin().await?;
        let numero = next_numero(&mut *tx, req.tenant_id, DocumentKind::Devis, today.year(), None).await?;

        let devis = sqlx::query_as::<_, Devis>(
            "INSERT INTO devis
                (tenant_id, client_id, numero, titre, description, statut, template_id, date_creation)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(req.tenant_id)
        .bind(client.id)
        .bind(&numero)
        .bind(&titre)
        .bind(&description)
        .bind(DevisStatus::Brouillon.as_str())
        .bind(template.as_ref().map(|t| t.id))
        .bind(today)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        QUOTES_COUNTER
            .with_label_values(&[&req.tenant_id.to_string()])
            .inc();
        tracing::info!(
            tenant_id = %req.tenant_id,
            devis_id = %devis.id,
            numero = %devis.numero,
            template = ?devis.template_id,
            "Quote created"
        );
        Ok(devis)
    }

    /// Appends lines after the current last `ordre` and refreshes the quote
    /// totals, all in one transaction.
    pub async fn add_lignes(pool: &PgPool, req: &AddLignesRequest) -> Result<LignesAjoutees, ApiError> {
        let nouvelles = parse_lignes(&req.lignes)?;
        TenantService::require_active(pool, req.tenant_id).await?;
        let devis = Self::resolve(pool, req.tenant_id, &req.devis_id).await?;

        let mut tx = pool.begin().await?;

        // Row lock on the quote serializes concurrent batches on the same quote.
        sqlx::query("SELECT id FROM devis WHERE id = $1 FOR UPDATE")
            .bind(devis.id)
            .execute(&mut *tx)
            .await?;

        let last_ordre: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(ordre), 0) FROM lignes_devis WHERE devis_id = $1",
        )
        .bind(devis.id)
        .fetch_one(&mut *tx)
        .await?;

        let mut lignes = Vec::with_capacity(nouvelles.len());
        for (ligne, ordre) in nouvelles.iter().zip(next_ordres(last_ordre, nouvelles.len())) {
            let inserted = sqlx::query_as::<_, LigneDevis>(
                "INSERT INTO lignes_devis
                    (tenant_id, devis_id, ordre, designation, quantite, unite, prix_unitaire_ht, tva_pct)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING *",
            )
            .bind(req.tenant_id)
            .bind(devis.id)
            .bind(ordre)
            .bind(ligne.designation.trim())
            .bind(ligne.quantite)
            .bind(ligne.unite.as_deref().unwrap_or("u"))
            .bind(ligne.prix_unitaire_ht)
            .bind(ligne.tva_pct.unwrap_or(DEFAULT_TVA_PCT))
            .fetch_one(&mut *tx)
            .await?;
            lignes.push(inserted);
        }

        sqlx::query(
            "UPDATE devis d SET
                montant_ht  = t.ht,
                montant_tva = t.tva,
                montant_ttc = t.ttc
             FROM (
                SELECT COALESCE(SUM(total_ht), 0)  AS ht,
                       COALESCE(SUM(total_tva), 0) AS tva,
                       COALESCE(SUM(total_ttc), 0) AS ttc
                FROM lignes_devis WHERE devis_id = $1
             ) t
             WHERE d.id = $1",
        )
        .bind(devis.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let total_ht: Decimal = lignes.iter().map(|l| l.total_ht).sum();
        let total_tva: Decimal = lignes.iter().map(|l| l.total_tva).sum();
        let total_ttc: Decimal = lignes.iter().map(|l| l.total_ttc).sum();

        tracing::info!(
            tenant_id = %req.tenant_id,
            devis_id = %devis.id,
            count = lignes.len(),
            first_ordre = last_ordre + 1,
            "Quote lines added"
        );

        Ok(LignesAjoutees {
            devis_id: devis.id,
            lignes,
            total_ht,
            total_tva,
            total_ttc,
        })
    }

    pub async fn get_detail(pool: &PgPool, req: &GetDevisRequest) -> Result<DevisDetail, ApiError> {
        TenantService::require_active(pool, req.tenant_id).await?;
        let devis = Self::resolve(pool, req.tenant_id, &req.devis_id).await?;
        let lignes = Self::lines(pool, req.tenant_id, devis.id).await?;
        let factures = FactureService::list_for_devis(pool, req.tenant_id, devis.id).await?;
        Ok(DevisDetail {
            devis,
            lignes,
            factures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn client(prenom: Option<&str>, entreprise: Option<&str>) -> Client {
        Client {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            nom: "Dupont".into(),
            prenom: prenom.map(String::from),
            entreprise: entreprise.map(String::from),
            email: None,
            telephone: None,
            adresse: None,
            code_postal: None,
            ville: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_or_non_array_lignes_are_rejected() {
        for raw in [json!([]), json!(null), json!({ "designation": "x" }), json!("lignes")] {
            let err = parse_lignes(&raw).unwrap_err();
            assert_eq!(err.code(), "INVALID_LIGNES", "input: {raw}");
        }
    }

    #[test]
    fn invalid_line_reports_its_position() {
        let raw = json!([
            { "designation": "Peinture", "quantite": 2, "prix_unitaire_ht": 35 },
            { "designation": "", "quantite": 1, "prix_unitaire_ht": 10 }
        ]);
        match parse_lignes(&raw).unwrap_err() {
            ApiError::Validation { message, .. } => assert!(message.starts_with("Ligne 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parses_valid_lines_with_decimal_strings() {
        let raw = json!([
            { "designation": "Placo BA13", "quantite": "12.5", "unite": "m2", "prix_unitaire_ht": "18.90", "tva_pct": 10 },
            { "designation": "Main d'oeuvre", "quantite": 8, "prix_unitaire_ht": 45 }
        ]);
        let lignes = parse_lignes(&raw).unwrap();
        assert_eq!(lignes.len(), 2);
        assert_eq!(lignes[0].quantite, dec!(12.5));
        assert_eq!(lignes[0].tva_pct, Some(dec!(10)));
        assert_eq!(lignes[1].tva_pct, None);
    }

    #[test]
    fn negative_quantity_is_a_validation_error() {
        let raw = json!([{ "designation": "Reprise", "quantite": -1, "prix_unitaire_ht": 10 }]);
        assert_eq!(parse_lignes(&raw).unwrap_err().code(), "VALIDATION_ERROR");
    }

    #[test]
    fn ordres_continue_after_previous_max() {
        assert_eq!(next_ordres(0, 3), vec![1, 2, 3]);
        assert_eq!(next_ordres(7, 2), vec![8, 9]);
        assert!(next_ordres(4, 0).is_empty());
    }

    #[test]
    fn devis_ref_accepts_uuid_or_numero() {
        let id = Uuid::new_v4();
        assert_eq!(DevisRef::parse(&id.to_string()), DevisRef::Id(id));
        assert_eq!(
            DevisRef::parse(" dev-2026-0004 "),
            DevisRef::Numero("DEV-2026-0004".into())
        );
    }

    #[test]
    fn default_titles_use_client_name_and_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(
            default_titre(&client(Some("Jean"), None), date),
            "Devis Jean Dupont - 09/03/2026"
        );
        assert_eq!(
            default_description(&client(None, Some("SCI Les Tilleuls")), date),
            "Devis pour SCI Les Tilleuls du 09/03/2026"
        );
        assert_eq!(non_blank(Some("   ")), None);
    }

    #[test]
    fn default_tva_is_twenty_percent() {
        assert_eq!(DEFAULT_TVA_PCT, dec!(20));
    }
}
