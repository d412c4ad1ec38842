use axum::extract::State;

use crate::{
    error::{ApiError, ApiResponse},
    middleware::{auth::Caller, validated_json::ValidatedJson},
    models::facture::{CreateFactureFromDevisRequest, ListFacturesRequest, UpdateFactureStatutRequest},
    services::factures::FactureService,
    AppState,
};

pub async fn create_facture_from_devis(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<CreateFactureFromDevisRequest>,
) -> Result<ApiResponse, ApiError> {
    let created = FactureService::create_from_devis(&state.db, &body).await?;
    let mut message = format!(
        "Facture {} ({}) créée : {} € TTC",
        created.facture.numero,
        created.facture.type_facture.label(),
        created.facture.montant_ttc
    );
    if !created.relances.is_empty() {
        message.push_str(&format!(", {} relance(s) planifiée(s)", created.relances.len()));
    }
    Ok(ApiResponse::created(&created)?.with_message(message))
}

pub async fn list_factures(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<ListFacturesRequest>,
) -> Result<ApiResponse, ApiError> {
    let factures = FactureService::list(&state.db, &body).await?;
    ApiResponse::ok(&factures)
}

pub async fn update_facture_statut(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<UpdateFactureStatutRequest>,
) -> Result<ApiResponse, ApiError> {
    let facture = FactureService::update_statut(&state.db, &body).await?;
    Ok(ApiResponse::ok(&facture)?
        .with_message(format!("Facture {} : {}", facture.numero, body.statut.as_str())))
}
