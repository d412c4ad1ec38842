use axum::extract::State;

use crate::{
    error::{ApiError, ApiResponse},
    middleware::{auth::Caller, validated_json::ValidatedJson},
    models::devis::{AddLignesRequest, CreateDevisRequest, GetDevisRequest},
    services::devis::DevisService,
    AppState,
};

pub async fn create_devis(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<CreateDevisRequest>,
) -> Result<ApiResponse, ApiError> {
    let devis = DevisService::create(&state.db, &body).await?;
    Ok(ApiResponse::created(&devis)?.with_message(format!("Devis {} créé", devis.numero)))
}

pub async fn add_ligne_devis(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<AddLignesRequest>,
) -> Result<ApiResponse, ApiError> {
    let added = DevisService::add_lignes(&state.db, &body).await?;
    let message = format!(
        "{} ligne(s) ajoutée(s), total TTC {} €",
        added.lignes.len(),
        added.total_ttc
    );
    Ok(ApiResponse::created(&added)?.with_message(message))
}

pub async fn get_devis(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<GetDevisRequest>,
) -> Result<ApiResponse, ApiError> {
    let detail = DevisService::get_detail(&state.db, &body).await?;
    ApiResponse::ok(&detail)
}
