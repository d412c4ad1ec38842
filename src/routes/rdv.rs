use axum::extract::State;

use crate::{
    error::{ApiError, ApiResponse},
    middleware::{auth::Caller, validated_json::ValidatedJson},
    models::rdv::{CreateRdvRequest, ListRdvRequest},
    services::rdv::RdvService,
    AppState,
};

pub async fn create_rdv(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<CreateRdvRequest>,
) -> Result<ApiResponse, ApiError> {
    let rdv = RdvService::create(&state.db, &body).await?;
    let message = format!("RDV « {} » le {}", rdv.titre, rdv.date_debut.format("%d/%m/%Y à %H:%M"));
    Ok(ApiResponse::created(&rdv)?.with_message(message))
}

pub async fn list_rdv(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<ListRdvRequest>,
) -> Result<ApiResponse, ApiError> {
    let rdvs = RdvService::list(&state.db, &body).await?;
    ApiResponse::ok(&rdvs)
}
