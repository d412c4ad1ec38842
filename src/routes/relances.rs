use axum::extract::State;

use crate::{
    error::{ApiError, ApiResponse},
    middleware::{auth::Caller, validated_json::ValidatedJson},
    models::relance::ListRelancesRequest,
    services::relances::RelanceService,
    AppState,
};

pub async fn list_relances(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<ListRelancesRequest>,
) -> Result<ApiResponse, ApiError> {
    let relances = RelanceService::list(&state.db, &body).await?;
    ApiResponse::ok(&relances)
}
