use axum::extract::State;

use crate::{
    error::{ApiError, ApiResponse},
    middleware::{auth::Caller, validated_json::ValidatedJson},
    models::condition::{CreateConditionRequest, ListConditionsRequest},
    services::conditions::ConditionService,
    AppState,
};

pub async fn list_conditions(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<ListConditionsRequest>,
) -> Result<ApiResponse, ApiError> {
    let templates = ConditionService::list(&state.db, body.tenant_id).await?;
    ApiResponse::ok(&templates)
}

pub async fn create_condition(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<CreateConditionRequest>,
) -> Result<ApiResponse, ApiError> {
    let template = ConditionService::create(&state.db, &body).await?;
    Ok(ApiResponse::created(&template)?.with_message(format!("Conditions « {} » créées", template.nom)))
}
