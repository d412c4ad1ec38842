use axum::extract::State;

use crate::{
    error::{ApiError, ApiResponse},
    middleware::{auth::Caller, validated_json::ValidatedJson},
    models::client::{CreateClientRequest, SearchClientRequest},
    services::clients::ClientService,
    AppState,
};

pub async fn create_client(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<CreateClientRequest>,
) -> Result<ApiResponse, ApiError> {
    let client = ClientService::create(&state.db, &body).await?;
    Ok(ApiResponse::created(&client)?.with_message(format!("Client {} créé", client.display_name())))
}

pub async fn search_client(
    State(state): State<AppState>,
    _caller: Caller,
    ValidatedJson(body): ValidatedJson<SearchClientRequest>,
) -> Result<ApiResponse, ApiError> {
    let clients = ClientService::search(&state.db, &body).await?;
    let message = match clients.len() {
        0 => "Aucun client trouvé".to_string(),
        1 => "1 client trouvé".to_string(),
        n => format!("{n} clients trouvés"),
    };
    Ok(ApiResponse::ok(&clients)?.with_message(message))
}
