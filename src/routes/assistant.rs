use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{ApiError, ApiResponse},
    middleware::{
        auth::Caller,
        rate_limit::check_rate_limit,
        validated_json::{from_value, ValidatedJson},
    },
    routes::{clients, conditions, devis, factures, rdv, relances},
    services::{
        assistant::{Action, Assistant},
        metrics::ASSISTANT_ACTIONS_COUNTER,
    },
    AppState,
};

const RATE_LIMIT_WINDOW_SECS: u64 = 60;

#[derive(Debug, Deserialize, Validate)]
pub struct AssistantRequest {
    #[validate(length(min = 1, max = 128))]
    pub action: String,
    pub tenant_id: Uuid,
    #[serde(default)]
    pub payload: Value,
}

pub async fn charlie(
    state: State<AppState>,
    caller: Caller,
    ValidatedJson(body): ValidatedJson<AssistantRequest>,
) -> Result<ApiResponse, ApiError> {
    route(Assistant::Charlie, state, caller, body).await
}

pub async fn leo(
    state: State<AppState>,
    caller: Caller,
    ValidatedJson(body): ValidatedJson<AssistantRequest>,
) -> Result<ApiResponse, ApiError> {
    route(Assistant::Leo, state, caller, body).await
}

/// The payload object with the router's `tenant_id` forced into it.
pub fn merge_tenant(payload: Value, tenant_id: Uuid) -> Result<Value, ApiError> {
    let mut object = match payload {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        _ => return Err(ApiError::validation("`payload` doit être un objet JSON")),
    };
    object.insert("tenant_id".into(), json!(tenant_id));
    Ok(Value::Object(object))
}

fn unknown_action(raw: &str) -> ApiError {
    ApiError::Rule {
        code: "UNKNOWN_ACTION",
        message: format!("Action inconnue : {raw}"),
        details: Some(json!({ "actions": Action::canonical_names() })),
    }
}

async fn route(
    assistant: Assistant,
    State(state): State<AppState>,
    caller: Caller,
    body: AssistantRequest,
) -> Result<ApiResponse, ApiError> {
    let action = Action::resolve(&body.action).ok_or_else(|| unknown_action(&body.action))?;
    let payload = merge_tenant(body.payload, body.tenant_id)?;

    if let Some(mut redis) = state.redis.clone() {
        let key = format!("rate:assistant:{}", body.tenant_id);
        check_rate_limit(
            &mut redis,
            &key,
            state.config.assistant_rate_limit,
            RATE_LIMIT_WINDOW_SECS,
        )
        .await?;
    }

    ASSISTANT_ACTIONS_COUNTER
        .with_label_values(&[assistant.as_str(), action.endpoint()])
        .inc();
    tracing::info!(
        assistant = assistant.as_str(),
        requested = %body.action,
        action = action.endpoint(),
        tenant_id = %body.tenant_id,
        "Assistant action"
    );

    dispatch(action, State(state), caller, payload).await
}

/// Runs the same handler the direct endpoint would.
async fn dispatch(
    action: Action,
    state: State<AppState>,
    caller: Caller,
    payload: Value,
) -> Result<ApiResponse, ApiError> {
    match action {
        Action::CreateClient => {
            clients::create_client(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::SearchClient => {
            clients::search_client(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::CreateDevis => {
            devis::create_devis(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::AddLigneDevis => {
            devis::add_ligne_devis(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::GetDevis => devis::get_devis(state, caller, ValidatedJson(from_value(payload)?)).await,
        Action::CreateFactureFromDevis => {
            factures::create_facture_from_devis(state, caller, ValidatedJson(from_value(payload)?))
                .await
        }
        Action::ListFactures => {
            factures::list_factures(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::UpdateFactureStatut => {
            factures::update_facture_statut(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::ListConditionsPaiement => {
            conditions::list_conditions(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::CreateConditionPaiement => {
            conditions::create_condition(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::ListRelances => {
            relances::list_relances(state, caller, ValidatedJson(from_value(payload)?)).await
        }
        Action::CreateRdv => rdv::create_rdv(state, caller, ValidatedJson(from_value(payload)?)).await,
        Action::ListRdv => rdv::list_rdv(state, caller, ValidatedJson(from_value(payload)?)).await,
    }
}
