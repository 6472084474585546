use axum::{
    Json,
    Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::AppState;
use crate::error::{ActionError, ApiError};
use crate::model::{Label, ModelVariant, TableKind};
use crate::review;
use crate::session::validate_session_id;
use crate::table;
use crate::types::{
    ClearRequest, HealthResponse, ModelQuery, ModelRequest, OkResponse, OverrideLabelRequest,
    PullDataRequest, ResultsResponse, StatusResponse,
};


pub async fn healthy() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Video Review Pipeline API is running".to_string(),
    })
}


fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_model(name: &str) -> Result<ModelVariant, ApiError> {
    ModelVariant::from_name(name).ok_or_else(|| ApiError::validation("Invalid model name"))
}

/// Shared check for every endpoint taking `uuid` + `model`.
fn session_and_model(
    uuid: &Option<String>,
    model: &Option<String>,
) -> Result<(String, ModelVariant), ApiError> {
    let (Some(uuid), Some(model)) = (present(uuid), present(model)) else {
        return Err(ApiError::validation("Missing uuid or model"));
    };
    let model = parse_model(model)?;
    validate_session_id(uuid)?;
    Ok((uuid.to_string(), model))
}

fn parse_days_back(value: Option<&serde_json::Value>) -> Result<u64, ApiError> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Err(ApiError::validation("Missing uuid or days_back"));
    };
    value
        .as_u64()
        .filter(|days| *days >= 1)
        .ok_or_else(|| ApiError::validation("days_back must be a positive integer"))
}

async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

fn label_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}


pub async fn pull_data_handler(
    State(state): State<AppState>,
    payload: Result<Json<PullDataRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ActionError> {
    let req = json_body(payload)?;
    let Some(uuid) = present(&req.uuid).map(str::to_string) else {
        return Err(ApiError::validation("Missing uuid or days_back").into());
    };
    let days_back = parse_days_back(req.days_back.as_ref())?;
    validate_session_id(&uuid)?;

    let _guards = state.locks.acquire_session(&uuid).await;
    let store = state.store.clone();
    let session = uuid.clone();
    blocking(move || {
        for model in ModelVariant::ALL {
            store.ensure_model_dir(&session, model)?;
        }
        Ok(())
    })
    .await?;

    info!("Data pull completed for UUID {}, {} days back", uuid, days_back);
    Ok(Json(OkResponse::ok()))
}


async fn generate_table(
    state: AppState,
    payload: Result<Json<ModelRequest>, JsonRejection>,
    kind: TableKind,
) -> Result<Json<OkResponse>, ActionError> {
    let req = json_body(payload)?;
    let (uuid, model) = session_and_model(&req.uuid, &req.model)?;

    let _guard = state.locks.acquire(&uuid, model).await;
    let path = state.store.table_path(&uuid, model, kind);
    let (rows, seed) = (state.rows, state.seed);
    blocking(move || table::generate(kind, &path, rows, &mut label_rng(seed))).await?;

    info!("{} CSV created for UUID {}, model {}", kind.name(), uuid, model);
    Ok(Json(OkResponse::ok()))
}

pub async fn make_video_description_handler(
    State(state): State<AppState>,
    payload: Result<Json<ModelRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ActionError> {
    generate_table(state, payload, TableKind::VideoDescription).await
}

pub async fn make_product_info_handler(
    State(state): State<AppState>,
    payload: Result<Json<ModelRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ActionError> {
    generate_table(state, payload, TableKind::ProductInfo).await
}

pub async fn judge_handler(
    State(state): State<AppState>,
    payload: Result<Json<ModelRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ActionError> {
    generate_table(state, payload, TableKind::Judgement).await
}


pub async fn status_handler(
    State(state): State<AppState>,
    query: Result<Query<ModelQuery>, QueryRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let (uuid, model) = session_and_model(&query.uuid, &query.model)?;

    let store = state.store.clone();
    let status = blocking(move || Ok(review::status(&store, &uuid, model))).await?;
    Ok(Json(status))
}


pub async fn results_handler(
    State(state): State<AppState>,
    query: Result<Query<ModelQuery>, QueryRejection>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let (uuid, model) = session_and_model(&query.uuid, &query.model)?;

    let _guard = state.locks.acquire(&uuid, model).await;
    let store = state.store.clone();
    let results = blocking(move || review::aggregate(&store, &uuid, model)).await?;
    Ok(Json(results))
}


pub async fn override_label_handler(
    State(state): State<AppState>,
    payload: Result<Json<OverrideLabelRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ActionError> {
    let req = json_body(payload)?;
    let (Some(_), Some(_), Some(product_id), Some(new_label)) = (
        present(&req.uuid),
        present(&req.model),
        present(&req.product_id),
        present(&req.new_label),
    ) else {
        return Err(ApiError::validation("Missing required parameters").into());
    };
    let (uuid, model) = session_and_model(&req.uuid, &req.model)?;
    let new_label =
        Label::from_name(new_label).ok_or_else(|| ApiError::validation("Invalid label"))?;
    let product_id = product_id.to_string();

    let _guard = state.locks.acquire(&uuid, model).await;
    let store = state.store.clone();
    let session = uuid.clone();
    let target = product_id.clone();
    let matched = blocking(move || {
        review::override_label(&store, &session, model, &target, new_label)
    })
    .await?;

    info!(
        "Label override completed for product {} to {} ({} rows, UUID {}, model {})",
        product_id,
        new_label.as_str(),
        matched,
        uuid,
        model
    );
    Ok(Json(OkResponse::ok()))
}


pub async fn clear_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClearRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ActionError> {
    let req = json_body(payload)?;
    let Some(uuid) = present(&req.uuid).map(str::to_string) else {
        return Err(ApiError::validation("Missing uuid").into());
    };
    validate_session_id(&uuid)?;

    let _guards = state.locks.acquire_session(&uuid).await;
    let store = state.store.clone();
    let session = uuid.clone();
    let removed = blocking(move || Ok(store.clear_session(&session)?)).await?;

    if removed {
        info!("Cleared all data for UUID {}", uuid);
    }
    Ok(Json(OkResponse::ok()))
}


pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pull_data", post(pull_data_handler))
        .route("/make_video_description", post(make_video_description_handler))
        .route("/make_product_info", post(make_product_info_handler))
        .route("/judge", post(judge_handler))
        .route("/status", get(status_handler))
        .route("/results", get(results_handler))
        .route("/override_label", post(override_label_handler))
        .route("/clear", post(clear_handler))
        .route("/health", get(healthy))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_and_model_requires_both() {
        let err = session_and_model(&Some("s1".into()), &None).unwrap_err();
        assert_eq!(err.to_string(), "Missing uuid or model");

        let err = session_and_model(&Some("".into()), &Some("qwen_video_image_raw".into()))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing uuid or model");
    }

    #[test]
    fn test_session_and_model_rejects_unknown_model() {
        let err = session_and_model(&Some("s1".into()), &Some("gpt_video".into())).unwrap_err();
        assert_eq!(err.to_string(), "Invalid model name");
    }

    #[test]
    fn test_session_and_model_rejects_unsafe_session() {
        let err = session_and_model(&Some("../x".into()), &Some("qwen_video_image_raw".into()))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_session_and_model_ok() {
        let (uuid, model) =
            session_and_model(&Some("abc-123".into()), &Some("smol_CoT_video_image_raw".into()))
                .unwrap();
        assert_eq!(uuid, "abc-123");
        assert_eq!(model, ModelVariant::SmolCotVideoImageRaw);
    }

    #[test]
    fn test_parse_days_back() {
        assert_eq!(parse_days_back(Some(&json!(7))).unwrap(), 7);
        assert!(parse_days_back(None).is_err());
        assert!(parse_days_back(Some(&json!(null))).is_err());
        assert!(parse_days_back(Some(&json!(0))).is_err());
        assert!(parse_days_back(Some(&json!(-3))).is_err());
        assert!(parse_days_back(Some(&json!(1.5))).is_err());
        assert!(parse_days_back(Some(&json!("7"))).is_err());
    }

    #[test]
    fn test_label_rng_is_deterministic_with_seed() {
        use rand::Rng;
        let a: u64 = label_rng(Some(3)).gen_range(0..1000);
        let b: u64 = label_rng(Some(3)).gen_range(0..1000);
        assert_eq!(a, b);
    }
}
