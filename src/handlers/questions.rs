// Question handlers
// HTTP handlers for question creation

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{debug, info};

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateQuestionRequest, CreateQuestionResponse},
    SharedStore,
};

/// Create a question together with its choices
/// POST /question/
///
/// Body rejections (bad JSON, missing or mistyped fields, wrong content type)
/// are answered with 422 and the failing field path. The question and all of
/// its choices are written in one transaction.
pub async fn create_question(
    State(store): State<SharedStore>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    request.validate().map_err(ApiError::Validation)?;
    debug!(choices = request.choice.len(), "question request validated");

    info!("Creating question with {} choices", request.choice.len());

    let created = store
        .create_question(&request.question_text, &request.choice)
        .await
        .map_err(ApiError::CreateQuestion)?;

    info!(
        "Successfully created question with id: {} ({} choices)",
        created.question.id,
        created.choices.len()
    );
    Ok((StatusCode::OK, Json(CreateQuestionResponse::created())))
}
