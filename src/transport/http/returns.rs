use {
    super::{
        errors::ApiError,
        extract::{ApiJson, ApiPath},
    },
    crate::{
        AppState,
        domain::returns::{ReturnRequest, ReturnSubmission},
        services::returns,
    },
    axum::{
        Json,
        extract::State,
        http::StatusCode,
    },
    uuid::Uuid,
};

#[tracing::instrument(name = "submit_return", skip_all, fields(rental_id = %submission.rental_id))]
pub async fn submit_return_handler(
    State(state): State<AppState>,
    ApiJson(submission): ApiJson<ReturnSubmission>,
) -> Result<(StatusCode, Json<ReturnRequest>), ApiError> {
    let request = returns::submit_return(&state.pool, &submission).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn get_return_handler(
    State(state): State<AppState>,
    ApiPath(rental_id): ApiPath<Uuid>,
) -> Result<Json<ReturnRequest>, ApiError> {
    Ok(Json(returns::get_return_by_rental(&state.pool, rental_id).await?))
}
