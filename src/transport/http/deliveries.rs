use {
    super::{
        errors::ApiError,
        extract::{ApiJson, ApiPath},
    },
    crate::{
        AppState,
        domain::delivery::{Delivery, DeliveryStatus, NewTrackingEvent, TrackingEvent},
        services::delivery,
    },
    axum::{
        Json,
        extract::State,
        http::StatusCode,
    },
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryView {
    #[serde(flatten)]
    delivery: Delivery,
    progress: u8,
}

#[derive(Debug, Deserialize)]
pub struct TrackingUpdate {
    pub status: DeliveryStatus,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecorded {
    event: TrackingEvent,
    delivery_status: DeliveryStatus,
    progress: u8,
}

pub async fn delivery_by_order_handler(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<String>,
) -> Result<Json<DeliveryView>, ApiError> {
    let delivery = delivery::get_delivery_by_order(&state.pool, &order_id).await?;
    let progress = delivery.status.progress_percent();
    Ok(Json(DeliveryView { delivery, progress }))
}

pub async fn tracking_events_handler(
    State(state): State<AppState>,
    ApiPath(delivery_id): ApiPath<Uuid>,
) -> Result<Json<Vec<TrackingEvent>>, ApiError> {
    Ok(Json(delivery::get_tracking_events(&state.pool, delivery_id).await?))
}

#[tracing::instrument(name = "tracking_update", skip_all, fields(delivery_id = %delivery_id))]
pub async fn record_tracking_handler(
    State(state): State<AppState>,
    ApiPath(delivery_id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<TrackingUpdate>,
) -> Result<(StatusCode, Json<TrackingRecorded>), ApiError> {
    let (event, delivery_status) = delivery::record_tracking_event(
        &state.pool,
        &NewTrackingEvent {
            delivery_id,
            status: update.status,
            description: update.description,
            location: update.location,
        },
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(TrackingRecorded {
            event,
            progress: delivery_status.progress_percent(),
            delivery_status,
        }),
    ))
}
