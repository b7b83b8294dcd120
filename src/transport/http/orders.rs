use {
    super::{
        errors::ApiError,
        extract::{ApiJson, ApiPath},
    },
    crate::{
        AppState,
        domain::{error::CheckoutError, id::OrderId, order::PaymentOrder},
        services::checkout,
    },
    axum::{
        Json,
        extract::State,
    },
    serde::Deserialize,
};

#[derive(Debug, Default, Deserialize)]
pub struct RefundBody {
    #[serde(default)]
    pub note: Option<String>,
}

fn parse_order_id(raw: &str) -> Result<OrderId, CheckoutError> {
    OrderId::new(raw).map_err(|_| CheckoutError::NotFound(format!("order {raw}")))
}

pub async fn get_order_handler(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<String>,
) -> Result<Json<PaymentOrder>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    Ok(Json(checkout::get_order(&state.pool, &order_id).await?))
}

#[tracing::instrument(name = "refund", skip_all, fields(order_id = %order_id))]
pub async fn refund_handler(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<String>,
    ApiJson(body): ApiJson<RefundBody>,
) -> Result<Json<PaymentOrder>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let order = checkout::refund_order(&state.pool, &*state.gateway, &order_id, body.note).await?;
    Ok(Json(order))
}
