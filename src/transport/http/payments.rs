use {
    super::{
        errors::ApiError,
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    crate::{
        AppState,
        domain::{
            error::CheckoutError,
            id::{OrderId, OrderIdAliases},
        },
        services::checkout::{self, CheckoutOutcome, CheckoutRequest, VerifiedOrder},
    },
    axum::{
        Json,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
};

fn ensure_gateway(state: &AppState, gateway: &str) -> Result<(), CheckoutError> {
    if gateway != state.gateway.name() {
        return Err(CheckoutError::NotFound(format!("unknown gateway: {gateway}")));
    }
    Ok(())
}

fn outcome_response(outcome: CheckoutOutcome) -> Response {
    match outcome {
        CheckoutOutcome::Redirect {
            order_id,
            payment_session_id,
            payment_url,
        } => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "orderId": order_id,
                "paymentSessionId": payment_session_id,
                "paymentUrl": payment_url,
            })),
        )
            .into_response(),
        CheckoutOutcome::GatewayUnavailable { order_id, error } => {
            tracing::warn!(order_id = %order_id, error = %error, "checkout needs retry");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({
                    "error_code": "gateway_error",
                    "message": "payment gateway unavailable, please try again",
                    "error": "payment gateway unavailable, please try again",
                    "orderId": order_id,
                    "retry": true,
                })),
            )
                .into_response()
        }
    }
}

fn verified_response(verified: VerifiedOrder) -> Json<serde_json::Value> {
    let order = &verified.order;
    Json(serde_json::json!({
        "verified": verified.payment_verified,
        "clearCart": verified.clear_cart,
        "orderId": order.order_id,
        "orderStatus": order.status,
        "transactionId": order.transaction_id,
        "gatewayResponse": order.gateway_response,
        "order": order,
    }))
}

#[tracing::instrument(name = "checkout", skip_all, fields(order_id = tracing::field::Empty))]
pub async fn checkout_handler(
    State(state): State<AppState>,
    ApiPath(gateway): ApiPath<String>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Response, ApiError> {
    ensure_gateway(&state, &gateway)?;
    let outcome = checkout::initiate_checkout(&state.pool, &*state.gateway, request).await?;
    tracing::Span::current().record("order_id", tracing::field::display(outcome.order_id()));
    Ok(outcome_response(outcome))
}

#[tracing::instrument(name = "checkout_retry", skip_all, fields(order_id = %order_id))]
pub async fn retry_handler(
    State(state): State<AppState>,
    ApiPath((gateway, order_id)): ApiPath<(String, String)>,
) -> Result<Response, ApiError> {
    ensure_gateway(&state, &gateway)?;
    let order_id =
        OrderId::new(&order_id).map_err(|_| CheckoutError::NotFound(format!("order {order_id}")))?;
    let outcome = checkout::retry_checkout(&state.pool, &*state.gateway, &order_id).await?;
    Ok(outcome_response(outcome))
}

async fn verify(
    state: &AppState,
    gateway: &str,
    aliases: &OrderIdAliases,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_gateway(state, gateway)?;
    if let Some(id) = aliases.resolve() {
        tracing::Span::current().record("order_id", id);
    }
    let verified = checkout::verify_and_fetch(
        &state.pool,
        &*state.gateway,
        &*state.dispatcher,
        aliases,
    )
    .await
    .map_err(ApiError::verification)?;
    Ok(verified_response(verified))
}

#[tracing::instrument(name = "verify", skip_all, fields(order_id = tracing::field::Empty))]
pub async fn verify_handler(
    State(state): State<AppState>,
    ApiPath(gateway): ApiPath<String>,
    ApiJson(aliases): ApiJson<OrderIdAliases>,
) -> Result<Json<serde_json::Value>, ApiError> {
    verify(&state, &gateway, &aliases).await
}

/// The browser lands here from the hosted checkout page.
#[tracing::instrument(name = "payment_return", skip_all, fields(order_id = tracing::field::Empty))]
pub async fn return_handler(
    State(state): State<AppState>,
    ApiPath(gateway): ApiPath<String>,
    ApiQuery(aliases): ApiQuery<OrderIdAliases>,
) -> Result<Json<serde_json::Value>, ApiError> {
    verify(&state, &gateway, &aliases).await
}
