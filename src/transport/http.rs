pub mod deliveries;
pub mod errors;
pub mod extract;
pub mod orders;
pub mod payments;
pub mod returns;

use {
    crate::AppState,
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    std::time::Duration,
    tower_http::timeout::TimeoutLayer,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/api/payments/{gateway}/checkout",
            post(payments::checkout_handler),
        )
        .route(
            "/api/payments/{gateway}/checkout/{order_id}/retry",
            post(payments::retry_handler),
        )
        .route("/api/payments/{gateway}/verify", post(payments::verify_handler))
        .route("/api/payments/{gateway}/return", get(payments::return_handler))
        .route("/api/payment-orders/{order_id}", get(orders::get_order_handler))
        .route(
            "/api/payment-orders/{order_id}/refund",
            post(orders::refund_handler),
        )
        .route("/api/returns", post(returns::submit_return_handler))
        .route(
            "/api/returns/rental/{rental_id}",
            get(returns::get_return_handler),
        )
        .route(
            "/api/deliveries/order/{order_id}",
            get(deliveries::delivery_by_order_handler),
        )
        .route(
            "/api/deliveries/{delivery_id}/tracking",
            get(deliveries::tracking_events_handler).post(deliveries::record_tracking_handler),
        )
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
