pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;
pub mod transport;

use {
    domain::{delivery::DeliveryDispatcher, gateway::PaymentGateway},
    std::sync::Arc,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub dispatcher: Arc<dyn DeliveryDispatcher>,
}
