use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Non-success answer (or transport failure) from the payment provider.
    /// `status` is `None` when no HTTP response was received.
    #[error("gateway: status={status:?} body={body}")]
    Gateway { status: Option<u16>, body: String },

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CheckoutError {
    pub fn gateway(status: Option<u16>, body: impl Into<String>) -> Self {
        Self::Gateway {
            status,
            body: body.into(),
        }
    }

    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
    }
}
