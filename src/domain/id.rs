use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CheckoutError;

const ORDER_ID_MAX_LEN: usize = 45;

/// Correlation key shared by the local order row, the gateway order and the
/// return redirect (`order_<uuid v7>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn generate() -> Self {
        Self(format!("order_{}", Uuid::now_v7().simple()))
    }

    pub fn new(id: impl Into<String>) -> Result<Self, CheckoutError> {
        let id = id.into();
        let valid_chars = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if id.is_empty() || id.len() > ORDER_ID_MAX_LEN || !valid_chars {
            return Err(CheckoutError::Validation(format!(
                "OrderId must be 1-{ORDER_ID_MAX_LEN} chars of [A-Za-z0-9_-], got: {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Stable per order: a repeated refund request reaches the gateway
    /// under the same id and is deduplicated there.
    pub fn refund_id(&self) -> String {
        format!("refund_{}", self.0.strip_prefix("order_").unwrap_or(&self.0))
    }
}

/// The names the gateway may use for the order id on the return redirect.
/// Resolution order: `oid`, `order_id`, `orderId`, `cf_order_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderIdAliases {
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default, rename = "orderId")]
    pub order_id_camel: Option<String>,
    #[serde(default)]
    pub cf_order_id: Option<String>,
}

impl OrderIdAliases {
    pub fn from_order_id(id: &OrderId) -> Self {
        Self {
            order_id: Some(id.as_str().to_string()),
            ..Self::default()
        }
    }

    /// First non-empty alias wins.
    pub fn resolve(&self) -> Option<&str> {
        [
            &self.oid,
            &self.order_id,
            &self.order_id_camel,
            &self.cf_order_id,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .find(|v| !v.is_empty())
    }

    pub fn resolve_order_id(&self) -> Result<OrderId, CheckoutError> {
        let raw = self
            .resolve()
            .ok_or_else(|| CheckoutError::NotFound("no order id in request".into()))?;
        OrderId::new(raw).map_err(|_| CheckoutError::NotFound(format!("order {raw}")))
    }
}
