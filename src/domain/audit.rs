use {super::id::OrderId, uuid::Uuid};

pub const PAYMENT_ORDER: &str = "payment_order";

/// One row of `audit_log`. Written in the same transaction as the change it
/// describes.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub id: Uuid,
    pub entity_type: String,
    /// Business id (`order_id`), not the row uuid.
    pub entity_id: String,
    pub action: String,
    pub actor: String,
    pub detail: serde_json::Value,
}

impl NewAuditEntry {
    pub fn for_order(
        order_id: &OrderId,
        actor: &str,
        action: &str,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            entity_type: PAYMENT_ORDER.to_string(),
            entity_id: order_id.as_str().to_string(),
            action: action.to_string(),
            actor: actor.to_string(),
            detail,
        }
    }
}
