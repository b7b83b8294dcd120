use {
    super::audit::NewAuditEntry,
    super::error::CheckoutError,
    super::id::OrderId,
    super::money::{Currency, Money, MoneyAmount},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Paid,
    Failed,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// `created → {paid, failed}`, `paid → refunded`. Nothing else.
    pub fn can_transition_to(&self, next: &OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Paid)
                | (Self::Created, Self::Failed)
                | (Self::Paid, Self::Refunded)
        )
    }

    /// Verification never moves an order out of these.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Created)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "created" => Ok(Self::Created),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(CheckoutError::Validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// One line of the cart as it looked at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    /// Unit price in major units, as shown to the customer.
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSnapshot {
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub landmark: Option<String>,
}

fn require(field: &str, value: &str) -> Result<(), CheckoutError> {
    if value.trim().is_empty() {
        return Err(CheckoutError::Validation(format!("{field} is required")));
    }
    Ok(())
}

impl CustomerSnapshot {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        require("customer name", &self.name)?;
        require("customer email", &self.email)?;
        require("customer phone", &self.phone)?;
        if !self.email.contains('@') {
            return Err(CheckoutError::Validation(format!(
                "customer email is malformed: {}",
                self.email
            )));
        }
        Ok(())
    }
}

impl ShippingSnapshot {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        require("shipping address", &self.address)?;
        require("shipping city", &self.city)?;
        require("shipping state", &self.state)?;
        require("shipping pincode", &self.pincode)
    }
}

pub fn validate_cart(items: &[CartItem]) -> Result<(), CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::Validation("cart is empty".into()));
    }
    for item in items {
        require("cart item id", &item.id)?;
        if item.quantity == 0 {
            return Err(CheckoutError::Validation(format!(
                "cart item {} has zero quantity",
                item.id
            )));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(CheckoutError::Validation(format!(
                "cart item {} has invalid price",
                item.id
            )));
        }
    }
    Ok(())
}

/// Full order record from DB (for reads).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub id: Uuid,
    pub order_id: OrderId,
    pub user_id: String,
    pub amount: MoneyAmount,
    pub currency: Currency,
    pub status: OrderStatus,
    pub customer: CustomerSnapshot,
    pub shipping: ShippingSnapshot,
    pub cart_items: Vec<CartItem>,
    pub payment_session_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub shiprocket_order_id: Option<String>,
    pub shiprocket_shipment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentOrder {
    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }

    /// Paid but never handed to delivery.
    pub fn awaits_delivery(&self) -> bool {
        self.status == OrderStatus::Paid && self.shiprocket_order_id.is_none()
    }
}

pub struct NewPaymentOrderParams {
    pub user_id: String,
    pub money: Money,
    pub customer: CustomerSnapshot,
    pub shipping: ShippingSnapshot,
    pub cart_items: Vec<CartItem>,
}

/// Insert-side order. Ids are generated here and nothing in it changes later.
#[derive(Debug, Clone)]
pub struct NewPaymentOrder {
    id: Uuid,
    order_id: OrderId,
    user_id: String,
    money: Money,
    customer: CustomerSnapshot,
    shipping: ShippingSnapshot,
    cart_items: Vec<CartItem>,
}

impl NewPaymentOrder {
    /// Validates every field before anything touches storage or the gateway.
    pub fn new(params: NewPaymentOrderParams) -> Result<Self, CheckoutError> {
        require("user id", &params.user_id)?;
        if !params.money.amount().is_positive() {
            return Err(CheckoutError::Validation(format!(
                "amount must be greater than zero, got: {}",
                params.money.amount()
            )));
        }
        params.customer.validate()?;
        params.shipping.validate()?;
        validate_cart(&params.cart_items)?;

        Ok(Self {
            id: Uuid::now_v7(),
            order_id: OrderId::generate(),
            user_id: params.user_id,
            money: params.money,
            customer: params.customer,
            shipping: params.shipping,
            cart_items: params.cart_items,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn money(&self) -> &Money {
        &self.money
    }

    pub fn customer(&self) -> &CustomerSnapshot {
        &self.customer
    }

    pub fn shipping(&self) -> &ShippingSnapshot {
        &self.shipping
    }

    pub fn cart_items(&self) -> &[CartItem] {
        &self.cart_items
    }

    pub fn audit_entry(&self, actor: &str, action: &str) -> NewAuditEntry {
        NewAuditEntry::for_order(
            &self.order_id,
            actor,
            action,
            serde_json::json!({
                "amount": self.money.amount().minor(),
                "currency": self.money.currency().as_str(),
                "items": self.cart_items.len(),
                "status": OrderStatus::Created.as_str(),
            }),
        )
    }
}

/// What reconciliation should do given the persisted status and the
/// gateway's verdict (`None` = gateway has not decided yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    Advance { from: OrderStatus, to: OrderStatus },
    SameStatus,
    Pending,
    Anomaly { current: OrderStatus, incoming: OrderStatus },
}

pub fn decide(current: OrderStatus, incoming: Option<OrderStatus>) -> ReconcileAction {
    match incoming {
        None => ReconcileAction::Pending,
        Some(incoming) if incoming == current => ReconcileAction::SameStatus,
        Some(incoming) if current.can_transition_to(&incoming) => ReconcileAction::Advance {
            from: current,
            to: incoming,
        },
        Some(incoming) => ReconcileAction::Anomaly { current, incoming },
    }
}

#[derive(Debug)]
pub enum ReconcileResult {
    /// Status moved forward in this call.
    Advanced { from: OrderStatus, to: OrderStatus },
    /// Persisted status already matches the verdict.
    Unchanged(OrderStatus),
    /// Gateway has no final verdict yet.
    Pending,
    /// Verdict contradicts a settled status; logged, status kept.
    Anomaly { current: OrderStatus, incoming: OrderStatus },
}
