use {
    super::error::CheckoutError,
    super::id::OrderId,
    super::money::Money,
    super::order::OrderStatus,
    std::{future::Future, pin::Pin},
};

pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CheckoutError>> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct CreateRemoteOrder {
    pub order_id: OrderId,
    pub money: Money,
    pub customer: CustomerDetails,
}

impl CreateRemoteOrder {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if !self.money.amount().is_positive() {
            return Err(CheckoutError::Validation(
                "gateway order amount must be greater than zero".into(),
            ));
        }
        let c = &self.customer;
        for (field, value) in [
            ("customer_id", &c.customer_id),
            ("customer_name", &c.name),
            ("customer_email", &c.email),
            ("customer_phone", &c.phone),
        ] {
            if value.trim().is_empty() {
                return Err(CheckoutError::Validation(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

/// What the gateway hands back after a hosted-checkout order is created.
#[derive(Debug, Clone)]
pub struct RemoteOrder {
    pub cf_order_id: Option<String>,
    pub order_id: String,
    pub payment_session_id: String,
    pub order_status: String,
    pub order_expiry_time: Option<String>,
    /// Checkout base URL + session id; the only redirect target for the browser.
    pub payment_url: String,
}

#[derive(Debug, Clone)]
pub struct RemoteOrderStatus {
    pub cf_order_id: Option<String>,
    pub order_id: String,
    pub order_status: String,
    /// Present while the order can still be paid.
    pub payment_session_id: Option<String>,
    pub raw: serde_json::Value,
}

/// One payment attempt against a gateway order.
#[derive(Debug, Clone)]
pub struct RemotePayment {
    pub cf_payment_id: Option<String>,
    pub payment_status: String,
    pub payment_time: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct CreateRemoteRefund {
    pub order_id: OrderId,
    pub refund_id: String,
    pub money: Money,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RemoteRefund {
    pub refund_id: String,
    pub refund_status: String,
    pub raw: serde_json::Value,
}

/// The gateway's authoritative answer for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVerdict {
    /// `None` while the gateway has not settled the order.
    pub status: Option<OrderStatus>,
    pub transaction_id: Option<String>,
    pub response: serde_json::Value,
}

impl RemoteVerdict {
    pub fn from_remote(order: &RemoteOrderStatus, payments: &[RemotePayment]) -> Self {
        let response = serde_json::json!({
            "order": order.raw,
            "payments": payments.iter().map(|p| p.raw.clone()).collect::<Vec<_>>(),
        });

        let success = payments
            .iter()
            .find(|p| p.payment_status.eq_ignore_ascii_case("SUCCESS"));

        let status = match order.order_status.to_ascii_uppercase().as_str() {
            "PAID" => Some(OrderStatus::Paid),
            "EXPIRED" | "TERMINATED" | "TERMINATION_REQUESTED" => Some(OrderStatus::Failed),
            _ if success.is_some() => Some(OrderStatus::Paid),
            _ => payments
                .iter()
                .max_by(|a, b| a.payment_time.cmp(&b.payment_time))
                .filter(|latest| {
                    matches!(
                        latest.payment_status.to_ascii_uppercase().as_str(),
                        "FAILED" | "CANCELLED" | "USER_DROPPED" | "VOID"
                    )
                })
                .map(|_| OrderStatus::Failed),
        };

        let transaction_id = match status {
            Some(OrderStatus::Paid) => success.and_then(|p| p.cf_payment_id.clone()),
            _ => None,
        };

        Self {
            status,
            transaction_id,
            response,
        }
    }
}

pub trait PaymentGateway: Send + Sync {
    /// Path segment the HTTP surface uses for this gateway.
    fn name(&self) -> &'static str;

    /// Hosted checkout page for a session id.
    fn payment_url(&self, payment_session_id: &str) -> String;

    fn create_order<'a>(&'a self, request: &'a CreateRemoteOrder) -> GatewayFuture<'a, RemoteOrder>;

    fn fetch_order<'a>(&'a self, order_id: &'a OrderId) -> GatewayFuture<'a, RemoteOrderStatus>;

    fn fetch_payments<'a>(&'a self, order_id: &'a OrderId)
    -> GatewayFuture<'a, Vec<RemotePayment>>;

    fn create_refund<'a>(
        &'a self,
        request: &'a CreateRemoteRefund,
    ) -> GatewayFuture<'a, RemoteRefund>;
}
