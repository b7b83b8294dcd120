use {
    super::error::CheckoutError,
    super::id::OrderId,
    super::order::{CartItem, ShippingSnapshot},
    chrono::{DateTime, NaiveDate, Utc},
    serde::{Deserialize, Serialize},
    std::{fmt, future::Future, pin::Pin},
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    PickedUp,
    InTransit,
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
        }
    }

    /// Canonical ordering: pending < picked_up < in_transit < delivered.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::PickedUp => 1,
            Self::InTransit => 2,
            Self::Delivered => 3,
        }
    }

    /// Progress bar value shown on the tracking page.
    pub fn progress_percent(&self) -> u8 {
        match self {
            Self::Pending => 20,
            Self::PickedUp => 40,
            Self::InTransit => 70,
            Self::Delivered => 100,
        }
    }

    pub fn advances_to(&self, next: &DeliveryStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for DeliveryStatus {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "picked_up" => Ok(Self::PickedUp),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            other => Err(CheckoutError::Validation(format!(
                "unknown delivery status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: Uuid,
    pub order_id: OrderId,
    pub status: DeliveryStatus,
    pub tracking_number: String,
    pub estimated_delivery_date: NaiveDate,
    pub actual_delivery_date: Option<NaiveDate>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub landmark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub id: i64,
    pub delivery_id: Uuid,
    pub status: DeliveryStatus,
    pub description: String,
    pub location: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTrackingEvent {
    pub delivery_id: Uuid,
    pub status: DeliveryStatus,
    pub description: String,
    pub location: Option<String>,
}

impl NewTrackingEvent {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.description.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "tracking event description is required".into(),
            ));
        }
        Ok(())
    }
}

/// Everything the delivery side needs once an order is paid.
#[derive(Debug, Clone)]
pub struct DeliveryHandoff {
    pub order_id: OrderId,
    pub shipping: ShippingSnapshot,
    pub cart_items: Vec<CartItem>,
}

#[derive(Debug, Clone)]
pub struct DispatchedDelivery {
    pub delivery_id: Uuid,
    pub shiprocket_order_id: String,
    pub shiprocket_shipment_id: String,
}

pub type DispatchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<DispatchedDelivery, CheckoutError>> + Send + 'a>>;

pub trait DeliveryDispatcher: Send + Sync {
    /// Must be idempotent per order id.
    fn dispatch<'a>(&'a self, handoff: &'a DeliveryHandoff) -> DispatchFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_transit_is_seventy_percent() {
        assert_eq!(DeliveryStatus::InTransit.progress_percent(), 70);
    }

    #[test]
    fn progress_follows_canonical_order() {
        let all = [
            DeliveryStatus::Pending,
            DeliveryStatus::PickedUp,
            DeliveryStatus::InTransit,
            DeliveryStatus::Delivered,
        ];
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].progress_percent() < pair[1].progress_percent());
            assert!(pair[0].advances_to(&pair[1]));
            assert!(!pair[1].advances_to(&pair[0]));
        }
    }

    #[test]
    fn status_roundtrips_through_str() {
        for s in ["pending", "picked_up", "in_transit", "delivered"] {
            assert_eq!(DeliveryStatus::try_from(s).unwrap().as_str(), s);
        }
        assert!(DeliveryStatus::try_from("lost").is_err());
    }
}
