use {
    super::error::CheckoutError,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Completed,
    EarlyReturn,
    Damaged,
    Lost,
}

impl ReturnReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::EarlyReturn => "early_return",
            Self::Damaged => "damaged",
            Self::Lost => "lost",
        }
    }

    /// Damaged and lost books go to a human for charge assessment.
    pub fn requires_assessment(&self) -> bool {
        matches!(self, Self::Damaged | Self::Lost)
    }
}

impl TryFrom<&str> for ReturnReason {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "completed" => Ok(Self::Completed),
            "early_return" => Ok(Self::EarlyReturn),
            "damaged" => Ok(Self::Damaged),
            "lost" => Ok(Self::Lost),
            other => Err(CheckoutError::Validation(format!(
                "unknown return reason: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMethod {
    Pickup,
    DropOff,
}

impl ReturnMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::DropOff => "drop_off",
        }
    }
}

impl TryFrom<&str> for ReturnMethod {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pickup" => Ok(Self::Pickup),
            "drop_off" => Ok(Self::DropOff),
            other => Err(CheckoutError::Validation(format!(
                "unknown return method: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnSubmission {
    pub rental_id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub book_id: Option<Uuid>,
    pub return_reason: ReturnReason,
    pub return_method: ReturnMethod,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub customer_notes: Option<String>,
}

impl ReturnSubmission {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.user_id.trim().is_empty() {
            return Err(CheckoutError::Validation("user id is required".into()));
        }
        let has_address = self
            .pickup_address
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());
        if self.return_method == ReturnMethod::Pickup && !has_address {
            return Err(CheckoutError::Validation(
                "pickup address is required for pickup returns".into(),
            ));
        }
        Ok(())
    }
}

/// Minimal view of a rental, owned by the catalog side.
#[derive(Debug, Clone)]
pub struct RentalRef {
    pub id: Uuid,
    pub user_id: String,
    pub book_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub user_id: String,
    pub book_id: Uuid,
    pub return_reason: ReturnReason,
    pub return_method: ReturnMethod,
    pub pickup_address: Option<String>,
    pub customer_notes: Option<String>,
    pub requires_assessment: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
