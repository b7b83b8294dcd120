use {
    super::error::CheckoutError,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Amount in minor units (paise, cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoneyAmount(i64);

impl MoneyAmount {
    pub fn new(minor: i64) -> Result<Self, CheckoutError> {
        if minor < 0 {
            return Err(CheckoutError::Validation(format!(
                "MoneyAmount cannot be negative, got: {minor}"
            )));
        }
        Ok(Self(minor))
    }

    /// Converts a decimal major-unit amount (`499.00`) to minor units,
    /// rounding to the nearest minor unit.
    pub fn from_major(major: f64) -> Result<Self, CheckoutError> {
        if !major.is_finite() {
            return Err(CheckoutError::Validation(format!(
                "amount must be a finite number, got: {major}"
            )));
        }
        let minor = (major * 100.0).round();
        if minor > i64::MAX as f64 {
            return Err(CheckoutError::Validation("amount too large".into()));
        }
        Self::new(minor as i64)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: MoneyAmount) -> Option<MoneyAmount> {
        self.0.checked_add(other.0).map(MoneyAmount)
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Currency {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::Inr),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            _ => Err(CheckoutError::Validation(format!("unknown currency: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: MoneyAmount,
    currency: Currency,
}

impl Money {
    pub fn new(amount: MoneyAmount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_units_round_to_minor() {
        assert_eq!(MoneyAmount::from_major(499.0).unwrap().minor(), 49_900);
        assert_eq!(MoneyAmount::from_major(0.1 + 0.2).unwrap().minor(), 30);
    }

    #[test]
    fn negative_and_nan_rejected() {
        assert!(MoneyAmount::from_major(-1.0).is_err());
        assert!(MoneyAmount::from_major(f64::NAN).is_err());
    }

    #[test]
    fn display_has_two_decimals() {
        assert_eq!(MoneyAmount::new(49_905).unwrap().to_string(), "499.05");
    }

    #[test]
    fn currency_parse_is_case_insensitive() {
        assert_eq!(Currency::try_from("inr").unwrap(), Currency::Inr);
        assert!(Currency::try_from("jpy").is_err());
    }
}
