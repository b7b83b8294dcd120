use {
    crate::domain::error::CheckoutError,
    std::{env, str::FromStr},
};

const SANDBOX_API_BASE: &str = "https://sandbox.cashfree.com/pg";
const PRODUCTION_API_BASE: &str = "https://api.cashfree.com/pg";
const SANDBOX_CHECKOUT_BASE: &str = "https://payments-test.cashfree.com/order/#";
const PRODUCTION_CHECKOUT_BASE: &str = "https://payments.cashfree.com/order/#";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GatewayEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl GatewayEnvironment {
    pub fn api_base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_API_BASE,
            Self::Production => PRODUCTION_API_BASE,
        }
    }

    pub fn checkout_base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_CHECKOUT_BASE,
            Self::Production => PRODUCTION_CHECKOUT_BASE,
        }
    }
}

impl FromStr for GatewayEnvironment {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "sandbox" | "" => Ok(Self::Sandbox),
            other => Err(CheckoutError::Validation(format!(
                "GATEWAY_ENVIRONMENT must be production or sandbox, got: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub app_id: Option<String>,
    pub secret_key: Option<String>,
    pub environment: GatewayEnvironment,
    /// Where the gateway sends the browser back; `{order_id}` is substituted.
    pub return_url: Option<String>,
    /// Overrides the environment's API base. Used by tests.
    pub api_base_url: Option<String>,
}

impl GatewayConfig {
    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.api_base_url())
    }

    pub fn checkout_base_url(&self) -> &'static str {
        self.environment.checkout_base_url()
    }

    pub fn has_credentials(&self) -> bool {
        self.app_id.is_some() && self.secret_key.is_some()
    }

    pub fn from_env() -> Result<Self, CheckoutError> {
        Ok(Self {
            app_id: non_empty_var("GATEWAY_APP_ID"),
            secret_key: non_empty_var("GATEWAY_SECRET_KEY"),
            environment: env::var("GATEWAY_ENVIRONMENT")
                .unwrap_or_default()
                .parse()?,
            return_url: non_empty_var("GATEWAY_RETURN_URL"),
            api_base_url: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, CheckoutError> {
        let database_url = non_empty_var("DATABASE_URL")
            .ok_or_else(|| CheckoutError::Validation("DATABASE_URL must be set".into()))?;
        Ok(Self {
            database_url,
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            gateway: GatewayConfig::from_env()?,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
