use {
    crate::{
        config::GatewayConfig,
        domain::{
            error::CheckoutError,
            gateway::{
                CreateRemoteOrder, CreateRemoteRefund, GatewayFuture, PaymentGateway, RemoteOrder,
                RemoteOrderStatus, RemotePayment, RemoteRefund,
            },
            id::OrderId,
        },
    },
    reqwest::{Client, Method, RequestBuilder},
    serde_json::Value,
    std::time::Duration,
};

const API_VERSION: &str = "2023-08-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Hosted-checkout client. One attempt per call, no retries.
pub struct CashfreeGateway {
    client: Client,
    config: GatewayConfig,
}

impl CashfreeGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, CheckoutError> {
        if !config.has_credentials() {
            tracing::warn!(
                environment = ?config.environment,
                "payment gateway credentials missing, remote calls will fail"
            );
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CheckoutError::gateway(None, format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, CheckoutError> {
        let (Some(app_id), Some(secret)) = (&self.config.app_id, &self.config.secret_key) else {
            return Err(CheckoutError::gateway(
                None,
                "gateway credentials not configured",
            ));
        };
        let url = format!("{}{path}", self.config.api_base_url());
        Ok(self
            .client
            .request(method, url)
            .header("x-client-id", app_id)
            .header("x-client-secret", secret)
            .header("x-api-version", API_VERSION)
            .header("accept", "application/json"))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, CheckoutError> {
        let response = builder
            .send()
            .await
            .map_err(|e| CheckoutError::gateway(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "could not read response body".to_string());

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %body, "gateway call failed");
            return Err(CheckoutError::gateway(Some(status.as_u16()), body));
        }

        serde_json::from_str(&body).map_err(|e| {
            CheckoutError::gateway(Some(status.as_u16()), format!("unparseable body ({e}): {body}"))
        })
    }

    fn return_url(&self, order_id: &OrderId) -> Option<String> {
        self.config
            .return_url
            .as_ref()
            .map(|url| url.replace("{order_id}", order_id.as_str()))
    }

    async fn create_order_inner(
        &self,
        request: &CreateRemoteOrder,
    ) -> Result<RemoteOrder, CheckoutError> {
        request.validate()?;

        let mut body = serde_json::json!({
            "order_id": request.order_id.as_str(),
            "order_amount": request.money.amount().as_major(),
            "order_currency": request.money.currency().as_str(),
            "customer_details": {
                "customer_id": request.customer.customer_id,
                "customer_name": request.customer.name,
                "customer_email": request.customer.email,
                "customer_phone": request.customer.phone,
            },
        });
        if let Some(url) = self.return_url(&request.order_id) {
            body["order_meta"] = serde_json::json!({ "return_url": url });
        }

        let raw = self
            .send(self.request(Method::POST, "/orders")?.json(&body))
            .await?;

        let payment_session_id = string_field(&raw, "payment_session_id").ok_or_else(|| {
            CheckoutError::gateway(Some(200), format!("missing payment_session_id: {raw}"))
        })?;

        Ok(RemoteOrder {
            cf_order_id: string_field(&raw, "cf_order_id"),
            order_id: string_field(&raw, "order_id")
                .unwrap_or_else(|| request.order_id.as_str().to_string()),
            payment_url: self.payment_url(&payment_session_id),
            payment_session_id,
            order_status: string_field(&raw, "order_status").unwrap_or_default(),
            order_expiry_time: string_field(&raw, "order_expiry_time"),
        })
    }

    async fn fetch_order_inner(
        &self,
        order_id: &OrderId,
    ) -> Result<RemoteOrderStatus, CheckoutError> {
        let raw = self
            .send(self.request(Method::GET, &format!("/orders/{order_id}"))?)
            .await?;
        Ok(RemoteOrderStatus {
            cf_order_id: string_field(&raw, "cf_order_id"),
            order_id: string_field(&raw, "order_id")
                .unwrap_or_else(|| order_id.as_str().to_string()),
            order_status: string_field(&raw, "order_status").unwrap_or_default(),
            payment_session_id: string_field(&raw, "payment_session_id"),
            raw,
        })
    }

    async fn fetch_payments_inner(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<RemotePayment>, CheckoutError> {
        let raw = self
            .send(self.request(Method::GET, &format!("/orders/{order_id}/payments"))?)
            .await?;
        let items = match raw {
            Value::Array(items) => items,
            other => {
                return Err(CheckoutError::gateway(
                    Some(200),
                    format!("expected payment list, got: {other}"),
                ));
            }
        };
        Ok(items
            .into_iter()
            .map(|item| RemotePayment {
                cf_payment_id: string_field(&item, "cf_payment_id"),
                payment_status: string_field(&item, "payment_status").unwrap_or_default(),
                payment_time: string_field(&item, "payment_time"),
                raw: item,
            })
            .collect())
    }

    async fn create_refund_inner(
        &self,
        request: &CreateRemoteRefund,
    ) -> Result<RemoteRefund, CheckoutError> {
        let mut body = serde_json::json!({
            "refund_id": request.refund_id,
            "refund_amount": request.money.amount().as_major(),
        });
        if let Some(note) = &request.note {
            body["refund_note"] = Value::String(note.clone());
        }
        let raw = self
            .send(
                self.request(Method::POST, &format!("/orders/{}/refunds", request.order_id))?
                    .json(&body),
            )
            .await?;
        Ok(RemoteRefund {
            refund_id: string_field(&raw, "refund_id").unwrap_or_else(|| request.refund_id.clone()),
            refund_status: string_field(&raw, "refund_status").unwrap_or_default(),
            raw,
        })
    }
}

impl PaymentGateway for CashfreeGateway {
    fn name(&self) -> &'static str {
        "cashfree"
    }

    fn payment_url(&self, payment_session_id: &str) -> String {
        format!("{}{payment_session_id}", self.config.checkout_base_url())
    }

    fn create_order<'a>(
        &'a self,
        request: &'a CreateRemoteOrder,
    ) -> GatewayFuture<'a, RemoteOrder> {
        Box::pin(self.create_order_inner(request))
    }

    fn fetch_order<'a>(&'a self, order_id: &'a OrderId) -> GatewayFuture<'a, RemoteOrderStatus> {
        Box::pin(self.fetch_order_inner(order_id))
    }

    fn fetch_payments<'a>(
        &'a self,
        order_id: &'a OrderId,
    ) -> GatewayFuture<'a, Vec<RemotePayment>> {
        Box::pin(self.fetch_payments_inner(order_id))
    }

    fn create_refund<'a>(
        &'a self,
        request: &'a CreateRemoteRefund,
    ) -> GatewayFuture<'a, RemoteRefund> {
        Box::pin(self.create_refund_inner(request))
    }
}

/// Gateway ids come back as strings or integers depending on the endpoint.
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::config::GatewayEnvironment,
        crate::domain::{
            gateway::CustomerDetails,
            money::{Currency, Money, MoneyAmount},
        },
        httpmock::prelude::*,
    };

    fn gateway(server: &MockServer, with_credentials: bool) -> CashfreeGateway {
        CashfreeGateway::new(GatewayConfig {
            app_id: with_credentials.then(|| "app-123".to_string()),
            secret_key: with_credentials.then(|| "secret-xyz".to_string()),
            return_url: Some("https://shop.test/payment/return?order_id={order_id}".into()),
            api_base_url: Some(server.base_url()),
            ..GatewayConfig::default()
        })
        .unwrap()
    }

    fn create_request(order_id: &str, minor: i64) -> CreateRemoteOrder {
        CreateRemoteOrder {
            order_id: OrderId::new(order_id).unwrap(),
            money: Money::new(MoneyAmount::new(minor).unwrap(), Currency::Inr),
            customer: CustomerDetails {
                customer_id: "user-1".into(),
                name: "Asha Rao".into(),
                email: "asha@example.com".into(),
                phone: "9876543210".into(),
            },
        }
    }

    #[tokio::test]
    async fn create_order_builds_payment_url_from_session() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/orders")
                    .header("x-client-id", "app-123")
                    .header("x-client-secret", "secret-xyz")
                    .header("x-api-version", API_VERSION)
                    .json_body_partial(
                        serde_json::json!({
                            "order_id": "order_abc",
                            "order_amount": 499.0,
                            "order_currency": "INR",
                            "order_meta": {
                                "return_url": "https://shop.test/payment/return?order_id=order_abc"
                            }
                        })
                        .to_string(),
                    );
                then.status(200).json_body(serde_json::json!({
                    "cf_order_id": 2149460581_i64,
                    "order_id": "order_abc",
                    "payment_session_id": "session_XYZ",
                    "order_status": "ACTIVE",
                    "order_expiry_time": "2026-10-20T12:00:00+05:30"
                }));
            })
            .await;

        let remote = gateway(&server, true)
            .create_order(&create_request("order_abc", 49_900))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(remote.payment_session_id, "session_XYZ");
        assert_eq!(remote.cf_order_id.as_deref(), Some("2149460581"));
        assert!(remote.payment_url.ends_with("session_XYZ"));
        assert!(remote.payment_url.starts_with(GatewayEnvironment::Sandbox.checkout_base_url()));
    }

    #[tokio::test]
    async fn non_success_status_carries_code_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/orders");
                then.status(401).body(r#"{"message":"authentication Failed"}"#);
            })
            .await;

        let err = gateway(&server, true)
            .create_order(&create_request("order_auth", 100))
            .await
            .unwrap_err();

        match err {
            CheckoutError::Gateway { status, body } => {
                assert_eq!(status, Some(401));
                assert!(body.contains("authentication Failed"));
            }
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let gw = gateway(&server, false);
        let err = gw
            .fetch_order(&OrderId::new("order_nocreds").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Gateway { status: None, .. }));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn invalid_amount_is_rejected_before_any_call() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let err = gateway(&server, true)
            .create_order(&create_request("order_zero", 0))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(_)));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn fetch_payments_reads_attempts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/orders/order_pay/payments");
                then.status(200).json_body(serde_json::json!([
                    {
                        "cf_payment_id": 885,
                        "payment_status": "FAILED",
                        "payment_time": "2026-10-19T10:00:00+05:30"
                    },
                    {
                        "cf_payment_id": "886",
                        "payment_status": "SUCCESS",
                        "payment_time": "2026-10-19T10:03:00+05:30"
                    }
                ]));
            })
            .await;

        let payments = gateway(&server, true)
            .fetch_payments(&OrderId::new("order_pay").unwrap())
            .await
            .unwrap();

        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].cf_payment_id.as_deref(), Some("885"));
        assert_eq!(payments[1].payment_status, "SUCCESS");
    }

    #[tokio::test]
    async fn fetch_order_surfaces_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/orders/order_gone");
                then.status(404).body(r#"{"code":"order_not_found"}"#);
            })
            .await;

        let err = gateway(&server, true)
            .fetch_order(&OrderId::new("order_gone").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Gateway { status: Some(404), .. }));
    }

    #[tokio::test]
    async fn fetch_order_reads_open_session() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/orders/order_open");
                then.status(200).json_body(serde_json::json!({
                    "cf_order_id": 2149460581u64,
                    "order_id": "order_open",
                    "order_status": "ACTIVE",
                    "payment_session_id": "session_abc"
                }));
            })
            .await;

        let remote = gateway(&server, true)
            .fetch_order(&OrderId::new("order_open").unwrap())
            .await
            .unwrap();

        assert_eq!(remote.order_status, "ACTIVE");
        assert_eq!(remote.cf_order_id.as_deref(), Some("2149460581"));
        assert_eq!(remote.payment_session_id.as_deref(), Some("session_abc"));
    }
}
