use {
    crate::domain::{
        error::CheckoutError,
        id::OrderId,
        money::{Currency, MoneyAmount},
        order::{
            CartItem, CustomerSnapshot, NewPaymentOrder, OrderStatus, PaymentOrder,
            ShippingSnapshot,
        },
    },
    chrono::{DateTime, Utc},
    sqlx::{PgPool, types::Json},
    uuid::Uuid,
};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

const ORDER_COLUMNS: &str = r#"
    id, order_id, user_id, amount, currency, status,
    customer_name, customer_email, customer_phone,
    shipping_address, shipping_city, shipping_state, shipping_pincode, shipping_landmark,
    cart_items, payment_session_id, gateway_order_id, transaction_id, gateway_response,
    shiprocket_order_id, shiprocket_shipment_id, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_id: String,
    user_id: String,
    amount: i64,
    currency: String,
    status: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    shipping_address: String,
    shipping_city: String,
    shipping_state: String,
    shipping_pincode: String,
    shipping_landmark: Option<String>,
    cart_items: Json<Vec<CartItem>>,
    payment_session_id: Option<String>,
    gateway_order_id: Option<String>,
    transaction_id: Option<String>,
    gateway_response: Option<serde_json::Value>,
    shiprocket_order_id: Option<String>,
    shiprocket_shipment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for PaymentOrder {
    type Error = CheckoutError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(PaymentOrder {
            id: row.id,
            order_id: OrderId::new(row.order_id)?,
            user_id: row.user_id,
            amount: MoneyAmount::new(row.amount)?,
            currency: Currency::try_from(row.currency.as_str())?,
            status: OrderStatus::try_from(row.status.as_str())?,
            customer: CustomerSnapshot {
                name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
            },
            shipping: ShippingSnapshot {
                address: row.shipping_address,
                city: row.shipping_city,
                state: row.shipping_state,
                pincode: row.shipping_pincode,
                landmark: row.shipping_landmark,
            },
            cart_items: row.cart_items.0,
            payment_session_id: row.payment_session_id,
            gateway_order_id: row.gateway_order_id,
            transaction_id: row.transaction_id,
            gateway_response: row.gateway_response,
            shiprocket_order_id: row.shiprocket_order_id,
            shiprocket_shipment_id: row.shiprocket_shipment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn insert_order(tx: &mut Tx<'_>, order: &NewPaymentOrder) -> Result<(), CheckoutError> {
    let customer = order.customer();
    let shipping = order.shipping();
    sqlx::query(
        r#"
        INSERT INTO payment_orders
            (id, order_id, user_id, amount, currency, status,
             customer_name, customer_email, customer_phone,
             shipping_address, shipping_city, shipping_state, shipping_pincode, shipping_landmark,
             cart_items)
        VALUES ($1, $2, $3, $4, $5, 'created', $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(order.id())
    .bind(order.order_id().as_str())
    .bind(order.user_id())
    .bind(order.money().amount().minor())
    .bind(order.money().currency().as_str())
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&shipping.address)
    .bind(&shipping.city)
    .bind(&shipping.state)
    .bind(&shipping.pincode)
    .bind(shipping.landmark.as_deref())
    .bind(Json(order.cart_items()))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_order(
    pool: &PgPool,
    order_id: &OrderId,
) -> Result<Option<PaymentOrder>, CheckoutError> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM payment_orders WHERE order_id = $1"
    ))
    .bind(order_id.as_str())
    .fetch_optional(pool)
    .await?;
    row.map(PaymentOrder::try_from).transpose()
}

pub async fn get_order(pool: &PgPool, order_id: &OrderId) -> Result<PaymentOrder, CheckoutError> {
    find_order(pool, order_id)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("order {order_id}")))
}

/// Session id and gateway order id are written once, while still `created`.
/// Returns `false` if a session was already stored.
pub async fn set_payment_session(
    pool: &PgPool,
    order_id: &OrderId,
    payment_session_id: &str,
    gateway_order_id: Option<&str>,
) -> Result<bool, CheckoutError> {
    let result = sqlx::query(
        r#"
        UPDATE payment_orders
        SET payment_session_id = $2, gateway_order_id = $3, updated_at = now()
        WHERE order_id = $1 AND payment_session_id IS NULL AND status = 'created'
        "#,
    )
    .bind(order_id.as_str())
    .bind(payment_session_id)
    .bind(gateway_order_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Serialize all reconciliation for this order id for the rest of the transaction.
pub async fn lock_order(tx: &mut Tx<'_>, order_id: &OrderId) -> Result<(), CheckoutError> {
    sqlx::query("SET LOCAL lock_timeout = '5s'")
        .execute(&mut **tx)
        .await?;
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(order_id.as_str())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn current_status(
    tx: &mut Tx<'_>,
    order_id: &OrderId,
) -> Result<Option<OrderStatus>, CheckoutError> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM payment_orders WHERE order_id = $1")
            .bind(order_id.as_str())
            .fetch_optional(&mut **tx)
            .await?;
    status
        .map(|s| OrderStatus::try_from(s.as_str()))
        .transpose()
}

pub async fn update_status(
    tx: &mut Tx<'_>,
    order_id: &OrderId,
    status: OrderStatus,
    transaction_id: Option<&str>,
    gateway_response: &serde_json::Value,
) -> Result<(), CheckoutError> {
    sqlx::query(
        r#"
        UPDATE payment_orders
        SET status = $2,
            transaction_id = COALESCE($3, transaction_id),
            gateway_response = $4,
            updated_at = now()
        WHERE order_id = $1
        "#,
    )
    .bind(order_id.as_str())
    .bind(status.as_str())
    .bind(transaction_id)
    .bind(gateway_response)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Remote verdict not final yet: keep the latest payload, leave status alone.
pub async fn record_gateway_response(
    tx: &mut Tx<'_>,
    order_id: &OrderId,
    gateway_response: &serde_json::Value,
) -> Result<(), CheckoutError> {
    sqlx::query(
        "UPDATE payment_orders SET gateway_response = $2, updated_at = now() WHERE order_id = $1",
    )
    .bind(order_id.as_str())
    .bind(gateway_response)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Only a paid order can carry shipment ids. Returns `false` otherwise.
pub async fn set_shipment(
    tx: &mut Tx<'_>,
    order_id: &OrderId,
    shiprocket_order_id: &str,
    shiprocket_shipment_id: &str,
) -> Result<bool, CheckoutError> {
    let result = sqlx::query(
        r#"
        UPDATE payment_orders
        SET shiprocket_order_id = $2, shiprocket_shipment_id = $3, updated_at = now()
        WHERE order_id = $1 AND status = 'paid' AND shiprocket_order_id IS NULL
        "#,
    )
    .bind(order_id.as_str())
    .bind(shiprocket_order_id)
    .bind(shiprocket_shipment_id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}
