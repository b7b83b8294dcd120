use {
    crate::domain::{
        delivery::{Delivery, DeliveryStatus, NewTrackingEvent, TrackingEvent},
        error::CheckoutError,
        id::OrderId,
        order::{CartItem, ShippingSnapshot},
    },
    chrono::{DateTime, NaiveDate, Utc},
    sqlx::{PgPool, types::Json},
    uuid::Uuid,
};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

const DELIVERY_COLUMNS: &str = r#"
    id, order_id, status, tracking_number, estimated_delivery_date, actual_delivery_date,
    address, city, state, pincode, landmark, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: Uuid,
    order_id: String,
    status: String,
    tracking_number: String,
    estimated_delivery_date: NaiveDate,
    actual_delivery_date: Option<NaiveDate>,
    address: String,
    city: String,
    state: String,
    pincode: String,
    landmark: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = CheckoutError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        Ok(Delivery {
            id: row.id,
            order_id: OrderId::new(row.order_id)?,
            status: DeliveryStatus::try_from(row.status.as_str())?,
            tracking_number: row.tracking_number,
            estimated_delivery_date: row.estimated_delivery_date,
            actual_delivery_date: row.actual_delivery_date,
            address: row.address,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            landmark: row.landmark,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TrackingRow {
    id: i64,
    delivery_id: Uuid,
    status: String,
    description: String,
    location: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<TrackingRow> for TrackingEvent {
    type Error = CheckoutError;

    fn try_from(row: TrackingRow) -> Result<Self, Self::Error> {
        Ok(TrackingEvent {
            id: row.id,
            delivery_id: row.delivery_id,
            status: DeliveryStatus::try_from(row.status.as_str())?,
            description: row.description,
            location: row.location,
            timestamp: row.occurred_at,
        })
    }
}

pub struct NewDeliveryRow<'a> {
    pub id: Uuid,
    pub order_id: &'a OrderId,
    pub tracking_number: &'a str,
    pub estimated_delivery_date: NaiveDate,
    pub shipping: &'a ShippingSnapshot,
    pub items: &'a [CartItem],
}

/// The delivery row for an order after an insert attempt.
pub struct StoredDelivery {
    pub id: Uuid,
    pub tracking_number: String,
    pub created: bool,
}

/// Insert keyed by order id. A repeated hand-off gets the existing row back.
pub async fn insert_delivery(
    tx: &mut Tx<'_>,
    delivery: &NewDeliveryRow<'_>,
) -> Result<StoredDelivery, CheckoutError> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO deliveries
            (id, order_id, status, tracking_number, estimated_delivery_date,
             address, city, state, pincode, landmark, items)
        VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (order_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(delivery.id)
    .bind(delivery.order_id.as_str())
    .bind(delivery.tracking_number)
    .bind(delivery.estimated_delivery_date)
    .bind(&delivery.shipping.address)
    .bind(&delivery.shipping.city)
    .bind(&delivery.shipping.state)
    .bind(&delivery.shipping.pincode)
    .bind(delivery.shipping.landmark.as_deref())
    .bind(Json(delivery.items))
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(id) = inserted {
        return Ok(StoredDelivery {
            id,
            tracking_number: delivery.tracking_number.to_string(),
            created: true,
        });
    }

    let (id, tracking_number): (Uuid, String) =
        sqlx::query_as("SELECT id, tracking_number FROM deliveries WHERE order_id = $1")
            .bind(delivery.order_id.as_str())
            .fetch_one(&mut **tx)
            .await?;
    Ok(StoredDelivery {
        id,
        tracking_number,
        created: false,
    })
}

pub async fn find_by_order(
    pool: &PgPool,
    order_id: &str,
) -> Result<Option<Delivery>, CheckoutError> {
    let row: Option<DeliveryRow> = sqlx::query_as(&format!(
        "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE order_id = $1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    row.map(Delivery::try_from).transpose()
}

pub async fn delivery_status_for_update(
    tx: &mut Tx<'_>,
    delivery_id: Uuid,
) -> Result<Option<DeliveryStatus>, CheckoutError> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM deliveries WHERE id = $1 FOR UPDATE")
            .bind(delivery_id)
            .fetch_optional(&mut **tx)
            .await?;
    status
        .map(|s| DeliveryStatus::try_from(s.as_str()))
        .transpose()
}

pub async fn exists(pool: &PgPool, delivery_id: Uuid) -> Result<bool, CheckoutError> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM deliveries WHERE id = $1)")
        .bind(delivery_id)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

pub async fn advance_status(
    tx: &mut Tx<'_>,
    delivery_id: Uuid,
    status: DeliveryStatus,
) -> Result<(), CheckoutError> {
    sqlx::query(
        r#"
        UPDATE deliveries
        SET status = $2,
            actual_delivery_date = CASE WHEN $2 = 'delivered'
                                        THEN CURRENT_DATE
                                        ELSE actual_delivery_date END,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(delivery_id)
    .bind(status.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_tracking_event(
    tx: &mut Tx<'_>,
    event: &NewTrackingEvent,
) -> Result<TrackingEvent, CheckoutError> {
    let row: TrackingRow = sqlx::query_as(
        r#"
        INSERT INTO tracking_events (delivery_id, status, description, location)
        VALUES ($1, $2, $3, $4)
        RETURNING id, delivery_id, status, description, location, occurred_at
        "#,
    )
    .bind(event.delivery_id)
    .bind(event.status.as_str())
    .bind(&event.description)
    .bind(event.location.as_deref())
    .fetch_one(&mut **tx)
    .await?;
    TrackingEvent::try_from(row)
}

/// Oldest first; insertion order breaks timestamp ties.
pub async fn list_tracking_events(
    pool: &PgPool,
    delivery_id: Uuid,
) -> Result<Vec<TrackingEvent>, CheckoutError> {
    let rows: Vec<TrackingRow> = sqlx::query_as(
        r#"
        SELECT id, delivery_id, status, description, location, occurred_at
        FROM tracking_events
        WHERE delivery_id = $1
        ORDER BY occurred_at, id
        "#,
    )
    .bind(delivery_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(TrackingEvent::try_from).collect()
}
