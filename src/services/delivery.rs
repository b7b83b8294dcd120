use {
    crate::domain::{
        delivery::{
            Delivery, DeliveryDispatcher, DeliveryHandoff, DeliveryStatus, DispatchFuture,
            DispatchedDelivery, NewTrackingEvent, TrackingEvent,
        },
        error::CheckoutError,
    },
    crate::infra::postgres::delivery_repo::{self, NewDeliveryRow},
    chrono::{Days, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

const ESTIMATED_TRANSIT_DAYS: u64 = 5;

/// Creates the delivery record in this service's own tables. Stands in for
/// a courier integration; keyed by order id so repeated hand-offs are no-ops.
#[derive(Clone)]
pub struct LocalDeliveryDispatcher {
    pool: PgPool,
}

impl LocalDeliveryDispatcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn dispatch_inner(
        &self,
        handoff: &DeliveryHandoff,
    ) -> Result<DispatchedDelivery, CheckoutError> {
        let id = Uuid::now_v7();
        let tracking_number = format!("BK{}", id.simple().to_string().to_uppercase());
        let estimated = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(ESTIMATED_TRANSIT_DAYS))
            .ok_or_else(|| CheckoutError::Validation("delivery date out of range".into()))?;

        let mut tx = self.pool.begin().await?;
        let stored = delivery_repo::insert_delivery(
            &mut tx,
            &NewDeliveryRow {
                id,
                order_id: &handoff.order_id,
                tracking_number: &tracking_number,
                estimated_delivery_date: estimated,
                shipping: &handoff.shipping,
                items: &handoff.cart_items,
            },
        )
        .await?;

        if stored.created {
            delivery_repo::insert_tracking_event(
                &mut tx,
                &NewTrackingEvent {
                    delivery_id: stored.id,
                    status: DeliveryStatus::Pending,
                    description: "Order confirmed, preparing for dispatch".into(),
                    location: None,
                },
            )
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            order_id = %handoff.order_id,
            delivery_id = %stored.id,
            created = stored.created,
            items = handoff.cart_items.len(),
            "delivery dispatched"
        );

        Ok(DispatchedDelivery {
            delivery_id: stored.id,
            shiprocket_order_id: format!("local-{}", stored.id.simple()),
            shiprocket_shipment_id: stored.tracking_number,
        })
    }
}

impl DeliveryDispatcher for LocalDeliveryDispatcher {
    fn dispatch<'a>(&'a self, handoff: &'a DeliveryHandoff) -> DispatchFuture<'a> {
        Box::pin(self.dispatch_inner(handoff))
    }
}

pub async fn get_delivery_by_order(
    pool: &PgPool,
    order_id: &str,
) -> Result<Delivery, CheckoutError> {
    delivery_repo::find_by_order(pool, order_id)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("delivery for order {order_id}")))
}

pub async fn get_tracking_events(
    pool: &PgPool,
    delivery_id: Uuid,
) -> Result<Vec<TrackingEvent>, CheckoutError> {
    if !delivery_repo::exists(pool, delivery_id).await? {
        return Err(CheckoutError::NotFound(format!("delivery {delivery_id}")));
    }
    delivery_repo::list_tracking_events(pool, delivery_id).await
}

/// Append a tracking event. The delivery status only ever moves forward;
/// a late event for an earlier stage is kept in the timeline only.
pub async fn record_tracking_event(
    pool: &PgPool,
    event: &NewTrackingEvent,
) -> Result<(TrackingEvent, DeliveryStatus), CheckoutError> {
    event.validate()?;

    let mut tx = pool.begin().await?;
    let current = delivery_repo::delivery_status_for_update(&mut tx, event.delivery_id)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("delivery {}", event.delivery_id)))?;

    let recorded = delivery_repo::insert_tracking_event(&mut tx, event).await?;

    let status = if current.advances_to(&event.status) {
        delivery_repo::advance_status(&mut tx, event.delivery_id, event.status).await?;
        event.status
    } else {
        if event.status != current {
            tracing::warn!(
                delivery_id = %event.delivery_id,
                current = %current,
                incoming = %event.status,
                "out-of-order tracking event, status kept"
            );
        }
        current
    };
    tx.commit().await?;

    Ok((recorded, status))
}
