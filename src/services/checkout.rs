use {
    crate::domain::{
        audit::NewAuditEntry,
        delivery::{DeliveryDispatcher, DeliveryHandoff, DispatchedDelivery},
        error::CheckoutError,
        gateway::{
            CreateRemoteOrder, CreateRemoteRefund, CustomerDetails, PaymentGateway, RemoteOrder,
            RemoteVerdict,
        },
        id::{OrderId, OrderIdAliases},
        money::{Currency, Money, MoneyAmount},
        order::{
            CartItem, CustomerSnapshot, NewPaymentOrder, NewPaymentOrderParams, OrderStatus,
            PaymentOrder, ReconcileAction, ReconcileResult, ShippingSnapshot, decide,
        },
    },
    crate::infra::postgres::{audit_repo::insert_audit_entry, order_repo},
    serde::Deserialize,
    sqlx::PgPool,
};

const ACTOR: &str = "checkout";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: String,
    /// Decimal major units, e.g. `499.00`.
    pub amount: f64,
    #[serde(default)]
    pub currency: Currency,
    pub customer: CustomerSnapshot,
    pub shipping: ShippingSnapshot,
    pub cart_items: Vec<CartItem>,
}

#[derive(Debug)]
pub enum CheckoutOutcome {
    Redirect {
        order_id: OrderId,
        payment_session_id: String,
        payment_url: String,
    },
    /// The local order exists in `created`; the caller should offer a retry.
    GatewayUnavailable {
        order_id: OrderId,
        error: CheckoutError,
    },
}

impl CheckoutOutcome {
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Redirect { order_id, .. } | Self::GatewayUnavailable { order_id, .. } => order_id,
        }
    }
}

#[derive(Debug)]
pub struct VerifiedOrder {
    pub order: PaymentOrder,
    pub payment_verified: bool,
    /// Paid orders tell the client to empty its cart. Safe to repeat.
    pub clear_cart: bool,
}

impl From<PaymentOrder> for VerifiedOrder {
    fn from(order: PaymentOrder) -> Self {
        let paid = order.status == OrderStatus::Paid;
        Self {
            order,
            payment_verified: paid,
            clear_cart: paid,
        }
    }
}

fn audit(order_id: &OrderId, action: &str, detail: serde_json::Value) -> NewAuditEntry {
    NewAuditEntry::for_order(order_id, ACTOR, action, detail)
}

/// Persist a `created` order with its snapshots, then open a hosted-checkout
/// session for it.
pub async fn initiate_checkout(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    request: CheckoutRequest,
) -> Result<CheckoutOutcome, CheckoutError> {
    let money = Money::new(MoneyAmount::from_major(request.amount)?, request.currency);
    let order = NewPaymentOrder::new(NewPaymentOrderParams {
        user_id: request.user_id,
        money,
        customer: request.customer,
        shipping: request.shipping,
        cart_items: request.cart_items,
    })?;

    let mut tx = pool.begin().await?;
    order_repo::insert_order(&mut tx, &order).await?;
    insert_audit_entry(&mut tx, &order.audit_entry(ACTOR, "created")).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order.order_id(),
        amount = %order.money().amount(),
        currency = %order.money().currency(),
        "payment order created"
    );

    let customer = CustomerDetails {
        customer_id: order.user_id().to_string(),
        name: order.customer().name.clone(),
        email: order.customer().email.clone(),
        phone: order.customer().phone.clone(),
    };
    let request = CreateRemoteOrder {
        order_id: order.order_id().clone(),
        money: order.money().clone(),
        customer,
    };
    open_session(pool, gateway, request, false).await
}

/// "Try again" for an order whose gateway session was never opened.
/// An order that already has a session just gets its URL back. If an
/// earlier attempt created the remote order but its answer was lost, the
/// session is recovered from the gateway.
pub async fn retry_checkout(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    order_id: &OrderId,
) -> Result<CheckoutOutcome, CheckoutError> {
    let order = order_repo::get_order(pool, order_id).await?;
    if order.status != OrderStatus::Created {
        return Err(CheckoutError::Validation(format!(
            "order {order_id} is {}, checkout cannot be resumed",
            order.status
        )));
    }

    if let Some(session) = order.payment_session_id.clone() {
        return Ok(CheckoutOutcome::Redirect {
            order_id: order.order_id,
            payment_url: gateway.payment_url(&session),
            payment_session_id: session,
        });
    }

    let customer = CustomerDetails {
        customer_id: order.user_id.clone(),
        name: order.customer.name.clone(),
        email: order.customer.email.clone(),
        phone: order.customer.phone.clone(),
    };
    let request = CreateRemoteOrder {
        order_id: order.order_id.clone(),
        money: order.money(),
        customer,
    };
    open_session(pool, gateway, request, true).await
}

async fn open_session(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    request: CreateRemoteOrder,
    resume: bool,
) -> Result<CheckoutOutcome, CheckoutError> {
    let remote = match gateway.create_order(&request).await {
        Ok(remote) => remote,
        Err(error @ CheckoutError::Gateway { .. }) => {
            let existing = if resume {
                existing_remote_order(gateway, &request.order_id).await
            } else {
                None
            };
            match existing {
                Some(remote) => remote,
                None => {
                    tracing::warn!(
                        order_id = %request.order_id,
                        error = %error,
                        "gateway order creation failed, order left in created"
                    );
                    return Ok(CheckoutOutcome::GatewayUnavailable {
                        order_id: request.order_id,
                        error,
                    });
                }
            }
        }
        Err(e) => return Err(e),
    };

    let stored = order_repo::set_payment_session(
        pool,
        &request.order_id,
        &remote.payment_session_id,
        remote.cf_order_id.as_deref(),
    )
    .await?;

    if !stored {
        // Either another request opened the session first, or the order
        // settled while the gateway call was in flight.
        let order = order_repo::get_order(pool, &request.order_id).await?;
        return match order.payment_session_id {
            Some(session) => Ok(CheckoutOutcome::Redirect {
                order_id: request.order_id,
                payment_url: gateway.payment_url(&session),
                payment_session_id: session,
            }),
            None => Err(CheckoutError::Conflict(format!(
                "order {} is {}, payment session was not stored",
                request.order_id, order.status
            ))),
        };
    }

    tracing::info!(
        order_id = %request.order_id,
        gateway = gateway.name(),
        expires = ?remote.order_expiry_time,
        "payment session opened"
    );

    Ok(CheckoutOutcome::Redirect {
        order_id: request.order_id,
        payment_session_id: remote.payment_session_id,
        payment_url: remote.payment_url,
    })
}

/// The remote order may exist even though the create call failed, e.g. a
/// timeout after the gateway accepted it.
async fn existing_remote_order(
    gateway: &dyn PaymentGateway,
    order_id: &OrderId,
) -> Option<RemoteOrder> {
    let remote = match gateway.fetch_order(order_id).await {
        Ok(remote) => remote,
        Err(e) => {
            tracing::debug!(order_id = %order_id, error = %e, "no remote order to resume");
            return None;
        }
    };
    let session = remote.payment_session_id?;
    tracing::info!(order_id = %order_id, "resuming existing gateway order");
    Some(RemoteOrder {
        cf_order_id: remote.cf_order_id,
        order_id: remote.order_id,
        payment_url: gateway.payment_url(&session),
        payment_session_id: session,
        order_status: remote.order_status,
        order_expiry_time: None,
    })
}

/// Resolve the order from the return redirect, ask the gateway for its
/// verdict and reconcile. Safe to call any number of times.
pub async fn verify_and_fetch(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    dispatcher: &dyn DeliveryDispatcher,
    aliases: &OrderIdAliases,
) -> Result<VerifiedOrder, CheckoutError> {
    let order_id = aliases.resolve_order_id()?;
    let order = order_repo::get_order(pool, &order_id).await?;

    if order.awaits_delivery() {
        // An earlier hand-off failed or never ran.
        tracing::warn!(order_id = %order_id, "paid order has no shipment, retrying hand-off");
        hand_off_delivery(pool, dispatcher, &order).await;
        let order = order_repo::get_order(pool, &order_id).await?;
        return Ok(VerifiedOrder::from(order));
    }
    if order.status.is_settled() {
        tracing::info!(order_id = %order_id, status = %order.status, "order already settled");
        return Ok(VerifiedOrder::from(order));
    }

    let remote = gateway.fetch_order(&order_id).await?;
    let payments = gateway.fetch_payments(&order_id).await?;
    let verdict = RemoteVerdict::from_remote(&remote, &payments);

    let result = reconcile(pool, &order_id, &verdict).await?;
    tracing::info!(order_id = %order_id, ?result, "payment verified");

    if let ReconcileResult::Advanced {
        to: OrderStatus::Paid,
        ..
    } = result
    {
        hand_off_delivery(pool, dispatcher, &order).await;
    }

    let order = order_repo::get_order(pool, &order_id).await?;
    Ok(VerifiedOrder::from(order))
}

/// Apply a verdict against the persisted status, serialized per order id.
pub async fn reconcile(
    pool: &PgPool,
    order_id: &OrderId,
    verdict: &RemoteVerdict,
) -> Result<ReconcileResult, CheckoutError> {
    let mut tx = pool.begin().await?;
    order_repo::lock_order(&mut tx, order_id).await?;

    let current = order_repo::current_status(&mut tx, order_id)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("order {order_id}")))?;

    let result = match decide(current, verdict.status) {
        ReconcileAction::Advance { from, to } => {
            order_repo::update_status(
                &mut tx,
                order_id,
                to,
                verdict.transaction_id.as_deref(),
                &verdict.response,
            )
            .await?;
            let detail = serde_json::json!({
                "old_status": from.as_str(),
                "new_status": to.as_str(),
                "transaction_id": verdict.transaction_id,
            });
            insert_audit_entry(&mut tx, &audit(order_id, "status_changed", detail)).await?;
            ReconcileResult::Advanced { from, to }
        }
        ReconcileAction::SameStatus => ReconcileResult::Unchanged(current),
        ReconcileAction::Pending => {
            order_repo::record_gateway_response(&mut tx, order_id, &verdict.response).await?;
            ReconcileResult::Pending
        }
        ReconcileAction::Anomaly { current, incoming } => {
            let detail = serde_json::json!({
                "current_status": current.as_str(),
                "incoming_status": incoming.as_str(),
                "anomaly": true,
            });
            insert_audit_entry(&mut tx, &audit(order_id, "verification_anomaly", detail)).await?;
            tracing::warn!(
                order_id = %order_id,
                from = %current,
                to = %incoming,
                "contradictory gateway verdict, status kept"
            );
            ReconcileResult::Anomaly { current, incoming }
        }
    };

    tx.commit().await?;
    Ok(result)
}

/// Runs once per order, right after the `created → paid` transition.
/// Failures are logged; the payment itself stays verified.
async fn hand_off_delivery(
    pool: &PgPool,
    dispatcher: &dyn DeliveryDispatcher,
    order: &PaymentOrder,
) {
    let handoff = DeliveryHandoff {
        order_id: order.order_id.clone(),
        shipping: order.shipping.clone(),
        cart_items: order.cart_items.clone(),
    };

    let dispatched = match dispatcher.dispatch(&handoff).await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(order_id = %order.order_id, error = %e, "delivery hand-off failed");
            return;
        }
    };

    match record_shipment(pool, &order.order_id, &dispatched).await {
        Ok(true) => tracing::info!(
            order_id = %order.order_id,
            delivery_id = %dispatched.delivery_id,
            "delivery created"
        ),
        Ok(false) => tracing::warn!(
            order_id = %order.order_id,
            "shipment ids already set or order not paid"
        ),
        Err(e) => tracing::error!(
            order_id = %order.order_id,
            error = %e,
            "failed to record shipment ids"
        ),
    }
}

async fn record_shipment(
    pool: &PgPool,
    order_id: &OrderId,
    dispatched: &DispatchedDelivery,
) -> Result<bool, CheckoutError> {
    let mut tx = pool.begin().await?;
    let stamped = order_repo::set_shipment(
        &mut tx,
        order_id,
        &dispatched.shiprocket_order_id,
        &dispatched.shiprocket_shipment_id,
    )
    .await?;
    if stamped {
        let detail = serde_json::json!({
            "delivery_id": dispatched.delivery_id,
            "shiprocket_order_id": dispatched.shiprocket_order_id,
            "shiprocket_shipment_id": dispatched.shiprocket_shipment_id,
        });
        insert_audit_entry(&mut tx, &audit(order_id, "delivery_created", detail)).await?;
    }
    tx.commit().await?;
    Ok(stamped)
}

pub async fn get_order(pool: &PgPool, order_id: &OrderId) -> Result<PaymentOrder, CheckoutError> {
    order_repo::get_order(pool, order_id).await
}

/// Refund the full amount of a paid order through the gateway.
///
/// The gateway call runs under the order lock and uses a refund id derived
/// from the order, so concurrent or repeated requests send one refund.
pub async fn refund_order(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    order_id: &OrderId,
    note: Option<String>,
) -> Result<PaymentOrder, CheckoutError> {
    let order = order_repo::get_order(pool, order_id).await?;

    let mut tx = pool.begin().await?;
    order_repo::lock_order(&mut tx, order_id).await?;
    let current = order_repo::current_status(&mut tx, order_id)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("order {order_id}")))?;
    match current {
        OrderStatus::Paid => {}
        OrderStatus::Refunded => {
            return Err(CheckoutError::Conflict(format!(
                "order {order_id} is already refunded"
            )));
        }
        other => {
            return Err(CheckoutError::Validation(format!(
                "only paid orders can be refunded, order {order_id} is {other}"
            )));
        }
    }

    let refund = gateway
        .create_refund(&CreateRemoteRefund {
            order_id: order_id.clone(),
            refund_id: order_id.refund_id(),
            money: order.money(),
            note,
        })
        .await?;

    let response = serde_json::json!({
        "payment": order.gateway_response,
        "refund": refund.raw,
    });
    order_repo::update_status(&mut tx, order_id, OrderStatus::Refunded, None, &response).await?;
    let detail = serde_json::json!({
        "refund_id": refund.refund_id,
        "refund_status": refund.refund_status,
        "amount": order.amount.minor(),
    });
    insert_audit_entry(&mut tx, &audit(order_id, "refunded", detail)).await?;
    tx.commit().await?;

    tracing::info!(order_id = %order_id, refund_id = %refund.refund_id, "order refunded");
    order_repo::get_order(pool, order_id).await
}
