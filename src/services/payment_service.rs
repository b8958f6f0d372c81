use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::dto::payments::PayOrderRequest;
use crate::{
    access::Capability,
    audit,
    entity::{
        orders::Entity as Orders,
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{NotificationChannel, OrderStatus, Payment},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Record a payment against an open order. Transaction ids are globally
/// unique; replaying one is a conflict, not a second charge.
pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<Payment>> {
    user.ensure(Capability::PayOrder)?;
    if payload.transaction_id.trim().is_empty() {
        return Err(AppError::BadRequest("transaction_id is required".into()));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.client_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let status: OrderStatus = order.status.parse()?;
    if !matches!(status, OrderStatus::Pending | OrderStatus::Accepted) {
        return Err(AppError::BadRequest(format!(
            "order in status {status} cannot be paid"
        )));
    }

    let existing = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest("order is already paid".into()));
    }

    let duplicate = Payments::find()
        .filter(PaymentCol::TransactionId.eq(payload.transaction_id.as_str()))
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict("duplicate transaction id".into()));
    }

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        amount: Set(order.total),
        method: Set(payload.method),
        transaction_id: Set(payload.transaction_id),
        status: Set("paid".into()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_paid",
        Some("payments"),
        Some(serde_json::json!({ "order_id": order.id, "payment_id": payment.id })),
    )
    .await;

    state.notifier.notify(
        order.merchant_id,
        NotificationChannel::InApp,
        "Order paid",
        format!("Order {} was paid", order.id),
    );

    Ok(ApiResponse::success(
        "Payment recorded",
        payment.into(),
        Some(Meta::empty()),
    ))
}
