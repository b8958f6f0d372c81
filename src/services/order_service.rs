use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest};
use crate::{
    access::{Capability, Role},
    audit,
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        products::{Column as ProdCol, Entity as Products},
        promotions::{Column as PromoCol, Entity as Promotions},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{NotificationChannel, Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::promotion_service,
    state::AppState,
};

/// Place an order: validate stock and promotion, snapshot prices, persist
/// the order and decrement inventory — all in one transaction, so a failure
/// anywhere leaves no partial effects.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    user.ensure(Capability::PlaceOrder)?;

    if payload.items.is_empty() {
        return Err(AppError::BadRequest("order has no items".into()));
    }
    if payload.address.trim().is_empty() {
        return Err(AppError::BadRequest("delivery address is required".into()));
    }

    let txn = state.orm.begin().await?;

    // Validate every line item against a locked product row before any write.
    let mut subtotal: i64 = 0;
    let mut lines: Vec<(Uuid, i32, i64)> = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(format!(
                "invalid quantity for product {}",
                item.product_id
            )));
        }
        let product = Products::find_by_id(item.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if product.merchant_id != payload.merchant_id {
            return Err(AppError::BadRequest(format!(
                "product {} does not belong to this merchant",
                product.id
            )));
        }
        if !product.is_active {
            return Err(AppError::BadRequest(format!(
                "product {} is not available",
                product.id
            )));
        }
        if product.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "insufficient stock for product {}",
                product.id
            )));
        }

        // The catalog price is the snapshot; the declared price is ignored.
        subtotal += product.price * item.quantity as i64;
        lines.push((product.id, item.quantity, product.price));
    }

    let product_ids: Vec<Uuid> = lines.iter().map(|(id, _, _)| *id).collect();
    let now = Utc::now();

    let mut discount: i64 = 0;
    let mut promotion = None;
    if let Some(code) = payload.promotion_code.as_ref().filter(|c| !c.is_empty()) {
        let promo = Promotions::find()
            .filter(PromoCol::Code.eq(code.as_str()))
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if promo.merchant_id != payload.merchant_id {
            return Err(AppError::BadRequest(
                "promotion does not apply to this merchant".into(),
            ));
        }
        if !promotion_service::promotion_is_valid(&promo, now) {
            return Err(AppError::BadRequest("promotion is not valid".into()));
        }
        if !promotion_service::promotion_applies_to(&promo, &product_ids) {
            return Err(AppError::BadRequest(
                "promotion does not apply to these products".into(),
            ));
        }

        discount = promotion_service::promotion_discount(&promo, subtotal);
        promotion = Some(promo);
    }

    let total = subtotal - discount;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        client_id: Set(user.user_id),
        merchant_id: Set(payload.merchant_id),
        promotion_id: Set(promotion.as_ref().map(|p| p.id)),
        delivery_id: Set(None),
        subtotal: Set(subtotal),
        discount: Set(discount),
        total: Set(total),
        status: Set(OrderStatus::Pending.as_str().into()),
        address: Set(payload.address),
        note: Set(payload.note),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for (product_id, quantity, price) in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(*product_id),
            quantity: Set(*quantity),
            price: Set(*price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(item.into());

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(*quantity))
            .filter(ProdCol::Id.eq(*product_id))
            .exec(&txn)
            .await?;
    }

    if let Some(promo) = promotion {
        promotion_service::apply_promotion(&txn, promo, order.id, user.user_id, now).await?;
    }

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total })),
    )
    .await;

    state.notifier.notify(
        order.merchant_id,
        NotificationChannel::InApp,
        "New order",
        format!("Order {} was placed", order.id),
    );

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    match user.role {
        Role::Client => condition = condition.add(OrderCol::ClientId.eq(user.user_id)),
        Role::Merchant => condition = condition.add(OrderCol::MerchantId.eq(user.user_id)),
        Role::Admin | Role::Support => {}
        Role::Livreur => return Err(AppError::Forbidden),
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_order_access(user, order.client_id, order.merchant_id)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Move an order along the lifecycle. Unknown status values and transitions
/// outside the table are rejected; a move to `cancelled` goes through
/// `cancel_order` so stock is restored.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let next: OrderStatus = payload.status.parse()?;
    if next == OrderStatus::Cancelled {
        let resp = cancel_order(state, user, id).await?;
        return Ok(resp);
    }

    user.ensure(Capability::TransitionOrder)?;

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.merchant_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let current: OrderStatus = order.status.parse()?;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "cannot transition order from {current} to {next}"
        )));
    }

    let client_id = order.client_id;
    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await;

    if next == OrderStatus::Completed {
        state.notifier.notify(
            client_id,
            NotificationChannel::InApp,
            "Order completed",
            format!("Order {} is complete", order.id),
        );
    }

    Ok(ApiResponse::success(
        "Order updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

/// Cancel a non-terminal order: restore every line item's stock and, when a
/// paid payment exists, initiate its refund — all in one transaction.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    user.ensure(Capability::CancelOrder)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_order_access(user, order.client_id, order.merchant_id)?;

    let current: OrderStatus = order.status.parse()?;
    if current.is_terminal() {
        return Err(AppError::BadRequest(
            "order is already completed or cancelled".into(),
        ));
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    for item in &items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(&txn)
            .await?;
    }

    // A paid order gets its refund initiated as part of the cancellation.
    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    if let Some(payment) = payment {
        if payment.status == "paid" {
            let mut active: PaymentActive = payment.into();
            active.status = Set("refund_pending".into());
            active.update(&txn).await?;
        }
    }

    let client_id = order.client_id;
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await;

    state.notifier.notify(
        client_id,
        NotificationChannel::InApp,
        "Order cancelled",
        format!("Order {} was cancelled", order.id),
    );

    Ok(ApiResponse::success(
        "Order cancelled",
        order.into(),
        Some(Meta::empty()),
    ))
}

fn ensure_order_access(user: &AuthUser, client_id: Uuid, merchant_id: Uuid) -> Result<(), AppError> {
    let allowed = user.user_id == client_id
        || user.user_id == merchant_id
        || matches!(user.role, Role::Admin | Role::Support);
    if allowed { Ok(()) } else { Err(AppError::Forbidden) }
}
