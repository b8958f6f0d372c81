use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::dto::deliveries::{
    AssignDeliveryRequest, AvailableDelivery, AvailableDeliveryList, DeliveryList,
    DispatchDeliveryRequest, DistanceRequest, DistanceResponse, UpdateDeliveryStatusRequest,
};
use crate::{
    access::Capability,
    audit,
    entity::{
        couriers::{ActiveModel as CourierActive, Column as CourierCol, Entity as Couriers},
        deliveries::{
            ActiveModel as DeliveryActive, Column as DeliveryCol, Entity as Deliveries,
            Model as DeliveryModel,
        },
        orders::{ActiveModel as OrderActive, Entity as Orders},
    },
    error::{AppError, AppResult},
    geo::{GeoPoint, haversine_km},
    middleware::auth::AuthUser,
    models::{Delivery, DeliveryStatus, NotificationChannel, OrderStatus, StatusChange},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Create a delivery for an accepted order. The order carries at most one
/// delivery at a time.
pub async fn dispatch(
    state: &AppState,
    user: &AuthUser,
    payload: DispatchDeliveryRequest,
) -> AppResult<ApiResponse<Delivery>> {
    user.ensure(Capability::DispatchDelivery)?;
    if payload.fee < 0 {
        return Err(AppError::BadRequest("fee must not be negative".into()));
    }
    validate_point(payload.dest_coords)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.merchant_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    let status: OrderStatus = order.status.parse()?;
    if status != OrderStatus::Accepted {
        return Err(AppError::BadRequest(
            "only accepted orders can be dispatched".into(),
        ));
    }
    if order.delivery_id.is_some() {
        return Err(AppError::Conflict("order already has a delivery".into()));
    }

    let now = Utc::now();
    let history = vec![StatusChange {
        status: DeliveryStatus::Pending.as_str().into(),
        at: now,
    }];

    let delivery = DeliveryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        courier_id: Set(None),
        status: Set(DeliveryStatus::Pending.as_str().into()),
        dest_latitude: Set(payload.dest_coords.latitude),
        dest_longitude: Set(payload.dest_coords.longitude),
        distance_km: Set(None),
        fee: Set(payload.fee),
        history: Set(serde_json::json!(history)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut active: OrderActive = order.into();
    active.delivery_id = Set(Some(delivery.id));
    active.updated_at = Set(now.into());
    active.update(&txn).await?;

    txn.commit().await?;
    state.delivery_cache.invalidate(delivery.id).await;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "delivery_dispatch",
        Some("deliveries"),
        Some(serde_json::json!({ "delivery_id": delivery.id, "order_id": delivery.order_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Delivery dispatched",
        delivery.into(),
        Some(Meta::empty()),
    ))
}

/// Delivery lookup, served from the TTL cache when possible.
pub async fn get_delivery(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Delivery>> {
    if let Some(cached) = state.delivery_cache.get(id).await {
        return Ok(ApiResponse::success("Delivery", cached, None));
    }

    let delivery: Delivery = Deliveries::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?
        .into();

    state.delivery_cache.put(delivery.clone()).await;
    Ok(ApiResponse::success("Delivery", delivery, None))
}

/// Pending deliveries annotated with the great-circle distance from the
/// requesting courier, nearest first.
pub async fn available_deliveries(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AvailableDeliveryList>> {
    user.ensure(Capability::AcceptDelivery)?;
    let courier = find_courier(state, user.user_id).await?;
    let (lat, lon) = match (courier.latitude, courier.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(AppError::BadRequest(
                "courier location is not set".into(),
            ));
        }
    };
    let origin = GeoPoint {
        latitude: lat,
        longitude: lon,
    };

    let pending = Deliveries::find()
        .filter(DeliveryCol::Status.eq(DeliveryStatus::Pending.as_str()))
        .order_by_asc(DeliveryCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut items: Vec<AvailableDelivery> = pending
        .into_iter()
        .map(|d| {
            let dest = GeoPoint {
                latitude: d.dest_latitude,
                longitude: d.dest_longitude,
            };
            AvailableDelivery {
                distance_km: haversine_km(origin, dest),
                delivery: d.into(),
            }
        })
        .collect();
    items.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    Ok(ApiResponse::success(
        "Available deliveries",
        AvailableDeliveryList { items },
        Some(Meta::empty()),
    ))
}

/// Courier takes a pending delivery. The pending re-check under a row lock
/// turns a lost race into a `Conflict` instead of a double assignment.
pub async fn accept_delivery(
    state: &AppState,
    user: &AuthUser,
    delivery_id: Uuid,
) -> AppResult<ApiResponse<Delivery>> {
    user.ensure(Capability::AcceptDelivery)?;
    let courier = find_courier(state, user.user_id).await?;

    let txn = state.orm.begin().await?;
    let delivery = lock_pending_delivery(&txn, delivery_id).await?;

    let distance = match (courier.latitude, courier.longitude) {
        (Some(lat), Some(lon)) => Some(haversine_km(
            GeoPoint {
                latitude: lat,
                longitude: lon,
            },
            GeoPoint {
                latitude: delivery.dest_latitude,
                longitude: delivery.dest_longitude,
            },
        )),
        _ => None,
    };

    let delivery = start_delivery(&txn, delivery, courier.id, distance).await?;
    txn.commit().await?;
    state.delivery_cache.invalidate(delivery.id).await;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "delivery_accept",
        Some("deliveries"),
        Some(serde_json::json!({ "delivery_id": delivery.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Delivery accepted",
        delivery.into(),
        Some(Meta::empty()),
    ))
}

/// Admin override: hand a pending delivery to a specific livreur.
pub async fn assign_delivery(
    state: &AppState,
    user: &AuthUser,
    delivery_id: Uuid,
    payload: AssignDeliveryRequest,
) -> AppResult<ApiResponse<Delivery>> {
    user.ensure(Capability::AssignDelivery)?;
    let courier = find_courier(state, payload.livreur_id).await?;

    let txn = state.orm.begin().await?;
    let delivery = lock_pending_delivery(&txn, delivery_id).await?;
    let delivery = start_delivery(&txn, delivery, courier.id, None).await?;
    txn.commit().await?;
    state.delivery_cache.invalidate(delivery.id).await;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "delivery_assign",
        Some("deliveries"),
        Some(serde_json::json!({ "delivery_id": delivery.id, "livreur_id": payload.livreur_id })),
    )
    .await;

    state.notifier.notify(
        payload.livreur_id,
        NotificationChannel::Push,
        "Delivery assigned",
        format!("Delivery {} was assigned to you", delivery.id),
    );

    Ok(ApiResponse::success(
        "Delivery assigned",
        delivery.into(),
        Some(Meta::empty()),
    ))
}

/// Move a delivery along its lifecycle. `delivered` completes the parent
/// order and credits the courier; cancellation frees the order for a
/// fresh dispatch.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    delivery_id: Uuid,
    payload: UpdateDeliveryStatusRequest,
) -> AppResult<ApiResponse<Delivery>> {
    user.ensure(Capability::UpdateDeliveryStatus)?;
    let next: DeliveryStatus = payload.status.parse()?;

    let txn = state.orm.begin().await?;

    let delivery = Deliveries::find_by_id(delivery_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.is_admin() {
        let courier = find_courier(state, user.user_id).await?;
        if delivery.courier_id != Some(courier.id) {
            return Err(AppError::Forbidden);
        }
    }

    let current: DeliveryStatus = delivery.status.parse()?;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "cannot transition delivery from {current} to {next}"
        )));
    }

    let now = Utc::now();
    let mut history: Vec<StatusChange> =
        serde_json::from_value(delivery.history.clone()).unwrap_or_default();
    history.push(StatusChange {
        status: next.as_str().into(),
        at: now,
    });

    let order = delivery.find_related(Orders).one(&txn).await?;
    let courier_id = delivery.courier_id;
    let fee = delivery.fee;

    let mut active: DeliveryActive = delivery.into();
    active.status = Set(next.as_str().into());
    active.history = Set(serde_json::json!(history));
    active.updated_at = Set(now.into());
    let delivery = active.update(&txn).await?;

    match next {
        DeliveryStatus::Delivered => {
            if let Some(order) = order {
                let client_id = order.client_id;
                let status: OrderStatus = order.status.parse()?;
                if status.can_transition_to(OrderStatus::Completed) {
                    let mut active: OrderActive = order.into();
                    active.status = Set(OrderStatus::Completed.as_str().into());
                    active.updated_at = Set(now.into());
                    active.update(&txn).await?;
                }
                state.notifier.notify(
                    client_id,
                    NotificationChannel::InApp,
                    "Order delivered",
                    format!("Delivery {} has arrived", delivery.id),
                );
            }
            if let Some(courier_id) = courier_id {
                credit_courier(&txn, courier_id, fee).await?;
            }
        }
        DeliveryStatus::Cancelled => {
            if let Some(order) = order {
                let mut active: OrderActive = order.into();
                active.delivery_id = Set(None);
                active.updated_at = Set(now.into());
                active.update(&txn).await?;
            }
        }
        _ => {}
    }

    txn.commit().await?;
    state.delivery_cache.invalidate(delivery.id).await;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "delivery_status_update",
        Some("deliveries"),
        Some(serde_json::json!({ "delivery_id": delivery.id, "status": delivery.status })),
    )
    .await;

    Ok(ApiResponse::success(
        "Delivery updated",
        delivery.into(),
        Some(Meta::empty()),
    ))
}

/// Remove a delivery; the order's delivery reference is cleared in the same
/// transaction.
pub async fn delete_delivery(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    user.ensure(Capability::DeleteDelivery)?;

    let txn = state.orm.begin().await?;

    let delivery = Deliveries::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let order = delivery.find_related(Orders).one(&txn).await?;
    if let Some(order) = order {
        if order.merchant_id != user.user_id && !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        let mut active: OrderActive = order.into();
        active.delivery_id = Set(None);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
    }

    delivery.delete(&txn).await?;
    txn.commit().await?;
    state.delivery_cache.invalidate(id).await;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "delivery_delete",
        Some("deliveries"),
        Some(serde_json::json!({ "delivery_id": id })),
    )
    .await;

    Ok(ApiResponse::acknowledged("Deleted"))
}

/// Deliveries assigned to the requesting courier.
pub async fn my_deliveries(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DeliveryList>> {
    user.ensure(Capability::AcceptDelivery)?;
    let courier = find_courier(state, user.user_id).await?;

    let items = Deliveries::find()
        .filter(DeliveryCol::CourierId.eq(courier.id))
        .order_by_desc(DeliveryCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Delivery::from)
        .collect();

    Ok(ApiResponse::success(
        "Deliveries",
        DeliveryList { items },
        Some(Meta::empty()),
    ))
}

/// Stateless great-circle distance between two coordinate pairs.
pub fn calculate_distance(payload: DistanceRequest) -> AppResult<ApiResponse<DistanceResponse>> {
    validate_point(payload.start_coords)?;
    validate_point(payload.end_coords)?;
    let distance = haversine_km(payload.start_coords, payload.end_coords);
    Ok(ApiResponse::success(
        "Distance",
        DistanceResponse { distance },
        None,
    ))
}

async fn find_courier(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<crate::entity::couriers::Model> {
    Couriers::find()
        .filter(CourierCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

/// Load a delivery under a row lock and require it to still be pending.
async fn lock_pending_delivery(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> AppResult<DeliveryModel> {
    let delivery = Deliveries::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let status: DeliveryStatus = delivery.status.parse()?;
    if status != DeliveryStatus::Pending {
        return Err(AppError::Conflict("delivery is no longer pending".into()));
    }
    Ok(delivery)
}

/// Shared accept/assign tail: delivery goes in_progress with a courier, the
/// parent order follows.
async fn start_delivery(
    txn: &DatabaseTransaction,
    delivery: DeliveryModel,
    courier_id: Uuid,
    distance_km: Option<f64>,
) -> AppResult<DeliveryModel> {
    let now = Utc::now();
    let mut history: Vec<StatusChange> =
        serde_json::from_value(delivery.history.clone()).unwrap_or_default();
    history.push(StatusChange {
        status: DeliveryStatus::InProgress.as_str().into(),
        at: now,
    });

    let order = delivery.find_related(Orders).one(txn).await?;

    let mut active: DeliveryActive = delivery.into();
    active.status = Set(DeliveryStatus::InProgress.as_str().into());
    active.courier_id = Set(Some(courier_id));
    if distance_km.is_some() {
        active.distance_km = Set(distance_km);
    }
    active.history = Set(serde_json::json!(history));
    active.updated_at = Set(now.into());
    let delivery = active.update(txn).await?;

    if let Some(order) = order {
        let status: OrderStatus = order.status.parse()?;
        if status.can_transition_to(OrderStatus::InProgress) {
            let mut active: OrderActive = order.into();
            active.status = Set(OrderStatus::InProgress.as_str().into());
            active.updated_at = Set(now.into());
            active.update(txn).await?;
        }
    }

    Ok(delivery)
}

async fn credit_courier(txn: &DatabaseTransaction, courier_id: Uuid, fee: i64) -> AppResult<()> {
    let courier = Couriers::find_by_id(courier_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let completed = courier.deliveries_completed;
    let earnings = courier.total_earnings;
    let mut active: CourierActive = courier.into();
    active.deliveries_completed = Set(completed + 1);
    active.total_earnings = Set(earnings + fee);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await?;
    Ok(())
}

fn validate_point(point: GeoPoint) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&point.latitude) || !(-180.0..=180.0).contains(&point.longitude) {
        return Err(AppError::BadRequest("invalid coordinates".into()));
    }
    Ok(())
}
