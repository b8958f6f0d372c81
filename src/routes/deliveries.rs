use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::deliveries::{
        AssignDeliveryRequest, AvailableDeliveryList, DeliveryList, DispatchDeliveryRequest,
        DistanceRequest, DistanceResponse, UpdateDeliveryStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Delivery,
    response::ApiResponse,
    services::delivery_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(dispatch_delivery))
        .route("/available", get(available_deliveries))
        .route("/mine", get(my_deliveries))
        .route("/distance", post(calculate_distance))
        .route("/{id}", get(get_delivery))
        .route("/{id}", delete(delete_delivery))
        .route("/{id}/accept", post(accept_delivery))
        .route("/{id}/assign", post(assign_delivery))
        .route("/{id}/status", patch(update_delivery_status))
}

#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = DispatchDeliveryRequest,
    responses(
        (status = 201, description = "Delivery dispatched", body = ApiResponse<Delivery>),
        (status = 400, description = "Order not in an accepted state"),
        (status = 409, description = "Order already has a delivery"),
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn dispatch_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DispatchDeliveryRequest>,
) -> AppResult<Json<ApiResponse<Delivery>>> {
    let resp = delivery_service::dispatch(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/available",
    responses(
        (status = 200, description = "Pending deliveries by distance", body = ApiResponse<AvailableDeliveryList>),
        (status = 400, description = "Courier location not set"),
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn available_deliveries(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AvailableDeliveryList>>> {
    let resp = delivery_service::available_deliveries(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/mine",
    responses(
        (status = 200, description = "Deliveries assigned to the courier", body = ApiResponse<DeliveryList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn my_deliveries(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DeliveryList>>> {
    let resp = delivery_service::my_deliveries(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/deliveries/distance",
    request_body = DistanceRequest,
    responses(
        (status = 200, description = "Distance in kilometers", body = ApiResponse<DistanceResponse>),
        (status = 400, description = "Invalid coordinates"),
    ),
    tag = "Deliveries"
)]
pub async fn calculate_distance(
    Json(payload): Json<DistanceRequest>,
) -> AppResult<Json<ApiResponse<DistanceResponse>>> {
    let resp = delivery_service::calculate_distance(payload)?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/{id}",
    params(
        ("id" = Uuid, Path, description = "Delivery ID")
    ),
    responses(
        (status = 200, description = "Delivery", body = ApiResponse<Delivery>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn get_delivery(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Delivery>>> {
    let resp = delivery_service::get_delivery(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/deliveries/{id}/accept",
    params(
        ("id" = Uuid, Path, description = "Delivery ID")
    ),
    responses(
        (status = 200, description = "Delivery accepted", body = ApiResponse<Delivery>),
        (status = 409, description = "Delivery no longer pending"),
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn accept_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Delivery>>> {
    let resp = delivery_service::accept_delivery(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/deliveries/{id}/assign",
    params(
        ("id" = Uuid, Path, description = "Delivery ID")
    ),
    request_body = AssignDeliveryRequest,
    responses(
        (status = 200, description = "Delivery assigned", body = ApiResponse<Delivery>),
        (status = 409, description = "Delivery no longer pending"),
        (status = 404, description = "Courier not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn assign_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignDeliveryRequest>,
) -> AppResult<Json<ApiResponse<Delivery>>> {
    let resp = delivery_service::assign_delivery(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/deliveries/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Delivery ID")
    ),
    request_body = UpdateDeliveryStatusRequest,
    responses(
        (status = 200, description = "Delivery updated", body = ApiResponse<Delivery>),
        (status = 400, description = "Invalid status or transition"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeliveryStatusRequest>,
) -> AppResult<Json<ApiResponse<Delivery>>> {
    let resp = delivery_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/deliveries/{id}",
    params(
        ("id" = Uuid, Path, description = "Delivery ID")
    ),
    responses(
        (status = 200, description = "Delivery removed and order reference cleared"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn delete_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = delivery_service::delete_delivery(&state, &user, id).await?;
    Ok(Json(resp))
}
