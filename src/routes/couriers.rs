use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch, put},
};

use crate::{
    dto::couriers::{SetAvailabilityRequest, UpdateLocationRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Courier,
    response::ApiResponse,
    services::courier_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(my_stats))
        .route("/me/location", put(update_location))
        .route("/me/availability", patch(set_availability))
}

#[utoipa::path(
    get,
    path = "/api/couriers/me",
    responses(
        (status = 200, description = "Courier profile and stats", body = ApiResponse<Courier>),
        (status = 404, description = "No courier profile"),
    ),
    security(("bearer_auth" = [])),
    tag = "Couriers"
)]
pub async fn my_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Courier>>> {
    let resp = courier_service::my_stats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/couriers/me/location",
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = ApiResponse<Courier>),
        (status = 400, description = "Invalid coordinates"),
    ),
    security(("bearer_auth" = [])),
    tag = "Couriers"
)]
pub async fn update_location(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateLocationRequest>,
) -> AppResult<Json<ApiResponse<Courier>>> {
    let resp = courier_service::update_location(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/couriers/me/availability",
    request_body = SetAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = ApiResponse<Courier>),
    ),
    security(("bearer_auth" = [])),
    tag = "Couriers"
)]
pub async fn set_availability(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SetAvailabilityRequest>,
) -> AppResult<Json<ApiResponse<Courier>>> {
    let resp = courier_service::set_availability(&state, &user, payload).await?;
    Ok(Json(resp))
}
