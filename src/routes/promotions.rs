use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::promotions::{
        BestPromotionRequest, BestPromotionResponse, CreatePromotionRequest, PromotionList,
        UpdatePromotionRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Promotion,
    response::ApiResponse,
    services::promotion_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_promotion))
        .route("/", get(list_promotions))
        .route("/best", post(best_promotion))
        .route("/{id}", put(update_promotion))
        .route("/{id}/activate", patch(activate_promotion))
        .route("/{id}/deactivate", patch(deactivate_promotion))
}

#[utoipa::path(
    get,
    path = "/api/promotions",
    responses(
        (status = 200, description = "List own promotions", body = ApiResponse<PromotionList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn list_promotions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<PromotionList>>> {
    let resp = promotion_service::list_promotions(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/promotions",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Create promotion", body = ApiResponse<Promotion>),
        (status = 400, description = "Invalid discount"),
        (status = 409, description = "Code already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn create_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePromotionRequest>,
) -> AppResult<Json<ApiResponse<Promotion>>> {
    let resp = promotion_service::create_promotion(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/promotions/{id}",
    params(
        ("id" = Uuid, Path, description = "Promotion ID")
    ),
    request_body = UpdatePromotionRequest,
    responses(
        (status = 200, description = "Updated promotion", body = ApiResponse<Promotion>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn update_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePromotionRequest>,
) -> AppResult<Json<ApiResponse<Promotion>>> {
    let resp = promotion_service::update_promotion(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/promotions/{id}/activate",
    params(
        ("id" = Uuid, Path, description = "Promotion ID")
    ),
    responses(
        (status = 200, description = "Activated", body = ApiResponse<Promotion>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn activate_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Promotion>>> {
    let resp = promotion_service::set_promotion_active(&state, &user, id, true).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/promotions/{id}/deactivate",
    params(
        ("id" = Uuid, Path, description = "Promotion ID")
    ),
    responses(
        (status = 200, description = "Deactivated", body = ApiResponse<Promotion>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn deactivate_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Promotion>>> {
    let resp = promotion_service::set_promotion_active(&state, &user, id, false).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/promotions/best",
    request_body = BestPromotionRequest,
    responses(
        (status = 200, description = "Best applicable promotion", body = ApiResponse<BestPromotionResponse>),
    ),
    tag = "Promotions"
)]
pub async fn best_promotion(
    State(state): State<AppState>,
    Json(payload): Json<BestPromotionRequest>,
) -> AppResult<Json<ApiResponse<BestPromotionResponse>>> {
    let resp = promotion_service::find_best_promotion(&state, payload).await?;
    Ok(Json(resp))
}
