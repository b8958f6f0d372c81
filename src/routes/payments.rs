use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payments::PayOrderRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Payment,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(pay_order))
}

#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = PayOrderRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<Payment>),
        (status = 400, description = "Order cannot be paid"),
        (status = 409, description = "Duplicate transaction id"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PayOrderRequest>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let resp = payment_service::pay_order(&state, &user, payload).await?;
    Ok(Json(resp))
}
