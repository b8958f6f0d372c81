use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::support::{
        AssignTicketRequest, CreateTicketRequest, TicketList, UpdateTicketStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::SupportTicket,
    response::ApiResponse,
    routes::params::TicketListQuery,
    services::support_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tickets", post(create_ticket))
        .route("/tickets", get(list_tickets))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/assign", patch(assign_ticket))
        .route("/tickets/{id}/status", patch(update_ticket_status))
}

#[utoipa::path(
    post,
    path = "/api/support/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = ApiResponse<SupportTicket>),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTicketRequest>,
) -> AppResult<Json<ApiResponse<SupportTicket>>> {
    let resp = support_service::create_ticket(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/support/tickets",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
    ),
    responses(
        (status = 200, description = "List tickets", body = ApiResponse<TicketList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = support_service::list_tickets(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/support/tickets/{id}",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    responses(
        (status = 200, description = "Ticket", body = ApiResponse<SupportTicket>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SupportTicket>>> {
    let resp = support_service::get_ticket(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/support/tickets/{id}/assign",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = AssignTicketRequest,
    responses(
        (status = 200, description = "Ticket assigned", body = ApiResponse<SupportTicket>),
        (status = 400, description = "Ticket cannot be assigned"),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn assign_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignTicketRequest>,
) -> AppResult<Json<ApiResponse<SupportTicket>>> {
    let resp = support_service::assign_ticket(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/support/tickets/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = UpdateTicketStatusRequest,
    responses(
        (status = 200, description = "Ticket updated", body = ApiResponse<SupportTicket>),
        (status = 400, description = "Invalid status or transition"),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn update_ticket_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketStatusRequest>,
) -> AppResult<Json<ApiResponse<SupportTicket>>> {
    let resp = support_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
