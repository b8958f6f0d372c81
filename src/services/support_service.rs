use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::dto::support::{
    AssignTicketRequest, CreateTicketRequest, TicketList, UpdateTicketStatusRequest,
};
use crate::{
    access::{Capability, Role},
    audit,
    entity::support_tickets::{
        ActiveModel as TicketActive, Column as TicketCol, Entity as SupportTickets,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{NotificationChannel, SupportTicket, TicketStatus},
    response::{ApiResponse, Meta},
    routes::params::TicketListQuery,
    state::AppState,
};

pub async fn create_ticket(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTicketRequest,
) -> AppResult<ApiResponse<SupportTicket>> {
    user.ensure(Capability::OpenTicket)?;
    if payload.subject.trim().is_empty() {
        return Err(AppError::BadRequest("subject is required".into()));
    }

    let ticket = TicketActive {
        id: Set(Uuid::new_v4()),
        client_id: Set(user.user_id),
        assignee_id: Set(None),
        subject: Set(payload.subject),
        body: Set(payload.body),
        status: Set(TicketStatus::Open.as_str().into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_create",
        Some("support_tickets"),
        Some(serde_json::json!({ "ticket_id": ticket.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket created",
        ticket.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_tickets(
    state: &AppState,
    user: &AuthUser,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    match user.role {
        Role::Admin | Role::Support => {}
        Role::Client => condition = condition.add(TicketCol::ClientId.eq(user.user_id)),
        _ => return Err(AppError::Forbidden),
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(TicketCol::Status.eq(status.clone()));
    }

    let finder = SupportTickets::find()
        .filter(condition)
        .order_by_desc(TicketCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(SupportTicket::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Tickets", TicketList { items }, Some(meta)))
}

pub async fn get_ticket(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SupportTicket>> {
    let ticket = SupportTickets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let allowed = ticket.client_id == user.user_id
        || matches!(user.role, Role::Admin | Role::Support);
    if !allowed {
        return Err(AppError::Forbidden);
    }

    Ok(ApiResponse::success("Ticket", ticket.into(), None))
}

/// Claim a ticket for an agent; an open ticket moves to in_progress.
pub async fn assign_ticket(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AssignTicketRequest,
) -> AppResult<ApiResponse<SupportTicket>> {
    user.ensure(Capability::ManageTickets)?;

    let ticket = SupportTickets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: TicketStatus = ticket.status.parse()?;
    if !current.can_transition_to(TicketStatus::InProgress) {
        return Err(AppError::BadRequest(format!(
            "ticket in status {} cannot be assigned",
            ticket.status
        )));
    }

    let mut active: TicketActive = ticket.into();
    active.assignee_id = Set(Some(payload.assignee_id));
    active.status = Set(TicketStatus::InProgress.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let ticket = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_assign",
        Some("support_tickets"),
        Some(serde_json::json!({ "ticket_id": ticket.id, "assignee_id": payload.assignee_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket assigned",
        ticket.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTicketStatusRequest,
) -> AppResult<ApiResponse<SupportTicket>> {
    user.ensure(Capability::ManageTickets)?;
    let next: TicketStatus = payload.status.parse()?;

    let ticket = SupportTickets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: TicketStatus = ticket.status.parse()?;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "cannot transition ticket from {} to {}",
            ticket.status, payload.status
        )));
    }

    let client_id = ticket.client_id;
    let mut active: TicketActive = ticket.into();
    active.status = Set(next.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let ticket = active.update(&state.orm).await?;

    if next == TicketStatus::Resolved {
        state.notifier.notify(
            client_id,
            NotificationChannel::Email,
            "Ticket resolved",
            format!("Your ticket \"{}\" was resolved", ticket.subject),
        );
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_status_update",
        Some("support_tickets"),
        Some(serde_json::json!({ "ticket_id": ticket.id, "status": ticket.status })),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket updated",
        ticket.into(),
        Some(Meta::empty()),
    ))
}
