use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::dto::couriers::{SetAvailabilityRequest, UpdateLocationRequest};
use crate::{
    access::Capability,
    audit,
    entity::couriers::{ActiveModel as CourierActive, Column as CourierCol, Entity as Couriers},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Courier,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn update_location(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateLocationRequest,
) -> AppResult<ApiResponse<Courier>> {
    user.ensure(Capability::UpdateCourierProfile)?;
    if !(-90.0..=90.0).contains(&payload.latitude)
        || !(-180.0..=180.0).contains(&payload.longitude)
    {
        return Err(AppError::BadRequest("invalid coordinates".into()));
    }

    let courier = find_own_profile(state, user.user_id).await?;
    let mut active: CourierActive = courier.into();
    active.latitude = Set(Some(payload.latitude));
    active.longitude = Set(Some(payload.longitude));
    active.updated_at = Set(Utc::now().into());
    let courier = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Location updated",
        courier.into(),
        Some(Meta::empty()),
    ))
}

pub async fn set_availability(
    state: &AppState,
    user: &AuthUser,
    payload: SetAvailabilityRequest,
) -> AppResult<ApiResponse<Courier>> {
    user.ensure(Capability::UpdateCourierProfile)?;

    let courier = find_own_profile(state, user.user_id).await?;
    let mut active: CourierActive = courier.into();
    active.is_available = Set(payload.is_available);
    active.updated_at = Set(Utc::now().into());
    let courier = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "courier_availability",
        Some("couriers"),
        Some(serde_json::json!({ "is_available": payload.is_available })),
    )
    .await;

    Ok(ApiResponse::success(
        "Availability updated",
        courier.into(),
        Some(Meta::empty()),
    ))
}

/// Earnings and performance counters for the requesting livreur.
pub async fn my_stats(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Courier>> {
    user.ensure(Capability::UpdateCourierProfile)?;
    let courier = find_own_profile(state, user.user_id).await?;
    Ok(ApiResponse::success("Courier", courier.into(), None))
}

async fn find_own_profile(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<crate::entity::couriers::Model> {
    Couriers::find()
        .filter(CourierCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}
