use chrono::{DateTime, Datelike, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::dto::promotions::{
    BestPromotionRequest, BestPromotionResponse, CreatePromotionRequest, PromotionList,
    UpdatePromotionRequest,
};
use crate::{
    access::Capability,
    audit,
    entity::promotions::{
        ActiveModel as PromotionActive, Column as PromoCol, Entity as Promotions,
        Model as PromotionModel,
    },
    entity::promotion_redemptions::ActiveModel as RedemptionActive,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DiscountKind, Promotion},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// A promotion is redeemable while it is active, under its usage limit and
/// not past its expiration date.
pub fn promotion_is_valid(promo: &PromotionModel, now: DateTime<Utc>) -> bool {
    promo.is_active
        && promo.used_count < promo.usage_limit
        && promo
            .expires_at
            .is_none_or(|expires| now <= expires.with_timezone(&Utc))
}

/// Product-applicability filter: an empty filter applies to every product.
pub fn promotion_applies_to(promo: &PromotionModel, product_ids: &[Uuid]) -> bool {
    let filter: Vec<Uuid> = serde_json::from_value(promo.product_ids.clone()).unwrap_or_default();
    filter.is_empty() || product_ids.iter().any(|id| filter.contains(id))
}

/// Discount the promotion would yield on a subtotal, in minor units.
pub fn promotion_discount(promo: &PromotionModel, subtotal: i64) -> i64 {
    match promo.discount_kind.parse::<DiscountKind>() {
        Ok(kind) => kind.discount_on(promo.discount_value, subtotal),
        Err(_) => 0,
    }
}

/// Pick the promotion yielding the maximum discount; strict `>` means the
/// first seen wins a tie. Returns the index into `promos` and the discount.
pub fn select_best(
    promos: &[PromotionModel],
    product_ids: &[Uuid],
    subtotal: i64,
    now: DateTime<Utc>,
) -> Option<(usize, i64)> {
    let mut best: Option<(usize, i64)> = None;
    for (idx, promo) in promos.iter().enumerate() {
        if !promotion_is_valid(promo, now) || !promotion_applies_to(promo, product_ids) {
            continue;
        }
        let discount = promotion_discount(promo, subtotal);
        match best {
            Some((_, current)) if discount > current => best = Some((idx, discount)),
            None => best = Some((idx, discount)),
            _ => {}
        }
    }
    best
}

/// Redemption period keys: ISO week (`YYYY-Wn`), month (`YYYY-M`), year.
pub fn period_keys(now: DateTime<Utc>) -> (String, String, String) {
    let iso = now.iso_week();
    (
        format!("{}-W{}", iso.year(), iso.week()),
        format!("{}-{}", now.year(), now.month()),
        format!("{}", now.year()),
    )
}

/// Redeem `promo` for an order inside the caller's transaction: bump the
/// usage counter and append a redemption record. The caller must hold a row
/// lock on the promotion.
pub async fn apply_promotion(
    txn: &DatabaseTransaction,
    promo: PromotionModel,
    order_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if !promotion_is_valid(&promo, now) {
        return Err(AppError::BadRequest("promotion is not valid".into()));
    }

    let promotion_id = promo.id;
    let used = promo.used_count;
    let mut active: PromotionActive = promo.into();
    active.used_count = Set(used + 1);
    active.update(txn).await?;

    let (week_key, month_key, year_key) = period_keys(now);
    RedemptionActive {
        id: Set(Uuid::new_v4()),
        promotion_id: Set(promotion_id),
        order_id: Set(order_id),
        user_id: Set(user_id),
        week_key: Set(week_key),
        month_key: Set(month_key),
        year_key: Set(year_key),
        created_at: NotSet,
    }
    .insert(txn)
    .await?;

    Ok(())
}

pub async fn list_promotions(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<PromotionList>> {
    user.ensure(Capability::ManagePromotions)?;
    let items = Promotions::find()
        .filter(PromoCol::MerchantId.eq(user.user_id))
        .order_by_desc(PromoCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Promotion::from)
        .collect();

    Ok(ApiResponse::success(
        "Promotions",
        PromotionList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_promotion(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    user.ensure(Capability::ManagePromotions)?;
    validate_discount(payload.discount_kind, payload.discount_value)?;
    if payload.usage_limit <= 0 {
        return Err(AppError::BadRequest("usage_limit must be positive".into()));
    }

    let exists = Promotions::find()
        .filter(PromoCol::Code.eq(payload.code.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("promotion code already exists".into()));
    }

    let promo = PromotionActive {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(user.user_id),
        code: Set(payload.code),
        discount_kind: Set(payload.discount_kind.as_str().to_string()),
        discount_value: Set(payload.discount_value),
        expires_at: Set(payload.expires_at.map(Into::into)),
        usage_limit: Set(payload.usage_limit),
        used_count: Set(0),
        is_active: Set(true),
        regions: Set(serde_json::json!(payload.regions)),
        product_ids: Set(serde_json::json!(payload.product_ids)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "promotion_create",
        Some("promotions"),
        Some(serde_json::json!({ "promotion_id": promo.id, "code": promo.code.clone() })),
    )
    .await;

    Ok(ApiResponse::success(
        "Promotion created",
        promo.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    user.ensure(Capability::ManagePromotions)?;
    let existing = Promotions::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    if existing.merchant_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let current_kind: DiscountKind = existing.discount_kind.parse()?;
    let kind = payload.discount_kind.unwrap_or(current_kind);
    let value = payload.discount_value.unwrap_or(existing.discount_value);
    validate_discount(kind, value)?;

    let mut active: PromotionActive = existing.into();
    active.discount_kind = Set(kind.as_str().to_string());
    active.discount_value = Set(value);
    if let Some(expires_at) = payload.expires_at {
        active.expires_at = Set(Some(expires_at.into()));
    }
    if let Some(usage_limit) = payload.usage_limit {
        if usage_limit <= 0 {
            return Err(AppError::BadRequest("usage_limit must be positive".into()));
        }
        active.usage_limit = Set(usage_limit);
    }
    if let Some(regions) = payload.regions {
        active.regions = Set(serde_json::json!(regions));
    }
    if let Some(product_ids) = payload.product_ids {
        active.product_ids = Set(serde_json::json!(product_ids));
    }

    let promo = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "promotion_update",
        Some("promotions"),
        Some(serde_json::json!({ "promotion_id": promo.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        promo.into(),
        Some(Meta::empty()),
    ))
}

/// Explicit activate/deactivate toggle.
pub async fn set_promotion_active(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    is_active: bool,
) -> AppResult<ApiResponse<Promotion>> {
    user.ensure(Capability::ManagePromotions)?;
    let existing = Promotions::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    if existing.merchant_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let mut active: PromotionActive = existing.into();
    active.is_active = Set(is_active);
    let promo = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        if is_active {
            "promotion_activate"
        } else {
            "promotion_deactivate"
        },
        Some("promotions"),
        Some(serde_json::json!({ "promotion_id": promo.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Promotion updated",
        promo.into(),
        Some(Meta::empty()),
    ))
}

/// Among the merchant's active promotions applicable to the given products,
/// return the one yielding the largest discount.
pub async fn find_best_promotion(
    state: &AppState,
    payload: BestPromotionRequest,
) -> AppResult<ApiResponse<BestPromotionResponse>> {
    let promos = Promotions::find()
        .filter(PromoCol::MerchantId.eq(payload.merchant_id))
        .filter(PromoCol::IsActive.eq(true))
        .order_by_asc(PromoCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let now = Utc::now();
    let best = select_best(&promos, &payload.product_ids, payload.subtotal, now);
    let resp = match best {
        Some((idx, discount)) => BestPromotionResponse {
            promotion: Some(promos[idx].clone().into()),
            discount,
        },
        None => BestPromotionResponse {
            promotion: None,
            discount: 0,
        },
    };

    Ok(ApiResponse::success("Best promotion", resp, None))
}

fn validate_discount(kind: DiscountKind, value: i64) -> Result<(), AppError> {
    if value <= 0 {
        return Err(AppError::BadRequest(
            "discount_value must be positive".into(),
        ));
    }
    if kind == DiscountKind::Percentage && value > 100 {
        return Err(AppError::BadRequest(
            "percentage discount cannot exceed 100".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn promo(
        active: bool,
        used: i32,
        limit: i32,
        expires_at: Option<DateTime<Utc>>,
        kind: &str,
        value: i64,
        products: Vec<Uuid>,
    ) -> PromotionModel {
        PromotionModel {
            id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            code: "PROMO".into(),
            discount_kind: kind.into(),
            discount_value: value,
            expires_at: expires_at.map(Into::into),
            usage_limit: limit,
            used_count: used,
            is_active: active,
            regions: serde_json::json!([]),
            product_ids: serde_json::json!(products),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn valid_when_active_under_limit_and_unexpired() {
        let now = Utc::now();
        let p = promo(true, 3, 10, None, "fixed", 100, vec![]);
        assert!(promotion_is_valid(&p, now));
    }

    #[test]
    fn invalid_when_usage_limit_reached() {
        let now = Utc::now();
        let p = promo(true, 10, 10, None, "fixed", 100, vec![]);
        assert!(!promotion_is_valid(&p, now));
    }

    #[test]
    fn invalid_when_expired_or_inactive() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let future = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();

        let expired = promo(true, 0, 10, Some(past), "fixed", 100, vec![]);
        assert!(!promotion_is_valid(&expired, now));

        let inactive = promo(false, 0, 10, Some(future), "fixed", 100, vec![]);
        assert!(!promotion_is_valid(&inactive, now));

        let live = promo(true, 0, 10, Some(future), "fixed", 100, vec![]);
        assert!(promotion_is_valid(&live, now));
    }

    #[test]
    fn empty_product_filter_applies_to_everything() {
        let p = promo(true, 0, 10, None, "fixed", 100, vec![]);
        assert!(promotion_applies_to(&p, &[Uuid::new_v4()]));
    }

    #[test]
    fn product_filter_requires_intersection() {
        let target = Uuid::new_v4();
        let p = promo(true, 0, 10, None, "fixed", 100, vec![target]);
        assert!(promotion_applies_to(&p, &[Uuid::new_v4(), target]));
        assert!(!promotion_applies_to(&p, &[Uuid::new_v4()]));
    }

    #[test]
    fn best_promotion_maximizes_discount() {
        let now = Utc::now();
        let promos = vec![
            promo(true, 0, 10, None, "fixed", 300, vec![]),
            promo(true, 0, 10, None, "percentage", 25, vec![]),
            promo(true, 0, 10, None, "fixed", 400, vec![]),
        ];
        // 25% of 2000 = 500 beats both fixed amounts.
        let (idx, discount) = select_best(&promos, &[Uuid::new_v4()], 2000, now).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(discount, 500);
    }

    #[test]
    fn best_promotion_tie_keeps_first_seen() {
        let now = Utc::now();
        let promos = vec![
            promo(true, 0, 10, None, "fixed", 500, vec![]),
            promo(true, 0, 10, None, "fixed", 500, vec![]),
        ];
        let (idx, _) = select_best(&promos, &[Uuid::new_v4()], 2000, now).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn best_promotion_skips_invalid_candidates() {
        let now = Utc::now();
        let promos = vec![
            promo(false, 0, 10, None, "fixed", 900, vec![]),
            promo(true, 0, 10, None, "fixed", 100, vec![]),
        ];
        let (idx, discount) = select_best(&promos, &[Uuid::new_v4()], 2000, now).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(discount, 100);
    }

    #[test]
    fn period_keys_use_iso_week() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        // 2026-01-01 falls in ISO week 2026-W1.
        let (week, month, year) = period_keys(at);
        assert_eq!(week, "2026-W1");
        assert_eq!(month, "2026-1");
        assert_eq!(year, "2026");
    }
}
