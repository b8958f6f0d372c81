use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{DiscountKind, Promotion};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePromotionRequest {
    pub code: String,
    pub discount_kind: DiscountKind,
    pub discount_value: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: i32,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePromotionRequest {
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub regions: Option<Vec<String>>,
    pub product_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PromotionList {
    #[schema(value_type = Vec<Promotion>)]
    pub items: Vec<Promotion>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BestPromotionRequest {
    pub merchant_id: Uuid,
    pub product_ids: Vec<Uuid>,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BestPromotionResponse {
    pub promotion: Option<Promotion>,
    pub discount: i64,
}
