use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    pub order_id: Uuid,
    pub method: String,
    pub transaction_id: String,
}
