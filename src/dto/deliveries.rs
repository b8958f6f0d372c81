use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::Delivery;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DispatchDeliveryRequest {
    pub order_id: Uuid,
    pub dest_coords: GeoPoint,
    pub fee: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignDeliveryRequest {
    pub livreur_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeliveryStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistanceRequest {
    pub start_coords: GeoPoint,
    pub end_coords: GeoPoint,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DistanceResponse {
    /// Great-circle distance in kilometers.
    pub distance: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailableDelivery {
    pub delivery: Delivery,
    pub distance_km: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailableDeliveryList {
    pub items: Vec<AvailableDelivery>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryList {
    pub items: Vec<Delivery>,
}
