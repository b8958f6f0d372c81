use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Order lifecycle. `completed` and `cancelled` are terminal; every other
/// transition must appear in `can_transition_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, InProgress)
                | (Accepted, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "in_progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::BadRequest(format!(
                "invalid order status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InProgress,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::InProgress => "in_progress",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Cancelled) | (InProgress, Delivered) | (InProgress, Cancelled)
        )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "in_progress" => Ok(DeliveryStatus::InProgress),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            other => Err(AppError::BadRequest(format!(
                "invalid delivery status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (Open, Closed) | (InProgress, Resolved) | (InProgress, Closed) | (Resolved, Closed)
        )
    }
}

impl FromStr for TicketStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(AppError::BadRequest(format!(
                "invalid ticket status: {other}"
            ))),
        }
    }
}

/// How a promotion discounts an order subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }

    /// Discount in minor units for a given subtotal, never exceeding it.
    pub fn discount_on(&self, value: i64, subtotal: i64) -> i64 {
        let raw = match self {
            DiscountKind::Percentage => subtotal * value / 100,
            DiscountKind::Fixed => value,
        };
        raw.clamp(0, subtotal)
    }
}

impl FromStr for DiscountKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountKind::Percentage),
            "fixed" => Ok(DiscountKind::Fixed),
            other => Err(AppError::BadRequest(format!(
                "invalid discount kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    InApp,
    Push,
    Email,
    Sms,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::InApp => "in_app",
            NotificationChannel::Push => "push",
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Promotion {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub code: String,
    pub discount_kind: String,
    pub discount_value: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: i32,
    pub used_count: i32,
    pub is_active: bool,
    pub regions: Vec<String>,
    pub product_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub merchant_id: Uuid,
    pub promotion_id: Option<Uuid>,
    pub delivery_id: Option<Uuid>,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub status: String,
    pub address: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

/// One entry in a delivery's status history, stored as JSON on the row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusChange {
    pub status: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Delivery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub status: String,
    pub dest_latitude: f64,
    pub dest_longitude: f64,
    pub distance_km: Option<f64>,
    pub fee: i64,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Courier {
    pub id: Uuid,
    pub user_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_available: bool,
    pub deliveries_completed: i32,
    pub total_earnings: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: i64,
    pub method: String,
    pub transaction_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SupportTicket {
    pub id: Uuid,
    pub client_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

mod convert {
    use super::*;
    use crate::entity;

    impl From<entity::users::Model> for User {
        fn from(m: entity::users::Model) -> Self {
            Self {
                id: m.id,
                email: m.email,
                password_hash: m.password_hash,
                role: m.role,
                created_at: m.created_at.with_timezone(&Utc),
            }
        }
    }

    impl From<entity::products::Model> for Product {
        fn from(m: entity::products::Model) -> Self {
            Self {
                id: m.id,
                merchant_id: m.merchant_id,
                name: m.name,
                description: m.description,
                price: m.price,
                stock: m.stock,
                is_active: m.is_active,
                created_at: m.created_at.with_timezone(&Utc),
            }
        }
    }

    impl From<entity::promotions::Model> for Promotion {
        fn from(m: entity::promotions::Model) -> Self {
            Self {
                id: m.id,
                merchant_id: m.merchant_id,
                code: m.code,
                discount_kind: m.discount_kind,
                discount_value: m.discount_value,
                expires_at: m.expires_at.map(|dt| dt.with_timezone(&Utc)),
                usage_limit: m.usage_limit,
                used_count: m.used_count,
                is_active: m.is_active,
                regions: serde_json::from_value(m.regions).unwrap_or_default(),
                product_ids: serde_json::from_value(m.product_ids).unwrap_or_default(),
                created_at: m.created_at.with_timezone(&Utc),
            }
        }
    }

    impl From<entity::orders::Model> for Order {
        fn from(m: entity::orders::Model) -> Self {
            Self {
                id: m.id,
                client_id: m.client_id,
                merchant_id: m.merchant_id,
                promotion_id: m.promotion_id,
                delivery_id: m.delivery_id,
                subtotal: m.subtotal,
                discount: m.discount,
                total: m.total,
                status: m.status,
                address: m.address,
                note: m.note,
                created_at: m.created_at.with_timezone(&Utc),
                updated_at: m.updated_at.with_timezone(&Utc),
            }
        }
    }

    impl From<entity::order_items::Model> for OrderItem {
        fn from(m: entity::order_items::Model) -> Self {
            Self {
                id: m.id,
                order_id: m.order_id,
                product_id: m.product_id,
                quantity: m.quantity,
                price: m.price,
                created_at: m.created_at.with_timezone(&Utc),
            }
        }
    }

    impl From<entity::deliveries::Model> for Delivery {
        fn from(m: entity::deliveries::Model) -> Self {
            Self {
                id: m.id,
                order_id: m.order_id,
                courier_id: m.courier_id,
                status: m.status,
                dest_latitude: m.dest_latitude,
                dest_longitude: m.dest_longitude,
                distance_km: m.distance_km,
                fee: m.fee,
                history: serde_json::from_value(m.history).unwrap_or_default(),
                created_at: m.created_at.with_timezone(&Utc),
                updated_at: m.updated_at.with_timezone(&Utc),
            }
        }
    }

    impl From<entity::couriers::Model> for Courier {
        fn from(m: entity::couriers::Model) -> Self {
            Self {
                id: m.id,
                user_id: m.user_id,
                latitude: m.latitude,
                longitude: m.longitude,
                is_available: m.is_available,
                deliveries_completed: m.deliveries_completed,
                total_earnings: m.total_earnings,
                updated_at: m.updated_at.with_timezone(&Utc),
            }
        }
    }

    impl From<entity::payments::Model> for Payment {
        fn from(m: entity::payments::Model) -> Self {
            Self {
                id: m.id,
                order_id: m.order_id,
                amount: m.amount,
                method: m.method,
                transaction_id: m.transaction_id,
                status: m.status,
                created_at: m.created_at.with_timezone(&Utc),
            }
        }
    }

    impl From<entity::support_tickets::Model> for SupportTicket {
        fn from(m: entity::support_tickets::Model) -> Self {
            Self {
                id: m.id,
                client_id: m.client_id,
                assignee_id: m.assignee_id,
                subject: m.subject,
                body: m.body,
                status: m.status,
                created_at: m.created_at.with_timezone(&Utc),
                updated_at: m.updated_at.with_timezone(&Utc),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_rejects_unknown_values() {
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
        assert_eq!(
            "in_progress".parse::<OrderStatus>().unwrap(),
            OrderStatus::InProgress
        );
    }

    #[test]
    fn terminal_order_states_have_no_exits() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Completed.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn order_transition_table() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(Accepted.can_transition_to(InProgress));
        assert!(!Accepted.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!InProgress.can_transition_to(Pending));
    }

    #[test]
    fn delivery_transition_table() {
        use DeliveryStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn percentage_discount_is_share_of_subtotal() {
        assert_eq!(DiscountKind::Percentage.discount_on(10, 2000), 200);
        assert_eq!(DiscountKind::Percentage.discount_on(100, 2000), 2000);
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() {
        assert_eq!(DiscountKind::Fixed.discount_on(500, 2000), 500);
        assert_eq!(DiscountKind::Fixed.discount_on(5000, 2000), 2000);
        assert_eq!(DiscountKind::Fixed.discount_on(-5, 2000), 0);
    }
}
