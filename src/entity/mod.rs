pub mod audit_logs;
pub mod couriers;
pub mod deliveries;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod products;
pub mod promotion_redemptions;
pub mod promotions;
pub mod support_tickets;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use couriers::Entity as Couriers;
pub use deliveries::Entity as Deliveries;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use products::Entity as Products;
pub use promotion_redemptions::Entity as PromotionRedemptions;
pub use promotions::Entity as Promotions;
pub use support_tickets::Entity as SupportTickets;
pub use users::Entity as Users;
