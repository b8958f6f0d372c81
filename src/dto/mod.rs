pub mod auth;
pub mod couriers;
pub mod deliveries;
pub mod orders;
pub mod payments;
pub mod products;
pub mod promotions;
pub mod support;
