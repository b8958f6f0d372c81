pub mod admin_service;
pub mod auth_service;
pub mod courier_service;
pub mod delivery_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
pub mod promotion_service;
pub mod support_service;
