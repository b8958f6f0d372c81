use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod couriers;
pub mod deliveries;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod promotions;
pub mod support;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/promotions", promotions::router())
        .nest("/orders", orders::router())
        .nest("/deliveries", deliveries::router())
        .nest("/couriers", couriers::router())
        .nest("/payments", payments::router())
        .nest("/support", support::router())
        .nest("/admin", admin::router())
}
