#![allow(dead_code)]

use axum_marketplace_api::{
    cache::DeliveryCache,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        couriers::ActiveModel as CourierActive, products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    notify::Notifier,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

/// Build an `AppState` against TEST_DATABASE_URL (or DATABASE_URL) with a
/// clean schema, or `None` when no database is configured so the caller can
/// skip.
pub async fn try_setup() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE promotion_redemptions, order_items, payments, deliveries, notifications, \
         audit_logs, support_tickets, orders, promotions, products, couriers, users \
         RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState {
        pool,
        notifier: Notifier::spawn(orm.clone()),
        delivery_cache: DeliveryCache::new(),
        orm,
    }))
}

pub async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

pub async fn create_product(
    state: &AppState,
    merchant_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<axum_marketplace_api::entity::products::Model> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(merchant_id),
        name: Set(name.into()),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        stock: Set(stock),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product)
}

pub async fn create_courier(
    state: &AppState,
    user_id: Uuid,
    latitude: f64,
    longitude: f64,
) -> anyhow::Result<axum_marketplace_api::entity::couriers::Model> {
    let courier = CourierActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        latitude: Set(Some(latitude)),
        longitude: Set(Some(longitude)),
        is_available: Set(true),
        deliveries_completed: Set(0),
        total_earnings: Set(0),
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(courier)
}
