use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_marketplace_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let support_id = ensure_user(&pool, "support@example.com", "support123", "support").await?;
    let client_id = ensure_user(&pool, "client@example.com", "client123", "client").await?;
    let merchant_id = ensure_user(&pool, "merchant@example.com", "merchant123", "merchant").await?;
    let livreur_id = ensure_user(&pool, "livreur@example.com", "livreur123", "livreur").await?;

    ensure_courier_profile(&pool, livreur_id).await?;
    seed_products(&pool, merchant_id).await?;
    seed_promotion(&pool, merchant_id).await?;

    println!(
        "Seed completed. admin={admin_id} support={support_id} client={client_id} merchant={merchant_id} livreur={livreur_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_courier_profile(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO couriers (id, user_id, latitude, longitude, is_available)
        VALUES ($1, $2, 48.8566, 2.3522, true)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .execute(pool)
    .await?;

    println!("Ensured courier profile");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool, merchant_id: Uuid) -> anyhow::Result<()> {
    let products = vec![
        ("Espresso Beans 1kg", "Dark roast, whole beans", 145000, 80),
        ("Olive Oil 750ml", "Cold-pressed extra virgin", 98000, 120),
        ("Sourdough Loaf", "Baked every morning", 45000, 30),
        ("Orange Juice 1L", "Freshly squeezed", 52000, 60),
    ];

    for (name, desc, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, merchant_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (merchant_id, name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(merchant_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_promotion(pool: &sqlx::PgPool, merchant_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO promotions (id, merchant_id, code, discount_kind, discount_value, usage_limit)
        VALUES ($1, $2, 'WELCOME10', 'percentage', 10, 100)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(merchant_id)
    .execute(pool)
    .await?;

    println!("Seeded promotion WELCOME10");
    Ok(())
}
