use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use password_hash::rand_core::OsRng;
use rust_decimal::Decimal;
use terral_admin::{config::AppConfig, db::create_pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(
        &pool,
        "Amina",
        "Odhiambo",
        "admin@terral.example",
        "admin123",
        "admin",
    )
    .await?;
    let customer_id = ensure_user(
        &pool,
        "Brian",
        "Mwangi",
        "customer@terral.example",
        "customer123",
        "customer",
    )
    .await?;

    seed_catalog(&pool).await?;
    seed_demo_order(&pool, customer_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<i64> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (first_name, last_name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = ["Apparel", "Drinkware", "Stationery"];
    for name in categories {
        sqlx::query("INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(pool)
            .await?;
    }

    let products: [(&str, &str, i64, i32, &str, &str); 4] = [
        ("Branded Hoodie", "Apparel", 2500, 50, "TRL-HD-001", "active"),
        ("Ceramic Mug", "Drinkware", 500, 120, "TRL-MG-001", "active"),
        ("Canvas Tote", "Apparel", 1000, 80, "TRL-TT-001", "featured"),
        ("Notebook A5", "Stationery", 350, 200, "TRL-NB-001", "active"),
    ];

    for (name, category, price, stock, sku, status) in products {
        sqlx::query(
            r#"
            INSERT INTO products (name, description, price, stock, category_id, sku, status, is_customizable)
            SELECT $1, $2, $3, $4, c.id, $5, $6, TRUE
            FROM categories c
            WHERE c.name = $7
            ON CONFLICT (sku) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(format!("{name} with optional custom print"))
        .bind(Decimal::from(price))
        .bind(stock)
        .bind(sku)
        .bind(status)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

/// One demo order with a pending M-Pesa payment so the validation flows
/// have something to chew on. Skipped when orders already exist.
async fn seed_demo_order(pool: &sqlx::PgPool, customer_id: i64) -> anyhow::Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        return Ok(());
    }

    let order: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO orders (user_id, status, total_price, shipping_address, shipping_city, shipping_cost)
        VALUES ($1, 'pending', $2, 'Moi Avenue 12', 'Nairobi', $3)
        RETURNING id
        "#,
    )
    .bind(customer_id)
    .bind(Decimal::from(2200))
    .bind(Decimal::from(200))
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO order_items (order_id, product_id, quantity, price)
        SELECT $1, p.id, 2, p.price FROM products p WHERE p.sku = 'TRL-MG-001'
        "#,
    )
    .bind(order.0)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO order_items (order_id, product_id, quantity, price, customization_text)
        SELECT $1, p.id, 1, p.price, 'Asante sana' FROM products p WHERE p.sku = 'TRL-TT-001'
        "#,
    )
    .bind(order.0)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO payments (order_id, status, payment_method, amount)
        VALUES ($1, 'pending', 'mpesa', $2)
        "#,
    )
    .bind(order.0)
    .bind(Decimal::from(2200))
    .execute(pool)
    .await?;

    println!("Seeded demo order #{}", order.0);
    Ok(())
}
