use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_recipe_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user", "user123", "user").await?;
    seed_tags(&pool).await?;
    seed_ingredients(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    username: &str,
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
        INSERT INTO users (id, email, username, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(username)
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

async fn seed_tags(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let tags = vec![
        ("Breakfast", "breakfast"),
        ("Lunch", "lunch"),
        ("Dinner", "dinner"),
        ("Dessert", "dessert"),
    ];

    for (name, slug) in tags {
        sqlx::query(
            r#"
            INSERT INTO tags (id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await?;
    }

    println!("Seeded tags");
    Ok(())
}

async fn seed_ingredients(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let ingredients = vec![
        ("flour", "g"),
        ("sugar", "g"),
        ("butter", "g"),
        ("milk", "ml"),
        ("egg", "pcs"),
        ("salt", "g"),
        ("olive oil", "ml"),
        ("onion", "pcs"),
        ("garlic", "cloves"),
        ("tomato", "pcs"),
    ];

    for (name, unit) in ingredients {
        sqlx::query(
            r#"
            INSERT INTO ingredients (id, name, measurement_unit)
            VALUES ($1, $2, $3)
            ON CONFLICT (name, measurement_unit) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(unit)
        .execute(pool)
        .await?;
    }

    println!("Seeded ingredients");
    Ok(())
}
