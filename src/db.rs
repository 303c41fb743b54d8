use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::auth::password;
use crate::models::user;

pub static MIGRATIONS: Migrator = sqlx::migrate!("./migrations");

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATIONS.run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the staff account named in the environment if it does not exist yet.
pub async fn seed_admin(pool: &PgPool, username: &str, plain_password: &str) -> Result<(), String> {
    let existing = user::find_by_username(pool, username)
        .await
        .map_err(|e| e.to_string())?;
    if existing.is_some() {
        log::info!("Admin user '{username}' already present, skipping seed");
        return Ok(());
    }

    let hash = password::hash_password(plain_password)?;
    let id = user::create(
        pool,
        &user::NewUser {
            username: username.to_string(),
            password_hash: hash,
            is_staff: true,
        },
    )
    .await
    .map_err(|e| e.to_string())?;
    log::info!("Seeded admin user '{username}' (id={id})");
    Ok(())
}
