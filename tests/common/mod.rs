//! Shared test infrastructure for the database-backed tests.
//!
//! Every test gets its own Postgres schema on the server named by `DATABASE_URL`,
//! with migrations applied, so tests can run in parallel without seeing each
//! other's rows. `DATABASE_URL` is required; without it the tests fail rather
//! than pass vacuously.
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgConnection, PgPool};

use polls::auth::session::CurrentUser;
use polls::models::choice::{self, Choice};
use polls::models::question::{self, NewQuestion, Question};
use polls::models::user::{self, NewUser};

// ============================================================================
// DATABASE SETUP
// ============================================================================

pub struct TestDb {
    pool: PgPool,
    url: String,
    schema: String,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Drop the per-test schema. Skipped if the test panicked before reaching it.
    pub async fn cleanup(self) {
        self.pool.close().await;
        if let Ok(mut conn) = PgConnection::connect(&self.url).await {
            let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
                .execute(&mut conn)
                .await;
        }
    }
}

pub async fn setup_test_db() -> TestDb {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a Postgres server for the database-backed tests");

    let suffix: u64 = rand::rng().random();
    let schema = format!("polls_test_{suffix:016x}");

    let mut admin = PgConnection::connect(&url).await.expect("Failed to connect to test DB");
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&mut admin)
        .await
        .expect("Failed to create test schema");
    admin.close().await.ok();

    let search_path = schema.clone();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .after_connect(move |conn, _meta| {
            let sql = format!("SET search_path TO {search_path}");
            Box::pin(async move {
                sqlx::query(&sql).execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await
        .expect("Failed to open test pool");

    polls::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    TestDb { pool, url, schema }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Postgres keeps microseconds; fixtures round to whole seconds so values survive a round trip.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    now - Duration::nanoseconds(i64::from(now.timestamp_subsec_nanos()))
}

pub async fn create_user(pool: &PgPool, username: &str) -> CurrentUser {
    let id = user::create(
        pool,
        &NewUser {
            username: username.to_string(),
            password_hash: polls::auth::password::hash_password("password123").expect("hash"),
            is_staff: false,
        },
    )
    .await
    .expect("create user");
    CurrentUser { id, username: username.to_string(), is_staff: false }
}

/// Question published `days` from `base` (negative = past), with optional end offset.
pub async fn create_question_at(
    pool: &PgPool,
    text: &str,
    base: DateTime<Utc>,
    days: i64,
    end_days: Option<i64>,
    choices: &[&str],
) -> (Question, Vec<Choice>) {
    let new = NewQuestion {
        question_text: text.to_string(),
        pub_date: base + Duration::days(days),
        end_date: end_days.map(|d| base + Duration::days(d)),
        choices: choices.iter().map(|c| c.to_string()).collect(),
    };
    let id = question::create(pool, &new).await.expect("create question");
    let q = question::find_by_id(pool, id)
        .await
        .expect("query")
        .expect("question exists");
    let cs = choice::find_for_question(pool, id).await.expect("choices");
    (q, cs)
}

pub async fn create_question(
    pool: &PgPool,
    text: &str,
    days: i64,
    end_days: Option<i64>,
    choices: &[&str],
) -> (Question, Vec<Choice>) {
    create_question_at(pool, text, now(), days, end_days, choices).await
}
