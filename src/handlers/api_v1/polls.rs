use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::presentation;

/// GET /api/polls/{id}/results - Question plus per-choice vote counts.
pub async fn results(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let view = presentation::results_context(&pool, path.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "question": view.question,
        "choices_with_counts": view.choices_with_counts,
        "total_votes": view.total_votes(),
    })))
}
