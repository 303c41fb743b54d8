pub mod polls;

use actix_web::web;

/// Configure JSON API routes (mounted under `/api`).
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/polls/{id}/results", web::get().to(polls::results));
}
