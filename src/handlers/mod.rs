pub mod admin_handlers;
pub mod api_v1;
pub mod auth_handlers;
pub mod poll_handlers;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::auth::middleware::require_auth;

/// Register every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Root redirect
        .route("/", web::get().to(|| async { see_other("/polls/") }))
        // Polls
        .route("/polls/", web::get().to(poll_handlers::index))
        .route("/polls/{id}/", web::get().to(poll_handlers::detail))
        .route("/polls/{id}/results/", web::get().to(poll_handlers::results))
        .route("/polls/{id}/vote/", web::post().to(poll_handlers::vote))
        // Accounts
        .route("/login", web::get().to(auth_handlers::login_page))
        .route("/login", web::post().to(auth_handlers::login_submit))
        .route("/logout", web::post().to(auth_handlers::logout))
        .route("/signup", web::get().to(auth_handlers::signup_page))
        .route("/signup", web::post().to(auth_handlers::signup_submit))
        // JSON API
        .service(web::scope("/api").configure(api_v1::configure))
        // Admin: /admin/questions/new BEFORE /admin/questions/{id}
        .service(
            web::scope("/admin")
                .wrap(actix_web::middleware::from_fn(require_auth))
                .route("", web::get().to(|| async { see_other("/admin/questions") }))
                .route("/questions", web::get().to(admin_handlers::list))
                .route("/questions/new", web::get().to(admin_handlers::new_form))
                .route("/questions", web::post().to(admin_handlers::create))
                .route("/questions/{id}/delete", web::post().to(admin_handlers::delete)),
        );
}

/// 303 redirect, the response to every successful form POST.
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

/// Client address for logs: first `X-Forwarded-For`/`Forwarded` hop, else the peer.
pub fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}
