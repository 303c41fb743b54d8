use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::middleware::safe_next;
use crate::auth::rate_limit::LoginRateLimiter;
use crate::auth::session::{current_user, log_in};
use crate::auth::{csrf, password, validate};
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::handlers::{client_ip, see_other};
use crate::models::user;
use crate::templates_structs::{LoginTemplate, PageContext, SignupTemplate};

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
    #[serde(default)]
    pub next: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

const INVALID_LOGIN: &str = "Invalid username or password";

pub async fn login_page(
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<LoginQuery>,
) -> Result<HttpResponse, AppError> {
    let next = safe_next(query.next.as_deref());
    if current_user(&session).is_some() {
        return Ok(see_other(&next));
    }

    let ctx = PageContext::build(&session, &config.app_name);
    render(LoginTemplate { ctx, error: None, next, username: String::new() })
}

pub async fn login_submit(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<LoginRateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let next = safe_next(Some(form.next.as_str()));
    let rerender = |error: &str| {
        let ctx = PageContext::build(&session, &config.app_name);
        render(LoginTemplate {
            ctx,
            error: Some(error.to_string()),
            next: next.clone(),
            username: form.username.trim().to_string(),
        })
    };

    // Rate-limit check BEFORE any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));
    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {}: too many failed attempts", client_ip(&req));
        return rerender("Too many failed login attempts. Please try again later.");
    }

    let Some(found) = user::find_by_username(&pool, &form.username).await? else {
        limiter.record_failure(ip);
        return rerender(INVALID_LOGIN);
    };

    match password::verify_password(&form.password, &found.password_hash) {
        Ok(true) => {
            limiter.clear(ip);
            log_in(&session, &found)?;
            log::info!("User {} logged in from {}", found.id, client_ip(&req));
            Ok(see_other(&next))
        }
        Ok(false) => {
            limiter.record_failure(ip);
            rerender(INVALID_LOGIN)
        }
        Err(e) => {
            log::error!("Unreadable password hash for user {}: {e}", found.id);
            limiter.record_failure(ip);
            rerender(INVALID_LOGIN)
        }
    }
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(see_other("/polls/"))
}

pub async fn signup_page(
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    if current_user(&session).is_some() {
        return Ok(see_other("/polls/"));
    }
    let ctx = PageContext::build(&session, &config.app_name);
    render(SignupTemplate { ctx, errors: vec![], username: String::new() })
}

pub async fn signup_submit(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let username = form.username.trim().to_string();
    let mut errors: Vec<String> = vec![];
    errors.extend(validate::validate_username(&username));
    errors.extend(validate::validate_password(&form.password));
    if form.password != form.confirm_password {
        errors.push("Passwords do not match".to_string());
    }
    if errors.is_empty() && user::username_exists(&pool, &username).await? {
        errors.push("That username is already taken".to_string());
    }

    if !errors.is_empty() {
        let ctx = PageContext::build(&session, &config.app_name);
        return render(SignupTemplate { ctx, errors, username });
    }

    let password_hash = password::hash_password(&form.password).map_err(AppError::Hash)?;
    let new_user = user::NewUser { username, password_hash, is_staff: false };
    let id = match user::create(&pool, &new_user).await {
        Ok(id) => id,
        Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
            let ctx = PageContext::build(&session, &config.app_name);
            return render(SignupTemplate {
                ctx,
                errors: vec!["That username is already taken".to_string()],
                username: new_user.username,
            });
        }
        Err(e) => return Err(e.into()),
    };
    let created = user::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;

    log_in(&session, &created)?;
    log::info!("User {id} signed up from {}", client_ip(&req));
    Ok(see_other("/polls/"))
}
