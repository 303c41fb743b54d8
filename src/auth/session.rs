use actix_session::Session;

use crate::errors::AppError;
use crate::models::user::User;

/// The authenticated principal for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

/// `None` means an anonymous visitor.
pub fn current_user(session: &Session) -> Option<CurrentUser> {
    let id = get_user_id(session)?;
    let username = session.get::<String>("username").unwrap_or(None).unwrap_or_default();
    let is_staff = session.get::<bool>("is_staff").unwrap_or(None).unwrap_or(false);
    Some(CurrentUser { id, username, is_staff })
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

/// Store the identity of a freshly authenticated user. Renews the session id first.
pub fn log_in(session: &Session, user: &User) -> Result<(), AppError> {
    session.renew();
    session
        .insert("user_id", user.id)
        .and_then(|_| session.insert("username", &user.username))
        .and_then(|_| session.insert("is_staff", user.is_staff))
        .map_err(|e| AppError::Session(e.to_string()))
}

pub fn set_flash(session: &Session, message: &str) {
    if let Err(e) = session.insert("flash", message) {
        log::warn!("Could not store flash message: {e}");
    }
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>("flash").unwrap_or(None);
    if flash.is_some() {
        session.remove("flash");
    }
    flash
}

/// Staff check for the admin screens.
pub fn require_staff(session: &Session) -> Result<CurrentUser, AppError> {
    match current_user(session) {
        Some(user) if user.is_staff => Ok(user),
        Some(user) => Err(AppError::PermissionDenied(format!("user {} is not staff", user.id))),
        None => Err(AppError::Session("User not logged in".to_string())),
    }
}
