// Template context structures for Askama templates, organized by screen.

use actix_session::Session;

use crate::auth::csrf;
use crate::auth::session::{current_user, take_flash};

mod admin;
mod auth;
mod polls;

pub use admin::*;
pub use auth::*;
pub use polls::*;

/// Common context shared by all pages. Templates access these as `ctx.username`, etc.
pub struct PageContext {
    pub username: Option<String>,
    pub is_staff: bool,
    pub flash: Option<String>,
    pub app_name: String,
    pub csrf_token: String,
}

impl PageContext {
    /// Consumes the pending flash message.
    pub fn build(session: &Session, app_name: &str) -> Self {
        let user = current_user(session);
        Self {
            username: user.as_ref().map(|u| u.username.clone()),
            is_staff: user.as_ref().is_some_and(|u| u.is_staff),
            flash: take_flash(session),
            app_name: app_name.to_string(),
            csrf_token: csrf::get_or_create_token(session),
        }
    }
}
