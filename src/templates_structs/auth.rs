use askama::Template;

use super::PageContext;

#[derive(Template)]
#[template(path = "registration/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub next: String,
    pub username: String,
}

#[derive(Template)]
#[template(path = "registration/signup.html")]
pub struct SignupTemplate {
    pub ctx: PageContext,
    pub errors: Vec<String>,
    pub username: String,
}
