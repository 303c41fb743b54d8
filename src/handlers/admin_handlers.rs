use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::{require_staff, set_flash};
use crate::auth::validate;
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::CsrfOnly;
use crate::handlers::see_other;
use crate::models::question::{self, AdminQuestionFilter, NewQuestion, PubDateFilter};
use crate::templates_structs::{
    PageContext, PubDateFilterOption, QuestionAdminItem, QuestionFormTemplate, QuestionFormValues,
    QuestionListTemplate,
};

/// Number of choice inputs on the create form.
pub const CHOICE_SLOTS: usize = 3;

#[derive(Deserialize)]
pub struct QuestionForm {
    pub question_text: String,
    pub pub_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub choice_1: String,
    #[serde(default)]
    pub choice_2: String,
    #[serde(default)]
    pub choice_3: String,
    pub csrf_token: String,
}

impl QuestionForm {
    fn values(&self) -> QuestionFormValues {
        QuestionFormValues {
            question_text: self.question_text.clone(),
            pub_date: self.pub_date.clone(),
            end_date: self.end_date.clone(),
            choices: vec![self.choice_1.clone(), self.choice_2.clone(), self.choice_3.clone()],
        }
    }
}

/// Validate the create form. Blank choice lines are dropped; at least one must remain.
pub fn parse_question_form(form: &QuestionForm) -> Result<NewQuestion, Vec<String>> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&form.question_text, "Question text", 200));

    let pub_date = validate::parse_datetime_local(&form.pub_date);
    if pub_date.is_none() {
        errors.push("Publish date is required (YYYY-MM-DDTHH:MM)".to_string());
    }

    let end_date = if form.end_date.trim().is_empty() {
        None
    } else {
        match validate::parse_datetime_local(&form.end_date) {
            Some(end) => Some(end),
            None => {
                errors.push("End date must look like YYYY-MM-DDTHH:MM".to_string());
                None
            }
        }
    };

    if let (Some(start), Some(end)) = (pub_date, end_date) {
        if end < start {
            errors.push("End date must not be before the publish date".to_string());
        }
    }

    let choices: Vec<String> = [&form.choice_1, &form.choice_2, &form.choice_3]
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if choices.is_empty() {
        errors.push("At least one choice is required".to_string());
    }
    for choice in &choices {
        errors.extend(validate::validate_required(choice, "Choice text", 200));
    }

    match (errors.is_empty(), pub_date) {
        (true, Some(pub_date)) => Ok(NewQuestion {
            question_text: form.question_text.trim().to_string(),
            pub_date,
            end_date,
            choices,
        }),
        _ => Err(errors),
    }
}

#[derive(Deserialize)]
pub struct QuestionListQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub published: String,
}

impl QuestionListQuery {
    fn filter(&self) -> AdminQuestionFilter {
        AdminQuestionFilter {
            search: Some(self.q.trim().to_string()).filter(|s| !s.is_empty()),
            published: PubDateFilter::parse(&self.published),
        }
    }
}

/// GET /admin/questions?q=&published=
pub async fn list(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<QuestionListQuery>,
) -> Result<HttpResponse, AppError> {
    require_staff(&session)?;

    let now = Utc::now();
    let filter = query.filter();
    let questions = question::list_for_admin(&pool, &filter, now)
        .await?
        .iter()
        .map(|row| QuestionAdminItem::from_row(row, now))
        .collect();
    let date_filters = PubDateFilterOption::all(filter.published);
    let ctx = PageContext::build(&session, &config.app_name);
    render(QuestionListTemplate {
        ctx,
        questions,
        search: filter.search.unwrap_or_default(),
        date_filters,
    })
}

/// GET /admin/questions/new
pub async fn new_form(
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_staff(&session)?;

    let ctx = PageContext::build(&session, &config.app_name);
    let values = QuestionFormValues {
        pub_date: Utc::now().format("%Y-%m-%dT%H:%M").to_string(),
        choices: vec![String::new(); CHOICE_SLOTS],
        ..Default::default()
    };
    render(QuestionFormTemplate { ctx, values, errors: vec![] })
}

/// POST /admin/questions
pub async fn create(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<QuestionForm>,
) -> Result<HttpResponse, AppError> {
    let staff = require_staff(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let new_question = match parse_question_form(&form) {
        Ok(q) => q,
        Err(errors) => {
            let ctx = PageContext::build(&session, &config.app_name);
            return render(QuestionFormTemplate { ctx, values: form.values(), errors });
        }
    };

    let id = question::create(&pool, &new_question).await?;
    log::info!(
        "Question {id} created by user {} with {} choices",
        staff.id,
        new_question.choices.len()
    );

    set_flash(&session, "Question created");
    Ok(see_other("/admin/questions"))
}

/// POST /admin/questions/{id}/delete
pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    let staff = require_staff(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let id = path.into_inner();
    if !question::delete(&pool, id).await? {
        return Err(AppError::NotFound);
    }
    log::info!("Question {id} deleted by user {}", staff.id);

    set_flash(&session, "Question deleted");
    Ok(see_other("/admin/questions"))
}
