use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::middleware::login_redirect;
use crate::auth::session::{current_user, set_flash};
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::handlers::{client_ip, see_other};
use crate::models::vote::{self, VoteError, VoteOutcome};
use crate::presentation::{self, DetailView};
use crate::templates_structs::{DetailTemplate, IndexTemplate, PageContext, ResultsTemplate};

#[derive(Deserialize)]
pub struct VoteForm {
    /// Absent when the user submits without picking a radio button.
    #[serde(default)]
    pub choice: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

/// GET /polls/
pub async fn index(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let view = presentation::index_context(&pool, Utc::now()).await?;
    let ctx = PageContext::build(&session, &config.app_name);
    render(IndexTemplate { ctx, view })
}

/// GET /polls/{id}/
/// Voting form. Unpublished questions are 404; closed ones bounce to results.
pub async fn detail(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let question_id = path.into_inner();
    let user = current_user(&session);

    match presentation::detail_context(&pool, question_id, user.as_ref(), Utc::now()).await? {
        DetailView::Render(view) => {
            let ctx = PageContext::build(&session, &config.app_name);
            render(DetailTemplate { ctx, view, error_message: None })
        }
        DetailView::RedirectToResults { question_id, message } => {
            set_flash(&session, &message);
            Ok(see_other(&vote::results_url(question_id)))
        }
    }
}

/// GET /polls/{id}/results/
pub async fn results(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let view = presentation::results_context(&pool, path.into_inner(), Utc::now()).await?;
    let ctx = PageContext::build(&session, &config.app_name);
    render(ResultsTemplate { ctx, view })
}

/// POST /polls/{id}/vote/
pub async fn vote(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<VoteForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let question_id = path.into_inner();
    let user = current_user(&session);
    let choice_id = form
        .choice
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok());
    let ip = client_ip(&req);

    let err = match vote::cast_vote(&pool, question_id, choice_id, user.as_ref(), Utc::now()).await {
        Ok(cast) => {
            let user_id = user.as_ref().map_or(0, |u| u.id);
            match cast.outcome {
                VoteOutcome::Created { vote_id } => log::info!(
                    "Vote {vote_id} created: user={user_id} question={question_id} ip={ip}"
                ),
                VoteOutcome::Changed { vote_id, previous_choice_id } => log::info!(
                    "Vote {vote_id} changed from choice {previous_choice_id}: user={user_id} question={question_id} ip={ip}"
                ),
            }
            return Ok(see_other(&cast.redirect_to));
        }
        Err(err) => err,
    };

    log::warn!("Vote rejected on question {question_id} from {ip}: {err}");
    let message = err.to_string();
    match err {
        VoteError::NotFound => Err(AppError::NotFound),
        VoteError::InvalidChoice { question } => {
            let view = presentation::voting_form(&pool, question, user.as_ref()).await?;
            let ctx = PageContext::build(&session, &config.app_name);
            render(DetailTemplate { ctx, view, error_message: Some(message) })
        }
        VoteError::Unauthenticated => {
            if user.is_some() {
                // Account is gone; drop the stale identity before asking for a login.
                session.purge();
            }
            Ok(see_other(&login_redirect(&format!("/polls/{question_id}/"))))
        }
        VoteError::VotingClosed { question_id, .. } => {
            set_flash(&session, &message);
            Ok(see_other(&vote::results_url(question_id)))
        }
        VoteError::Conflict => {
            set_flash(&session, &message);
            Ok(see_other(&format!("/polls/{question_id}/")))
        }
        VoteError::Db(e) => Err(AppError::Db(e)),
    }
}
