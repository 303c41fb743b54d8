//! End-to-end tests through the actix routing table.
//!
//! Drives the app the way a browser would: cookie session carried between
//! requests, CSRF token scraped from rendered forms.

mod common;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use regex::Regex;

use common::{create_question, create_user, setup_test_db};
use polls::auth::rate_limit::LoginRateLimiter;
use polls::config::AppConfig;
use polls::handlers;
use polls::models::vote;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        bind_addr: "127.0.0.1:0".to_string(),
        app_name: "Polls".to_string(),
        session_key: None,
        admin_username: None,
        admin_password: None,
        db_max_connections: 5,
    }
}

/// Full routing table over a fresh cookie session key.
macro_rules! init_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(test_config()))
                .app_data(web::Data::new(LoginRateLimiter::new()))
                .configure(handlers::configure),
        )
        .await
    };
}

/// Latest session cookie from a response, falling back to the one already held.
fn session_cookie<B>(resp: &ServiceResponse<B>, current: Option<Cookie<'static>>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
        .or(current)
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn csrf_token(html: &str) -> String {
    let re = Regex::new(r#"name="csrf_token" value="([0-9a-f]{64})""#).expect("regex");
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .expect("page should carry a CSRF token")
}

#[actix_rt::test]
async fn test_index_without_questions() {
    let db = setup_test_db().await;
    let app = init_app!(db.pool());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/polls/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("No polls are available."));

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_root_redirects_to_polls() {
    let db = setup_test_db().await;
    let app = init_app!(db.pool());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/polls/");

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_future_question_detail_is_404() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (future, _) = create_question(pool, "Future question.", 5, None, &["A"]).await;
    let app = init_app!(pool);

    let uri = format!("/polls/{}/", future.id);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let uri = format!("/polls/{}/results/", future.id);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_closed_question_detail_redirects_with_message() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (closed, _) = create_question(pool, "Old news", -3, Some(-2), &["A"]).await;
    let app = init_app!(pool);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&format!("/polls/{}/", closed.id)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/polls/{}/results/", closed.id));
    let cookie = session_cookie(&resp, None).expect("flash stored in session");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/polls/{}/results/", closed.id))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("You are not allowed to vote on question &quot;Old news&quot;")
        || body.contains("You are not allowed to vote on question &#34;Old news&#34;"));

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_vote_on_future_question_is_404() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (future, choices) = create_question(pool, "Secret launch", 30, None, &["Hidden option"]).await;
    let app = init_app!(pool);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    let cookie = session_cookie(&resp, None).expect("csrf session");
    let token = csrf_token(&String::from_utf8_lossy(&test::read_body(resp).await));

    let uri = format!("/polls/{}/vote/", future.id);
    let submissions = [
        vec![("csrf_token", token.clone())],
        vec![("choice", choices[0].id.to_string()), ("csrf_token", token.clone())],
    ];
    for form in submissions {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&uri)
                .cookie(cookie.clone())
                .set_form(form)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
        assert!(!body.contains("Secret launch"));
        assert!(!body.contains("Hidden option"));
    }

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_anonymous_vote_redirects_to_login() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (q, choices) = create_question(pool, "Anon vote", -1, None, &["A"]).await;
    let app = init_app!(pool);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&format!("/polls/{}/", q.id)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp, None).expect("csrf session");
    let token = csrf_token(&String::from_utf8_lossy(&test::read_body(resp).await));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/polls/{}/vote/", q.id))
            .cookie(cookie)
            .set_form([("choice", choices[0].id.to_string()), ("csrf_token", token)])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/login?next="));
    assert!(vote::find_for_question(pool, q.id).await.expect("votes").is_empty());

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_vote_without_csrf_is_forbidden() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (q, choices) = create_question(pool, "No token", -1, None, &["A"]).await;
    let app = init_app!(pool);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/polls/{}/vote/", q.id))
            .set_form([("choice", choices[0].id.to_string())])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_login_vote_and_change_vote() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (q, choices) = create_question(pool, "Favourite colour?", -1, None, &["Red", "Blue"]).await;
    create_user(pool, "http_voter").await;
    let app = init_app!(pool);

    // Login page hands out the CSRF token
    let resp = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let mut cookie = session_cookie(&resp, None);
    let token = csrf_token(&String::from_utf8_lossy(&test::read_body(resp).await));

    let next = format!("/polls/{}/", q.id);
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .cookie(cookie.clone().expect("cookie"))
            .set_form([
                ("username", "http_voter".to_string()),
                ("password", "password123".to_string()),
                ("csrf_token", token),
                ("next", next.clone()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), next);
    cookie = session_cookie(&resp, cookie);

    // The session was renewed on login, so fetch a fresh token from the form
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&next).cookie(cookie.clone().expect("cookie")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    cookie = session_cookie(&resp, cookie);
    let token = csrf_token(&String::from_utf8_lossy(&test::read_body(resp).await));

    for choice in [&choices[0], &choices[1]] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/polls/{}/vote/", q.id))
                .cookie(cookie.clone().expect("cookie"))
                .set_form([("choice", choice.id.to_string()), ("csrf_token", token.clone())])
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), format!("/polls/{}/results/", q.id));
        cookie = session_cookie(&resp, cookie);
    }

    let rows = vote::find_for_question(pool, q.id).await.expect("votes");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].choice_id, choices[1].id);

    // Detail page now shows the current selection
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&next).cookie(cookie.clone().expect("cookie")).to_request(),
    )
    .await;
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Your current vote: Blue"));

    // Submitting without a choice re-renders the form with the inline message
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/polls/{}/vote/", q.id))
            .cookie(cookie.clone().expect("cookie"))
            .set_form([("csrf_token", token.clone())])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("You didn&#39;t select a choice.") || body.contains("You didn&#x27;t select a choice."));

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_admin_requires_login() {
    let db = setup_test_db().await;
    let app = init_app!(db.pool());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/admin/questions").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/login"));

    db.cleanup().await;
}

#[actix_rt::test]
async fn test_results_api_returns_counts() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (q, choices) = create_question(pool, "API poll", -1, None, &["Yes", "No"]).await;
    let u = create_user(pool, "api_voter").await;
    vote::cast_vote(pool, q.id, Some(choices[1].id), Some(&u), common::now())
        .await
        .expect("vote");
    let app = init_app!(pool);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&format!("/api/polls/{}/results", q.id)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["question"]["question_text"], "API poll");
    assert_eq!(json["choices_with_counts"][1]["votes"], 1);
    assert_eq!(json["total_votes"], 1);

    db.cleanup().await;
}
