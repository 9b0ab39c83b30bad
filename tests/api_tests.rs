//! HTTP 层集成测试：完整路由 + 中间件 + 临时 SQLite

mod common;

use std::net::SocketAddr;

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{App, test};
use serde_json::{Value, json};

use common::TestEnv;
use surveyhub::api::middleware::RequestIdMiddleware;

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn survey_body(name: &str, max_responses: i64) -> Value {
    json!({
        "surveyName": name,
        "description": "api test",
        "projectIdFromClient": "C-1",
        "projectIdFromInter": format!("I-{}", name),
        "questions": [
            { "questionText": "Name?", "answerType": "text" },
            { "questionText": "Colour?", "answerType": "single", "options": ["Red", "Blue"] }
        ],
        "redirectUrl": "https://example.com/done",
        "maxResponses": max_responses
    })
}

fn registration_body(email: &str) -> Value {
    let mut body = json!({
        "fullName": "Pat Panel",
        "email": email,
        "age": "25-34",
        "gender": "Other",
        "location": "Berlin",
        "jobTitle": "Analyst",
        "ageConfirm": "Yes",
        "finalConsent": true
    });
    for field in surveyhub::services::REQUIRED_PROFILE_FIELDS {
        if body.get(*field).is_none() {
            body[*field] = json!("Some answer");
        }
    }
    body
}

macro_rules! init_app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .configure(|cfg| $env.ctx.configure_app(cfg)),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/admin/login")
            .peer_addr(peer())
            .set_json(json!({ "username": "root", "password": "secret123" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        assert_eq!(body["success"], true, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }};
}

async fn env_with_admin() -> TestEnv {
    let env = TestEnv::new().await;
    env.ctx
        .admins
        .create_admin("root", "secret123")
        .await
        .unwrap();
    env
}

#[actix_rt::test]
async fn test_login_and_profile() {
    let env = env_with_admin().await;
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri("/api/admin/login")
        .peer_addr(peer())
        .set_json(json!({ "username": "root", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("x-request-id"));

    let token = login!(app);

    let req = test::TestRequest::get()
        .uri("/api/admin/getAdmin/any")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    // 未知 id 返回 404，而不是 401
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_admin_routes_require_token() {
    let env = env_with_admin().await;
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri("/api/survey/create")
        .set_json(survey_body("NoAuth", 5))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/dashboard/dashboard")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_survey_lifecycle_over_http() {
    let env = env_with_admin().await;
    let app = init_app!(env);
    let token = login!(app);
    let auth = ("Authorization", format!("Bearer {}", token));

    let req = test::TestRequest::post()
        .uri("/api/survey/create")
        .insert_header(auth.clone())
        .set_json(survey_body("Http", 1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["_id"].as_str().unwrap().to_string();
    assert!(body["generatedLink"].as_str().unwrap().contains(&id));
    let question_ids: Vec<String> = body["data"]["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["_id"].as_str().unwrap().to_string())
        .collect();
    assert!(question_ids.iter().all(|id| !id.is_empty()));

    // 公开取卷不需要 token
    let req = test::TestRequest::get()
        .uri(&format!("/api/survey/public/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["surveyName"], "Http");
    assert!(body["data"].get("maxResponses").is_none());

    let req = test::TestRequest::post()
        .uri(&format!("/api/submission/{}", id))
        .peer_addr(peer())
        .set_json(json!({ "responses": [
            { "questionId": question_ids[0], "answer": "Ann" },
            { "questionId": question_ids[1], "answer": "Red" }
        ] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["redirectUrl"], "https://example.com/done");

    // 配额为 1，第二次提交被拒
    let req = test::TestRequest::post()
        .uri(&format!("/api/submission/{}", id))
        .set_json(json!({ "responses": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());

    let req = test::TestRequest::get()
        .uri(&format!("/api/survey/getServey/{}", id))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["isFull"], true);
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["stats"]["submissions"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/submission/survey/{}/export", id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/csv"));
    let csv = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&csv).contains("Ann"));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/survey/surveys/{}", id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/survey/public/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_toggle_and_click_callback() {
    let env = env_with_admin().await;
    let app = init_app!(env);
    let token = login!(app);
    let auth = ("Authorization", format!("Bearer {}", token));

    let req = test::TestRequest::post()
        .uri("/api/survey")
        .insert_header(auth.clone())
        .set_json(survey_body("Toggle", 10))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/survey/survey/toggle/{}", id))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["message"], "Survey deactivated");

    let req = test::TestRequest::get()
        .uri(&format!("/api/survey/public/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/survey/click?sid={}&status=terminate&uid=u-9", id))
        .peer_addr(peer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "terminate");
    assert_eq!(body["data"]["userId"], "u-9");

    let req = test::TestRequest::get()
        .uri("/api/survey/click?status=bogus")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/survey/terminate-survey")
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/survey/clicks/export?status=nope")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_dashboard_filters() {
    let env = env_with_admin().await;
    let app = init_app!(env);
    let token = login!(app);
    let auth = ("Authorization", format!("Bearer {}", token));

    let req = test::TestRequest::get()
        .uri("/api/dashboard/dashboard?filter=weekly")
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["totalSurveys"], 0);
    assert_eq!(body["data"]["today"]["todayClicks"], 0);

    let req = test::TestRequest::get()
        .uri("/api/dashboard/dashboard?filter=fortnight")
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_link_crud() {
    let env = env_with_admin().await;
    let app = init_app!(env);
    let token = login!(app);
    let auth = ("Authorization", format!("Bearer {}", token));

    let req = test::TestRequest::post()
        .uri("/api/surveylink/links")
        .insert_header(auth.clone())
        .set_json(json!({ "name": "Vendor A", "parameters": { "src": "va" }, "status": "complete" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["_id"].as_str().unwrap().to_string();
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.contains("status=complete"));
    assert!(url.contains("src=va"));

    let req = test::TestRequest::put()
        .uri(&format!("/api/surveylink/links/{}/toggle-status", id))
        .insert_header(auth.clone())
        .set_json(json!({ "isActive": false }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["isActive"], false);

    let req = test::TestRequest::get()
        .uri("/api/surveylink/get-links")
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/surveylink/links/{}", id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/surveylink/links/{}", id))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_otp_and_registration_over_http() {
    let env = env_with_admin().await;
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri("/api/otp/send")
        .peer_addr(peer())
        .set_json(json!({ "email": "panel@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let code = env.sender.last_code_for("panel@example.com").unwrap();

    let req = test::TestRequest::post()
        .uri("/api/otp/verify")
        .set_json(json!({ "email": "panel@example.com", "otp": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/registration/add")
        .set_json(registration_body("panel@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // 列表需要 token
    let req = test::TestRequest::get()
        .uri("/api/registration/get")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = login!(app);
    let req = test::TestRequest::get()
        .uri("/api/registration/get?search=pat")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["email"], "panel@example.com");
    assert_eq!(body["data"][0]["jobTitle"], "Analyst");
}

#[actix_rt::test]
async fn test_health_is_public() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "up");
}
