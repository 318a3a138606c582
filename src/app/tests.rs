// Endpoint tests, the whole router against a throwaway
// database.

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use crate::config::Config;
use crate::db::entities::Role;
use crate::db::testing::{insert_test_user, test_db};
use crate::newsletter::mailer::testing::RecordingMailer;
use crate::scraper::testing::StubTranslator;
use super::*;

const API_KEY: &str = "test-api-key";

fn state(pool: &Pool, mailer: &RecordingMailer) -> web::Data<AppState> {
  let config = Config::for_tests("unused");
  web::Data::new(
    AppState::new(&config, pool.clone(), Box::new(mailer.clone()), Box::new(StubTranslator))
      .unwrap()
  )
}

macro_rules! test_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data($state.clone())
        .configure(extractor_config)
        .configure(configure_routes)
        .default_service(web::route().to(not_found))
    ).await
  };
}

fn token_for(state: &AppState, email: &str, role: Role) -> String {
  let user = insert_test_user(&state.pool, email, role);
  state.tokens.issue(&user).unwrap()
}

#[actix_web::test]
async fn unknown_route_is_a_json_404() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
  assert_eq!(StatusCode::NOT_FOUND, resp.status());
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].is_string());
}

#[actix_web::test]
async fn duplicate_registration_keeps_one_row() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  let payload = json!({
    "email": "Reader@Example.com",
    "password": "long enough password",
    "display_name": "Reader"
  });
  let first = test::call_service(&app, test::TestRequest::post()
    .uri("/api/auth/register")
    .set_json(&payload)
    .to_request()).await;
  assert_eq!(StatusCode::CREATED, first.status());
  let body: Value = test::read_body_json(first).await;
  assert!(body["token"].is_string());
  assert_eq!("reader@example.com", body["user"]["email"]);

  let second = test::call_service(&app, test::TestRequest::post()
    .uri("/api/auth/register")
    .set_json(&payload)
    .to_request()).await;
  assert_eq!(StatusCode::BAD_REQUEST, second.status());
  assert_eq!(1, db::user_count(&db.pool).unwrap());
}

#[actix_web::test]
async fn invalid_registration_lists_field_errors() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  let resp = test::call_service(&app, test::TestRequest::post()
    .uri("/api/auth/register")
    .set_json(json!({ "email": "nope", "password": "short", "display_name": "" }))
    .to_request()).await;
  assert_eq!(StatusCode::BAD_REQUEST, resp.status());
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(3, body["details"].as_array().unwrap().len());
  assert_eq!(0, db::user_count(&db.pool).unwrap());
}

#[actix_web::test]
async fn login_then_profile() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  insert_test_user(&db.pool, "a@example.com", Role::User);

  let wrong = test::call_service(&app, test::TestRequest::post()
    .uri("/api/auth/login")
    .set_json(json!({ "email": "a@example.com", "password": "wrong password" }))
    .to_request()).await;
  assert_eq!(StatusCode::UNAUTHORIZED, wrong.status());

  let ok = test::call_service(&app, test::TestRequest::post()
    .uri("/api/auth/login")
    .set_json(json!({ "email": "A@Example.com", "password": "correct horse battery" }))
    .to_request()).await;
  assert_eq!(StatusCode::OK, ok.status());
  let body: Value = test::read_body_json(ok).await;
  let token = body["token"].as_str().unwrap().to_string();

  let profile = test::call_service(&app, test::TestRequest::get()
    .uri("/api/auth/profile")
    .insert_header(("Authorization", format!("Bearer {}", token)))
    .to_request()).await;
  assert_eq!(StatusCode::OK, profile.status());
  let body: Value = test::read_body_json(profile).await;
  assert_eq!("Tester", body["display_name"]);
  assert_eq!("user", body["role"]);
}

#[actix_web::test]
async fn admin_routes_check_roles_and_api_key() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  let user_token = token_for(&state, "user@example.com", Role::User);
  let admin_token = token_for(&state, "admin@example.com", Role::Admin);

  let anonymous = test::call_service(&app, test::TestRequest::get()
    .uri("/api/admin/stats").to_request()).await;
  assert_eq!(StatusCode::UNAUTHORIZED, anonymous.status());

  let user = test::call_service(&app, test::TestRequest::get()
    .uri("/api/admin/stats")
    .insert_header(("Authorization", format!("Bearer {}", user_token)))
    .to_request()).await;
  assert_eq!(StatusCode::FORBIDDEN, user.status());

  let admin = test::call_service(&app, test::TestRequest::get()
    .uri("/api/admin/stats")
    .insert_header(("Authorization", format!("Bearer {}", admin_token)))
    .to_request()).await;
  assert_eq!(StatusCode::OK, admin.status());
  let body: Value = test::read_body_json(admin).await;
  assert_eq!(2, body["users"]);

  let key = test::call_service(&app, test::TestRequest::get()
    .uri("/api/admin/stats")
    .insert_header(("x-api-key", API_KEY))
    .to_request()).await;
  assert_eq!(StatusCode::OK, key.status());

  let bad_key = test::call_service(&app, test::TestRequest::get()
    .uri("/api/admin/stats")
    .insert_header(("x-api-key", "guess"))
    .to_request()).await;
  assert_eq!(StatusCode::UNAUTHORIZED, bad_key.status());
}

#[actix_web::test]
async fn same_title_gets_a_suffixed_slug() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  insert_test_user(&db.pool, "admin@example.com", Role::Admin);
  let mut slugs = Vec::new();
  for _ in 0..2 {
    let resp = test::call_service(&app, test::TestRequest::post()
      .uri("/api/admin/articles")
      .insert_header(("x-api-key", API_KEY))
      .set_json(json!({ "title": "Hello World", "content": "<p>Hi</p>" }))
      .to_request()).await;
    assert_eq!(StatusCode::CREATED, resp.status());
    let body: Value = test::read_body_json(resp).await;
    slugs.push(body["slug"].as_str().unwrap().to_string());
  }
  assert_eq!(vec!["hello-world", "hello-world-1"], slugs);
}

#[actix_web::test]
async fn public_listing_only_shows_published_and_counts_views() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  insert_test_user(&db.pool, "admin@example.com", Role::Admin);
  for (title, status) in [("Draft one", "draft"), ("Live one", "published")] {
    let resp = test::call_service(&app, test::TestRequest::post()
      .uri("/functions/article-api")
      .insert_header(("x-api-key", API_KEY))
      .set_json(json!({ "title": title, "content": "<p>Body</p>", "status": status }))
      .to_request()).await;
    assert_eq!(StatusCode::CREATED, resp.status());
  }

  let list = test::call_service(&app, test::TestRequest::get()
    .uri("/api/articles?page=1&per_page=5").to_request()).await;
  let body: Value = test::read_body_json(list).await;
  assert_eq!(1, body["total"]);
  assert_eq!("live-one", body["items"][0]["slug"]);
  assert!(body["items"][0].get("content").is_none());

  let draft = test::call_service(&app, test::TestRequest::get()
    .uri("/api/articles/draft-one").to_request()).await;
  assert_eq!(StatusCode::NOT_FOUND, draft.status());

  let live = test::call_service(&app, test::TestRequest::get()
    .uri("/api/articles/live-one").to_request()).await;
  let body: Value = test::read_body_json(live).await;
  assert_eq!(1, body["view_count"]);
  assert!(body["published_at"].is_string());
}

#[actix_web::test]
async fn referenced_category_cannot_be_deleted() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  insert_test_user(&db.pool, "admin@example.com", Role::Admin);

  let resp = test::call_service(&app, test::TestRequest::post()
    .uri("/functions/categories-api")
    .insert_header(("x-api-key", API_KEY))
    .set_json(json!({ "name": "Tools", "color": "#10B981" }))
    .to_request()).await;
  let category: Value = test::read_body_json(resp).await;
  let id = category["id"].as_i64().unwrap();

  test::call_service(&app, test::TestRequest::post()
    .uri("/functions/article-api")
    .insert_header(("x-api-key", API_KEY))
    .set_json(json!({ "title": "A tool", "content": "<p>x</p>", "category_id": id }))
    .to_request()).await;

  let delete = test::call_service(&app, test::TestRequest::delete()
    .uri(&format!("/functions/categories-api?id={}", id))
    .insert_header(("x-api-key", API_KEY))
    .to_request()).await;
  assert_eq!(StatusCode::BAD_REQUEST, delete.status());
  assert!(db::category_by_id(&db.pool, id).unwrap().is_some());
}

#[actix_web::test]
async fn bad_category_color_is_refused() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  let resp = test::call_service(&app, test::TestRequest::post()
    .uri("/functions/categories-api")
    .insert_header(("x-api-key", API_KEY))
    .set_json(json!({ "name": "Tools", "color": "blue" }))
    .to_request()).await;
  assert_eq!(StatusCode::BAD_REQUEST, resp.status());
  let body: Value = test::read_body_json(resp).await;
  assert_eq!("color", body["details"][0]["field"]);
}

#[actix_web::test]
async fn subscribing_twice_sends_one_email() {
  let db = test_db();
  let mailer = RecordingMailer::default();
  let state = state(&db.pool, &mailer);
  let app = test_app!(state);
  let mut outcomes = Vec::new();
  for _ in 0..2 {
    let resp = test::call_service(&app, test::TestRequest::post()
      .uri("/functions/newsletter-subscribe")
      .set_json(json!({ "email": "fan@example.com" }))
      .to_request()).await;
    assert_eq!(StatusCode::OK, resp.status());
    let body: Value = test::read_body_json(resp).await;
    outcomes.push(body["status"].as_str().unwrap().to_string());
  }
  assert_eq!(vec!["subscribed", "already_subscribed"], outcomes);
  assert_eq!(1, db::subscriber_count(&db.pool, false).unwrap());
  assert_eq!(1, mailer.count());

  let unknown = test::call_service(&app, test::TestRequest::post()
    .uri("/functions/newsletter-unsubscribe")
    .set_json(json!({ "email": "nobody@example.com" }))
    .to_request()).await;
  assert_eq!(StatusCode::NOT_FOUND, unknown.status());
}

#[actix_web::test]
async fn settings_round_trip_as_json_values() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  let resp = test::call_service(&app, test::TestRequest::put()
    .uri("/api/admin/settings")
    .insert_header(("x-api-key", API_KEY))
    .set_json(json!({ "navigation": [{ "label": "首页", "href": "/" }], "site_name": "AI News" }))
    .to_request()).await;
  assert_eq!(StatusCode::OK, resp.status());

  let public = test::call_service(&app, test::TestRequest::get()
    .uri("/api/settings").to_request()).await;
  let body: Value = test::read_body_json(public).await;
  assert_eq!("首页", body["navigation"][0]["label"]);
  assert_eq!("AI News", body["site_name"]);
}

#[actix_web::test]
async fn remote_scraper_trigger_needs_credentials() {
  let db = test_db();
  let state = state(&db.pool, &RecordingMailer::default());
  let app = test_app!(state);
  let resp = test::call_service(&app, test::TestRequest::post()
    .uri("/functions/futuretools-scraper")
    .peer_addr("198.51.100.7:5000".parse().unwrap())
    .to_request()).await;
  assert_eq!(StatusCode::UNAUTHORIZED, resp.status());
}
