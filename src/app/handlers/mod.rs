use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;
use super::error::Error;
use super::AppState;
pub mod auth;
pub mod articles;
pub mod categories;
pub mod media;
pub mod site;
pub mod functions;

// Module with the API handler functions, one file per
// group of routes.

pub async fn index(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "name": app_state.site_info.title,
    "status": "ok"
  }))
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("接口不存在")))
}

// Every request body goes through this before anything else
// happens with it.
fn validated<T: Validate>(body: web::Json<T>) -> Result<T, Error> {
  let body = body.into_inner();
  body.validate()?;
  Ok(body)
}

fn check_rate_limit(app_state: &AppState) -> Result<(), Error> {
  if app_state.check_rate_limit() {
    Err(Error::TooManyRequests)
  } else {
    Ok(())
  }
}
