use actix_web::{
  error::ResponseError,
  http::StatusCode,
  HttpResponse
};
use derive_more::Display;
use eyre::Report;
use log::error;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use validator::ValidationErrors;
use crate::content::ContentError;
use crate::scraper::ScrapeError;

// Internal messages only go out when the server isn't running
// in production. Flipped once at startup.
static SHOW_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

pub fn show_internal_errors(show: bool) {
  SHOW_INTERNAL_ERRORS.store(show, Ordering::Relaxed);
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
  pub field: String,
  pub message: String
}

// The Display output is what ends up in the "error" key of
// the response body, the two 500 variants keep their real
// message for the logs.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String),
  #[display(fmt = "{}", _0)]
  BadRequest(String),
  #[display(fmt = "请求参数验证失败")]
  Validation(Vec<FieldError>),
  #[display(fmt = "{}", _0)]
  Unauthorized(String),
  #[display(fmt = "{}", _0)]
  Forbidden(String),
  #[display(fmt = "{}", _0)]
  NotFound(String),
  #[display(fmt = "{}", _0)]
  Conflict(String),
  #[display(fmt = "请求过于频繁，请稍后再试")]
  TooManyRequests
}

#[derive(Serialize)]
struct ErrorBody<'a> {
  error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  details: Option<&'a Vec<FieldError>>
}

impl Error {
  fn public_message(&self) -> String {
    match self {
      Error::InternalServerError(message) | Error::DatabaseError(message)
        if SHOW_INTERNAL_ERRORS.load(Ordering::Relaxed) =>
        format!("{}: {}", self, message),
      _ => self.to_string()
    }
  }
}

impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) =>
        StatusCode::INTERNAL_SERVER_ERROR,
      Error::BadRequest(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
      Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::TooManyRequests => StatusCode::TOO_MANY_REQUESTS
    }
  }

  fn error_response(&self) -> HttpResponse {
    let details = match self {
      Error::Validation(fields) => Some(fields),
      _ => None
    };
    HttpResponse::build(self.status_code()).json(ErrorBody {
      error: self.public_message(),
      details
    })
  }
}

// The full report only goes to the logs.
pub fn map_db_error(report: Report) -> Error {
  error!("Database error: {:?}", report);
  Error::DatabaseError(report.to_string())
}

pub fn map_internal_error(report: Report) -> Error {
  error!("Internal error: {:?}", report);
  Error::InternalServerError(report.to_string())
}

impl From<ContentError> for Error {
  fn from(error: ContentError) -> Self {
    match error {
      ContentError::NotFound(message) => Error::NotFound(message),
      ContentError::Invalid(message) => Error::BadRequest(message),
      ContentError::Conflict(message) => Error::Conflict(message),
      ContentError::Database(report) => map_db_error(report)
    }
  }
}

impl From<ScrapeError> for Error {
  fn from(error: ScrapeError) -> Self {
    match error {
      ScrapeError::AlreadyRunning => Error::Conflict(String::from("采集任务正在运行中")),
      ScrapeError::NoAuthor => Error::BadRequest(String::from("没有管理员账号，无法发布文章")),
      ScrapeError::NotConfigured => Error::InternalServerError(error.to_string()),
      ScrapeError::Fetch(message) => {
        error!("Scraper fetch failed: {}", message);
        Error::InternalServerError(message)
      },
      ScrapeError::Database(report) => map_db_error(report)
    }
  }
}

// One entry per failed rule, sorted by field so the output is
// stable.
impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self {
    let mut fields: Vec<FieldError> = errors.field_errors()
      .into_iter()
      .flat_map(|(field, errs)| {
        errs.iter().map(move |e| FieldError {
          field: field.to_string(),
          message: e.message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or(format!("{} 无效", field))
        })
      })
      .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    Error::Validation(fields)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;
  use validator::Validate;

  #[derive(Validate)]
  struct Sample {
    #[validate(length(min = 1, message = "标题不能为空"))]
    title: String,
    #[validate(email)]
    email: String
  }

  async fn body_json(error: Error) -> serde_json::Value {
    let body = to_bytes(error.error_response().into_body()).await.unwrap();
    serde_json::from_slice(&body).unwrap()
  }

  #[actix_web::test]
  async fn validation_errors_list_every_field() {
    let sample = Sample { title: String::new(), email: "nope".to_string() };
    let error = Error::from(sample.validate().unwrap_err());
    assert_eq!(StatusCode::BAD_REQUEST, error.status_code());
    let json = body_json(error).await;
    assert_eq!("email", json["details"][0]["field"]);
    assert_eq!("title", json["details"][1]["field"]);
    assert_eq!("标题不能为空", json["details"][1]["message"]);
  }

  #[actix_web::test]
  async fn internal_messages_are_hidden_by_default() {
    let json = body_json(Error::DatabaseError("no such table: secrets".to_string())).await;
    assert_eq!("Database Error", json["error"]);
    assert!(json.get("details").is_none());
  }

  #[test]
  fn content_errors_map_to_statuses() {
    let invalid: Error = ContentError::Invalid("x".to_string()).into();
    let missing: Error = ContentError::NotFound("x".to_string()).into();
    let conflict: Error = ContentError::Conflict("x".to_string()).into();
    assert_eq!(StatusCode::BAD_REQUEST, invalid.status_code());
    assert_eq!(StatusCode::NOT_FOUND, missing.status_code());
    assert_eq!(StatusCode::CONFLICT, conflict.status_code());
  }
}
