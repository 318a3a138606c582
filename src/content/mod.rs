// Business rules that sit between the HTTP handlers and the
// database: slugs, the publish workflow, category rules and
// the keyword-based auto-categorization.

use derive_more::Display;
use eyre::Report;
pub mod slug;
pub mod categorize;
pub mod articles;
pub mod categories;

// Messages in here end up in API responses, so they're in
// the site's language.
#[derive(Debug, Display)]
pub enum ContentError {
  #[display(fmt = "{}", _0)]
  NotFound(String),
  #[display(fmt = "{}", _0)]
  Invalid(String),
  #[display(fmt = "{}", _0)]
  Conflict(String),
  #[display(fmt = "Database error: {}", _0)]
  Database(Report)
}

impl std::error::Error for ContentError {}

impl From<Report> for ContentError {
  fn from(report: Report) -> Self {
    ContentError::Database(report)
  }
}

pub type ContentResult<T> = Result<T, ContentError>;
