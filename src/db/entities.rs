use serde::{Deserialize, Serialize};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;
use std::str::FromStr;

// Plain datatypes matching the tables. The API layer has its
// own DTOs (see app::dtos) and converts these with From.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
  Draft,
  Published,
  Archived
}

#[derive(Debug, Clone)]
pub struct User {
  pub id: i64,
  pub email: String,
  pub password_hash: String,
  pub display_name: String,
  pub avatar_url: Option<String>,
  pub bio: Option<String>,
  pub role: Role,
  pub created_at: i64,
  pub updated_at: i64
}

#[derive(Debug, Clone)]
pub struct Article {
  pub id: i64,
  pub title: String,
  pub slug: String,
  pub content: String,
  pub excerpt: Option<String>,
  pub cover_image: Option<String>,
  pub seo_title: Option<String>,
  pub seo_description: Option<String>,
  pub seo_keywords: Option<String>,
  pub status: ArticleStatus,
  pub category_id: Option<i64>,
  pub author_id: i64,
  pub view_count: i64,
  pub published_at: Option<i64>,
  pub created_at: i64,
  pub updated_at: i64,
  // Joined from other tables, ignored when writing:
  pub category_name: Option<String>,
  pub category_slug: Option<String>,
  pub category_color: Option<String>,
  pub author_name: Option<String>
}

#[derive(Debug, Clone)]
pub struct Category {
  pub id: i64,
  pub name: String,
  pub slug: String,
  pub color: String,
  pub description: Option<String>,
  pub created_at: i64,
  // Only filled by the listing query:
  pub article_count: i64
}

#[derive(Debug, Clone)]
pub struct MediaAsset {
  pub id: i64,
  pub file_name: String,
  pub file_path: String,
  pub url: String,
  pub file_size: i64,
  pub mime_type: String,
  pub width: Option<i64>,
  pub height: Option<i64>,
  pub duration: Option<f64>,
  pub alt_text: Option<String>,
  pub uploaded_by: i64,
  pub created_at: i64
}

#[derive(Debug, Clone)]
pub struct Page {
  pub slug: String,
  pub title: String,
  pub content: String,
  pub seo_description: Option<String>,
  pub updated_at: i64,
  pub updated_by: Option<i64>
}

#[derive(Debug, Clone)]
pub struct Setting {
  pub key: String,
  // Raw JSON text.
  pub value: String,
  pub updated_at: i64
}

#[derive(Debug, Clone)]
pub struct Subscriber {
  pub id: i64,
  pub email: String,
  pub is_active: bool,
  pub subscribed_at: i64,
  pub unsubscribed_at: Option<i64>
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Admin => "admin"
    }
  }
}

impl ArticleStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ArticleStatus::Draft => "draft",
      ArticleStatus::Published => "published",
      ArticleStatus::Archived => "archived"
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl fmt::Display for ArticleStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Role::User),
      "admin" => Ok(Role::Admin),
      other => Err(format!("Unknown role: {}", other))
    }
  }
}

impl FromStr for ArticleStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "draft" => Ok(ArticleStatus::Draft),
      "published" => Ok(ArticleStatus::Published),
      "archived" => Ok(ArticleStatus::Archived),
      other => Err(format!("Unknown article status: {}", other))
    }
  }
}

// Both enums live as TEXT columns with a CHECK constraint.
impl ToSql for Role {
  fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
    Ok(ToSqlOutput::from(self.as_str()))
  }
}

impl FromSql for Role {
  fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
    value.as_str()?
      .parse()
      .map_err(|e: String| FromSqlError::Other(e.into()))
  }
}

impl ToSql for ArticleStatus {
  fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
    Ok(ToSqlOutput::from(self.as_str()))
  }
}

impl FromSql for ArticleStatus {
  fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
    value.as_str()?
      .parse()
      .map_err(|e: String| FromSqlError::Other(e.into()))
  }
}
