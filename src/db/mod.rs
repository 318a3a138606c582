use rusqlite::{Params, Row, OptionalExtension};
use r2d2_sqlite::SqliteConnectionManager;
use eyre::WrapErr;
use color_eyre::Result;
use std::time::Duration;
pub mod entities;
pub mod queries;
mod mappers;
mod helpers;
mod schema;
mod users;
mod articles;
mod categories;
mod media;
mod site;
mod subscribers;
pub use helpers::is_unique_violation;
pub use users::*;
pub use articles::*;
pub use categories::*;
pub use media::*;
pub use site::*;
pub use subscribers::*;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<SqliteConnectionManager>;

/**
 * All the DB stuff is done in a non-async way, the handlers
 * call these directly. SQLite is quick enough for this site.
 */

pub fn open_pool(path: &str) -> Result<Pool> {
  // Foreign keys are off by default in SQLite and it's a
  // per-connection setting, so it has to go in the init hook.
  let manager = SqliteConnectionManager::file(path)
    .with_init(|c| {
      c.busy_timeout(Duration::from_secs(5))?;
      c.execute_batch("PRAGMA foreign_keys = ON;")
    });
  Pool::new(manager)
    .context("Creating database connection pool")
}

pub fn migrate(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(schema::SCHEMA)
    .context("Applying database schema")
}

// Stole most of the signature from the rusqlite doc.
fn select_many<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: Params,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  let mut stmt = conn.prepare(query)?;
  let rows = stmt.query_map(params, mapper)
    .and_then(Iterator::collect)
    .context("Generic select_many query");
  rows
}

fn select_one<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Option<T>>
  where
    P: Params,
    F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  conn.query_row(query, params, mapper)
    .optional()
    .context("Generic select_one query")
}

// Returns the amount of rows touched.
fn execute<P: Params>(
  pool: &Pool,
  query: &str,
  params: P
) -> Result<usize> {
  let conn = pool.get()?;
  let changed = conn.execute(query, params)?;
  Ok(changed)
}

#[cfg(test)]
pub mod testing {
  use super::*;
  use super::entities::{Article, ArticleStatus, Role, User};
  use crate::utils::time_utils::current_timestamp;
  use tempfile::TempDir;

  // The directory has to live as long as the pool or the
  // database file gets deleted under our feet.
  pub struct TestDb {
    pub pool: Pool,
    pub path: String,
    _dir: TempDir
  }

  pub fn test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.sqlite").to_string_lossy().to_string();
    let pool = open_pool(&path).unwrap();
    migrate(&pool).unwrap();
    TestDb { pool, path, _dir: dir }
  }

  pub fn insert_test_user(pool: &Pool, email: &str, role: Role) -> User {
    let now = current_timestamp();
    let mut user = User {
      id: -1,
      email: email.to_string(),
      password_hash: crate::auth::hash_password("correct horse battery").unwrap(),
      display_name: "Tester".to_string(),
      avatar_url: None,
      bio: None,
      role,
      created_at: now,
      updated_at: now
    };
    insert_user(pool, &mut user).unwrap();
    user
  }

  // Draft with no category, not inserted yet.
  pub fn bare_article(title: &str, slug: &str, author_id: i64) -> Article {
    Article {
      id: -1,
      title: title.to_string(),
      slug: slug.to_string(),
      content: "<p>content</p>".to_string(),
      excerpt: None,
      cover_image: None,
      seo_title: None,
      seo_description: None,
      seo_keywords: None,
      status: ArticleStatus::Draft,
      category_id: None,
      author_id,
      view_count: 0,
      published_at: None,
      created_at: 100,
      updated_at: 100,
      category_name: None,
      category_slug: None,
      category_color: None,
      author_name: None
    }
  }
}
