use rusqlite::params;
use color_eyre::Result;
use super::entities::{Role, User};
use super::mappers::{map_user, USER_FIELDS};
use super::{execute, select_one, Pool};
use crate::utils::time_utils::current_timestamp;

pub fn user_by_id(pool: &Pool, id: i64) -> Result<Option<User>> {
  select_one(
    pool,
    &format!("SELECT {} FROM users WHERE id = ?", USER_FIELDS),
    params![id],
    map_user
  )
}

// Emails are stored lower-cased, callers normalize before
// calling this.
pub fn user_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
  select_one(
    pool,
    &format!("SELECT {} FROM users WHERE email = ?", USER_FIELDS),
    params![email],
    map_user
  )
}

// Sets the id on the given user.
pub fn insert_user(pool: &Pool, user: &mut User) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO users (email, password_hash, display_name, avatar_url, \
    bio, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    params![
      user.email,
      user.password_hash,
      user.display_name,
      user.avatar_url,
      user.bio,
      user.role,
      user.created_at,
      user.updated_at
    ]
  )?;
  user.id = conn.last_insert_rowid();
  Ok(())
}

pub fn update_profile(
  pool: &Pool,
  id: i64,
  display_name: &str,
  avatar_url: Option<&str>,
  bio: Option<&str>
) -> Result<bool> {
  let changed = execute(
    pool,
    "UPDATE users SET display_name = ?, avatar_url = ?, bio = ?, updated_at = ? \
    WHERE id = ?",
    params![display_name, avatar_url, bio, current_timestamp(), id]
  )?;
  Ok(changed > 0)
}

pub fn update_password_hash(pool: &Pool, id: i64, hash: &str) -> Result<bool> {
  let changed = execute(
    pool,
    "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
    params![hash, current_timestamp(), id]
  )?;
  Ok(changed > 0)
}

pub fn set_user_role(pool: &Pool, email: &str, role: Role) -> Result<bool> {
  let changed = execute(
    pool,
    "UPDATE users SET role = ?, updated_at = ? WHERE email = ?",
    params![role, current_timestamp(), email]
  )?;
  Ok(changed > 0)
}

// The scraper publishes under this account.
pub fn first_admin_id(pool: &Pool) -> Result<Option<i64>> {
  select_one(
    pool,
    "SELECT id FROM users WHERE role = 'admin' ORDER BY id ASC LIMIT 1",
    [],
    |row| row.get(0)
  )
}

pub fn user_count(pool: &Pool) -> Result<i64> {
  let conn = pool.get()?;
  let count: i64 = conn.query_row("SELECT count(*) FROM users", [], |row| row.get(0))?;
  Ok(count)
}
