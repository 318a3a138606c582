use rusqlite::params;
use color_eyre::Result;
use super::entities::Subscriber;
use super::mappers::map_subscriber;
use super::{execute, select_one, Pool};

pub fn subscriber_by_email(pool: &Pool, email: &str) -> Result<Option<Subscriber>> {
  select_one(
    pool,
    "SELECT id, email, is_active, subscribed_at, unsubscribed_at \
    FROM newsletter_subscribers WHERE email = ?",
    params![email],
    map_subscriber
  )
}

pub fn insert_subscriber(pool: &Pool, subscriber: &mut Subscriber) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO newsletter_subscribers (email, is_active, subscribed_at, unsubscribed_at) \
    VALUES (?, ?, ?, ?)",
    params![
      subscriber.email,
      subscriber.is_active,
      subscriber.subscribed_at,
      subscriber.unsubscribed_at
    ]
  )?;
  subscriber.id = conn.last_insert_rowid();
  Ok(())
}

// Reactivating resets the subscription date, deactivating
// stamps unsubscribed_at.
pub fn set_subscriber_active(pool: &Pool, id: i64, active: bool, now: i64) -> Result<bool> {
  let changed = if active {
    execute(
      pool,
      "UPDATE newsletter_subscribers SET is_active = 1, subscribed_at = ?, \
      unsubscribed_at = NULL WHERE id = ?",
      params![now, id]
    )?
  } else {
    execute(
      pool,
      "UPDATE newsletter_subscribers SET is_active = 0, unsubscribed_at = ? WHERE id = ?",
      params![now, id]
    )?
  };
  Ok(changed > 0)
}

pub fn subscriber_count(pool: &Pool, active_only: bool) -> Result<i64> {
  let count: Option<i64> = select_one(
    pool,
    "SELECT count(*) FROM newsletter_subscribers WHERE (?1 = 0 OR is_active = 1)",
    params![active_only],
    |row| row.get(0)
  )?;
  Ok(count.unwrap_or(0))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::testing::test_db;

  #[test]
  fn deactivate_then_reactivate() {
    let db = test_db();
    let mut sub = Subscriber {
      id: -1,
      email: "a@example.com".to_string(),
      is_active: true,
      subscribed_at: 1,
      unsubscribed_at: None
    };
    insert_subscriber(&db.pool, &mut sub).unwrap();
    set_subscriber_active(&db.pool, sub.id, false, 5).unwrap();
    let found = subscriber_by_email(&db.pool, "a@example.com").unwrap().unwrap();
    assert!(!found.is_active);
    assert_eq!(Some(5), found.unsubscribed_at);
    assert_eq!(0, subscriber_count(&db.pool, true).unwrap());
    assert_eq!(1, subscriber_count(&db.pool, false).unwrap());

    set_subscriber_active(&db.pool, sub.id, true, 9).unwrap();
    let found = subscriber_by_email(&db.pool, "a@example.com").unwrap().unwrap();
    assert!(found.is_active);
    assert_eq!(None, found.unsubscribed_at);
    assert_eq!(9, found.subscribed_at);
  }
}
