use eyre::Report;
use rusqlite::ErrorCode;

// The database errors travel as eyre reports. This digs the
// rusqlite error back out (downcast goes through contexts)
// to tell UNIQUE conflicts apart from everything else.
// The column is matched against SQLite's message, which looks
// like "UNIQUE constraint failed: articles.slug".
pub fn is_unique_violation(report: &Report, column: &str) -> bool {
  match report.downcast_ref::<rusqlite::Error>() {
    Some(rusqlite::Error::SqliteFailure(e, message)) => {
      e.code == ErrorCode::ConstraintViolation &&
        message.as_ref()
          .map(|m| m.contains("UNIQUE") && m.contains(column))
          .unwrap_or(false)
    },
    _ => false
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::testing::test_db;

  #[test]
  fn detects_unique_violation_on_named_column() {
    let db = test_db();
    let conn = db.pool.get().unwrap();
    conn.execute(
      "INSERT INTO categories (name, slug, created_at) VALUES ('A', 'a', 0)", []
    ).unwrap();
    let err = conn.execute(
      "INSERT INTO categories (name, slug, created_at) VALUES ('B', 'a', 0)", []
    ).unwrap_err();
    let report = Report::new(err);
    assert!(is_unique_violation(&report, "categories.slug"));
    assert!(!is_unique_violation(&report, "articles.slug"));
  }

  #[test]
  fn other_errors_are_not_unique_violations() {
    let report = eyre::eyre!("something else");
    assert!(!is_unique_violation(&report, "articles.slug"));
  }
}
