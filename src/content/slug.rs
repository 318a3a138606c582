use lazy_static::lazy_static;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use color_eyre::Result;
use crate::db::{self, Pool};
use crate::utils::time_utils::current_timestamp;

// Long titles make terrible URLs.
const MAX_SLUG_LENGTH: usize = 80;

lazy_static! {
  // Only ASCII word characters survive, same as a "\w" in the
  // browser. Chinese titles end up empty and get the
  // synthetic fallback.
  static ref NON_WORD_REGEX: Regex = Regex::new(r"[^a-z0-9_\s-]").unwrap();
  static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
  static ref HYPHENS_REGEX: Regex = Regex::new(r"-{2,}").unwrap();
}

pub fn slugify(title: &str) -> String {
  let lower = title.to_lowercase();
  let stripped = NON_WORD_REGEX.replace_all(&lower, "");
  let hyphenated = WHITESPACE_REGEX.replace_all(stripped.trim(), "-");
  let mut slug = HYPHENS_REGEX.replace_all(&hyphenated, "-")
    .trim_matches('-')
    .to_string();
  // Everything left is ASCII so cutting bytes is safe.
  if slug.len() > MAX_SLUG_LENGTH {
    slug.truncate(MAX_SLUG_LENGTH);
    slug = slug.trim_end_matches('-').to_string();
  }
  slug
}

// "<prefix>-<time in base 36>-<6 random chars>"
pub fn synthetic_slug(prefix: &str) -> String {
  let random: String = rand::thread_rng()
    .sample_iter(&Alphanumeric)
    .take(6)
    .map(char::from)
    .collect();
  format!(
    "{}-{}-{}",
    prefix,
    to_base36(current_timestamp().max(0) as u64),
    random.to_lowercase()
  )
}

pub fn base_slug(title: &str) -> String {
  let slug = slugify(title);
  if slug.is_empty() {
    synthetic_slug("article")
  } else {
    slug
  }
}

// Probes base, base-1, base-2... until nothing else uses it.
// Two requests can still pick the same candidate at the same
// time, the UNIQUE constraint catches that and the article
// workflow retries (see content::articles).
pub fn unique_slug(pool: &Pool, base: &str, exclude_id: Option<i64>) -> Result<String> {
  let mut candidate = base.to_string();
  let mut counter = 1;
  while db::slug_taken(pool, &candidate, exclude_id)? {
    candidate = format!("{}-{}", base, counter);
    counter += 1;
  }
  Ok(candidate)
}

fn to_base36(mut value: u64) -> String {
  const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
  if value == 0 {
    return "0".to_string();
  }
  let mut out = Vec::new();
  while value > 0 {
    out.push(DIGITS[(value % 36) as usize]);
    value /= 36;
  }
  out.reverse();
  String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::entities::Role;
  use crate::db::testing::{bare_article, insert_test_user, test_db};

  #[test]
  fn hello_world_normalizes() {
    assert_eq!("hello-world", slugify("Hello World!!"));
  }

  #[test]
  fn whitespace_and_hyphen_runs_collapse() {
    assert_eq!("gpt-5-is-here", slugify("  GPT -- 5   is\there  "));
    assert_eq!("snake_case_kept", slugify("snake_case_kept"));
  }

  #[test]
  fn non_ascii_title_falls_back_to_synthetic_slug() {
    assert_eq!("", slugify("人工智能新闻"));
    let slug = base_slug("人工智能新闻");
    assert!(slug.starts_with("article-"));
    assert_eq!(3, slug.split('-').count());
  }

  #[test]
  fn long_titles_are_cut() {
    let slug = slugify(&"word ".repeat(40));
    assert!(slug.len() <= MAX_SLUG_LENGTH);
    assert!(!slug.ends_with('-'));
  }

  #[test]
  fn base36_encoding() {
    assert_eq!("0", to_base36(0));
    assert_eq!("z", to_base36(35));
    assert_eq!("10", to_base36(36));
  }

  #[test]
  fn collision_gets_numeric_suffix() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    assert_eq!("hello-world", unique_slug(&db.pool, "hello-world", None).unwrap());
    let mut first = bare_article("Hello World", "hello-world", user.id);
    db::insert_article(&db.pool, &mut first).unwrap();
    assert_eq!("hello-world-1", unique_slug(&db.pool, "hello-world", None).unwrap());
    let mut second = bare_article("Hello World", "hello-world-1", user.id);
    db::insert_article(&db.pool, &mut second).unwrap();
    assert_eq!("hello-world-2", unique_slug(&db.pool, "hello-world", None).unwrap());
    // The article being edited keeps its own slug:
    assert_eq!("hello-world", unique_slug(&db.pool, "hello-world", Some(first.id)).unwrap());
  }
}
