use rusqlite::params;
use color_eyre::Result;
use eyre::WrapErr;
use super::entities::{Page, Setting};
use super::mappers::{map_page, map_setting};
use super::{execute, select_many, select_one, Pool};

// Static pages ("about", "privacy"...) and the site settings
// key/value table, both edited from the admin area.

pub fn page_by_slug(pool: &Pool, slug: &str) -> Result<Option<Page>> {
  select_one(
    pool,
    "SELECT slug, title, content, seo_description, updated_at, updated_by \
    FROM pages WHERE slug = ?",
    params![slug],
    map_page
  )
}

pub fn all_pages(pool: &Pool) -> Result<Vec<Page>> {
  select_many(
    pool,
    "SELECT slug, title, content, seo_description, updated_at, updated_by \
    FROM pages ORDER BY slug ASC",
    [],
    map_page
  )
}

pub fn upsert_page(pool: &Pool, page: &Page) -> Result<()> {
  execute(
    pool,
    "INSERT INTO pages (slug, title, content, seo_description, updated_at, updated_by) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
    ON CONFLICT(slug) DO UPDATE SET title = ?2, content = ?3, \
    seo_description = ?4, updated_at = ?5, updated_by = ?6",
    params![
      page.slug,
      page.title,
      page.content,
      page.seo_description,
      page.updated_at,
      page.updated_by
    ]
  )?;
  Ok(())
}

pub fn all_settings(pool: &Pool) -> Result<Vec<Setting>> {
  select_many(
    pool,
    "SELECT key, value, updated_at FROM site_settings ORDER BY key ASC",
    [],
    map_setting
  )
}

// Values have to be valid JSON text, the handler serializes
// them. All or nothing, one transaction for the whole batch.
pub fn upsert_settings<'a, I>(pool: &Pool, settings: I, now: i64) -> Result<()>
  where I: IntoIterator<Item = (&'a str, String)>
{
  let mut conn = pool.get()?;
  let tx = conn.transaction()?;
  {
    let mut stmt = tx.prepare(
      "INSERT INTO site_settings (key, value, updated_at) VALUES (?1, ?2, ?3) \
      ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3"
    )?;
    for (key, value) in settings {
      stmt.execute(params![key, value, now])
        .with_context(|| format!("Saving setting {}", key))?;
    }
  }
  tx.commit().context("Committing site settings")
}
