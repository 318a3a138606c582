use rusqlite::{params, params_from_iter};
use rusqlite::types::Value;
use color_eyre::Result;
use serde::Serialize;
use super::entities::{Article, ArticleStatus};
use super::mappers::{map_article, ARTICLE_FIELDS, ARTICLE_FROM};
use super::queries::{Order, OrderBy, Query};
use super::{execute, select_many, select_one, Pool};

// Every listing goes through this, public ones force the
// status to "published".
#[derive(Debug, Default, Clone)]
pub struct ArticleFilter {
  pub status: Option<ArticleStatus>,
  pub category_id: Option<i64>,
  pub category_slug: Option<String>,
  pub search: Option<String>
}

#[derive(Debug, Default, Serialize)]
pub struct ArticleStats {
  pub total: i64,
  pub published: i64,
  pub draft: i64,
  pub archived: i64,
  pub total_views: i64
}

// Adds the WHERE clauses for the filter and returns the
// values to bind, in the same order as the placeholders.
fn apply_filter(mut query: Query, filter: &ArticleFilter) -> (Query, Vec<Value>) {
  let mut values: Vec<Value> = Vec::new();
  if let Some(status) = filter.status {
    query = query.where_and("a.status = ?");
    values.push(Value::Text(status.as_str().to_string()));
  }
  if let Some(category_id) = filter.category_id {
    query = query.where_and("a.category_id = ?");
    values.push(Value::Integer(category_id));
  }
  if let Some(slug) = &filter.category_slug {
    query = query.where_and("c.slug = ?");
    values.push(Value::Text(slug.clone()));
  }
  if let Some(search) = &filter.search {
    // instr() instead of LIKE so that "%" and "_" in the search
    // terms don't need escaping.
    query = query.where_and("(instr(lower(a.title), ?) > 0 OR instr(lower(a.content), ?) > 0)");
    let term = search.to_lowercase();
    values.push(Value::Text(term.clone()));
    values.push(Value::Text(term));
  }
  (query, values)
}

pub fn articles_page(
  pool: &Pool,
  filter: &ArticleFilter,
  offset: i64,
  limit: i64
) -> Result<Vec<Article>> {
  // Newest first. Drafts have no published_at so they sort by
  // creation date. The id is the tie-breaker (the Order applies
  // to the last field).
  let query = Query::select(&ARTICLE_FIELDS, ARTICLE_FROM)
    .order(OrderBy::new(Order::Desc, "COALESCE(a.published_at, a.created_at) DESC, a.id"))
    .limit(limit)
    .offset(offset);
  let (query, values) = apply_filter(query, filter);
  select_many(pool, &query.to_string(), params_from_iter(values), map_article)
}

pub fn article_count(pool: &Pool, filter: &ArticleFilter) -> Result<i64> {
  let (query, values) = apply_filter(Query::count(ARTICLE_FROM), filter);
  let count: Option<i64> =
    select_one(pool, &query.to_string(), params_from_iter(values), |row| row.get(0))?;
  Ok(count.unwrap_or(0))
}

pub fn article_by_id(pool: &Pool, id: i64) -> Result<Option<Article>> {
  let query = Query::select(&ARTICLE_FIELDS, ARTICLE_FROM).where_and("a.id = ?");
  select_one(pool, &query.to_string(), params![id], map_article)
}

pub fn article_by_slug(pool: &Pool, slug: &str) -> Result<Option<Article>> {
  let query = Query::select(&ARTICLE_FIELDS, ARTICLE_FROM).where_and("a.slug = ?");
  select_one(pool, &query.to_string(), params![slug], map_article)
}

// Sets the id on the given article. The slug has a UNIQUE
// constraint, callers check for that specific violation.
pub fn insert_article(pool: &Pool, article: &mut Article) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO articles (title, slug, content, excerpt, cover_image, \
    seo_title, seo_description, seo_keywords, status, category_id, author_id, \
    view_count, published_at, created_at, updated_at) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    params![
      article.title,
      article.slug,
      article.content,
      article.excerpt,
      article.cover_image,
      article.seo_title,
      article.seo_description,
      article.seo_keywords,
      article.status,
      article.category_id,
      article.author_id,
      article.view_count,
      article.published_at,
      article.created_at,
      article.updated_at
    ]
  )?;
  article.id = conn.last_insert_rowid();
  Ok(())
}

// Writes everything but the author, view count and creation
// date, which never change after insertion.
pub fn update_article(pool: &Pool, article: &Article) -> Result<bool> {
  let changed = execute(
    pool,
    "UPDATE articles SET title = ?, slug = ?, content = ?, excerpt = ?, \
    cover_image = ?, seo_title = ?, seo_description = ?, seo_keywords = ?, \
    status = ?, category_id = ?, published_at = ?, updated_at = ? WHERE id = ?",
    params![
      article.title,
      article.slug,
      article.content,
      article.excerpt,
      article.cover_image,
      article.seo_title,
      article.seo_description,
      article.seo_keywords,
      article.status,
      article.category_id,
      article.published_at,
      article.updated_at,
      article.id
    ]
  )?;
  Ok(changed > 0)
}

pub fn delete_article(pool: &Pool, id: i64) -> Result<bool> {
  let changed = execute(pool, "DELETE FROM articles WHERE id = ?", params![id])?;
  Ok(changed > 0)
}

// When editing, the article's own slug doesn't count as taken.
pub fn slug_taken(pool: &Pool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
  let found: Option<i64> = select_one(
    pool,
    "SELECT id FROM articles WHERE slug = ? AND id IS NOT ? LIMIT 1",
    params![slug, exclude_id],
    |row| row.get(0)
  )?;
  Ok(found.is_some())
}

// Duplicate check for the scraper. "IS" also matches two NULLs
// so articles without a category compare equal too.
pub fn article_exists_with_title(
  pool: &Pool,
  title: &str,
  category_id: Option<i64>
) -> Result<bool> {
  let found: Option<i64> = select_one(
    pool,
    "SELECT id FROM articles WHERE title = ? AND category_id IS ? LIMIT 1",
    params![title, category_id],
    |row| row.get(0)
  )?;
  Ok(found.is_some())
}

pub fn increment_views(pool: &Pool, id: i64) -> Result<()> {
  execute(
    pool,
    "UPDATE articles SET view_count = view_count + 1 WHERE id = ?",
    params![id]
  )?;
  Ok(())
}

pub fn article_count_for_category(pool: &Pool, category_id: i64) -> Result<i64> {
  let count: Option<i64> = select_one(
    pool,
    "SELECT count(*) FROM articles WHERE category_id = ?",
    params![category_id],
    |row| row.get(0)
  )?;
  Ok(count.unwrap_or(0))
}

pub fn article_stats(pool: &Pool) -> Result<ArticleStats> {
  let stats = select_one(
    pool,
    "SELECT count(*), \
    COALESCE(SUM(status = 'published'), 0), \
    COALESCE(SUM(status = 'draft'), 0), \
    COALESCE(SUM(status = 'archived'), 0), \
    COALESCE(SUM(view_count), 0) FROM articles",
    [],
    |row| Ok(ArticleStats {
      total: row.get(0)?,
      published: row.get(1)?,
      draft: row.get(2)?,
      archived: row.get(3)?,
      total_views: row.get(4)?
    })
  )?;
  Ok(stats.unwrap_or_default())
}
