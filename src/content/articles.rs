use log::{info, warn};
use crate::db::{self, Pool};
use crate::db::entities::{Article, ArticleStatus};
use crate::utils::serde_utils::empty_string_to_none;
use crate::utils::text_utils::excerpt_from_html;
use crate::utils::time_utils::current_timestamp;
use super::{categorize, slug, ContentError, ContentResult};

// The UNIQUE constraint on articles.slug has the last word,
// when two writers race for the same slug the loser probes
// again. A handful of attempts is plenty.
const MAX_SLUG_ATTEMPTS: usize = 5;
const EXCERPT_LENGTH: usize = 160;

// What the editor (or the workflow API) sends when creating.
#[derive(Debug, Default, Clone)]
pub struct NewArticle {
  pub title: String,
  // Explicit slug, normalized anyway. Derived from the title
  // when absent.
  pub slug: Option<String>,
  pub content: String,
  pub excerpt: Option<String>,
  pub cover_image: Option<String>,
  pub seo_title: Option<String>,
  pub seo_description: Option<String>,
  pub seo_keywords: Option<String>,
  pub status: Option<ArticleStatus>,
  pub category_id: Option<i64>,
  // Run the keyword scorer when no category was given.
  pub auto_categorize: bool
}

// Partial update: None leaves the field alone, Some(None)
// clears nullable fields.
#[derive(Debug, Default, Clone)]
pub struct ArticleChanges {
  pub title: Option<String>,
  pub slug: Option<String>,
  pub content: Option<String>,
  pub excerpt: Option<Option<String>>,
  pub cover_image: Option<Option<String>>,
  pub seo_title: Option<Option<String>>,
  pub seo_description: Option<Option<String>>,
  pub seo_keywords: Option<Option<String>>,
  pub status: Option<ArticleStatus>,
  pub category_id: Option<Option<i64>>
}

// Publishing stamps published_at the first time only, later
// saves (even archiving and publishing again) keep it.
pub fn stamp_published_at(article: &mut Article, now: i64) {
  if article.status == ArticleStatus::Published && article.published_at.is_none() {
    article.published_at = Some(now);
  }
}

fn check_category(pool: &Pool, category_id: Option<i64>) -> ContentResult<()> {
  if let Some(id) = category_id {
    if db::category_by_id(pool, id)?.is_none() {
      return Err(ContentError::Invalid(format!("分类不存在（ID {}）", id)));
    }
  }
  Ok(())
}

fn default_excerpt(excerpt: Option<String>, content: &str) -> Option<String> {
  empty_string_to_none(excerpt).or_else(|| {
    let generated = excerpt_from_html(content, EXCERPT_LENGTH);
    if generated.is_empty() { None } else { Some(generated) }
  })
}

// Probe for a free slug and write, again if somebody else
// grabbed the same slug in between.
fn write_with_unique_slug<F>(
  pool: &Pool,
  article: &mut Article,
  base: &str,
  exclude_id: Option<i64>,
  mut write: F
) -> ContentResult<()>
where
  F: FnMut(&Pool, &mut Article) -> color_eyre::Result<()>
{
  for attempt in 1..=MAX_SLUG_ATTEMPTS {
    article.slug = slug::unique_slug(pool, base, exclude_id)?;
    match write(pool, article) {
      Ok(()) => return Ok(()),
      Err(e) if db::is_unique_violation(&e, "articles.slug") => {
        warn!(
          "Slug {} was taken concurrently (attempt {}/{})",
          article.slug, attempt, MAX_SLUG_ATTEMPTS
        );
      },
      Err(e) => return Err(e.into())
    }
  }
  Err(ContentError::Conflict(
    String::from("无法生成唯一的文章链接，请稍后重试")
  ))
}

pub fn create_article(
  pool: &Pool,
  author_id: i64,
  input: NewArticle
) -> ContentResult<Article> {
  let mut category_id = input.category_id;
  check_category(pool, category_id)?;
  if category_id.is_none() && input.auto_categorize {
    let categories = db::all_categories(pool)?;
    let text = format!("{} {}", input.title, input.content);
    category_id = categorize::categorize(&text, &categories);
  }

  let base = match input.slug.as_deref().map(slug::slugify) {
    Some(explicit) if !explicit.is_empty() => explicit,
    _ => slug::base_slug(&input.title)
  };
  let now = current_timestamp();
  let mut article = Article {
    id: -1,
    title: input.title.trim().to_string(),
    slug: String::new(),
    excerpt: default_excerpt(input.excerpt, &input.content),
    content: input.content,
    cover_image: empty_string_to_none(input.cover_image),
    seo_title: empty_string_to_none(input.seo_title),
    seo_description: empty_string_to_none(input.seo_description),
    seo_keywords: empty_string_to_none(input.seo_keywords),
    status: input.status.unwrap_or(ArticleStatus::Draft),
    category_id,
    author_id,
    view_count: 0,
    published_at: None,
    created_at: now,
    updated_at: now,
    category_name: None,
    category_slug: None,
    category_color: None,
    author_name: None
  };
  stamp_published_at(&mut article, now);

  write_with_unique_slug(pool, &mut article, &base, None, db::insert_article)?;
  info!("Created article {} ({}) with status {}", article.id, article.slug, article.status);
  // Read it back for the joined category and author fields.
  db::article_by_id(pool, article.id)?
    .ok_or_else(|| ContentError::NotFound(String::from("文章不存在")))
}

pub fn update_article(
  pool: &Pool,
  id: i64,
  changes: ArticleChanges
) -> ContentResult<Article> {
  let mut article = db::article_by_id(pool, id)?
    .ok_or_else(|| ContentError::NotFound(String::from("文章不存在")))?;

  if let Some(category_id) = changes.category_id {
    check_category(pool, category_id)?;
    article.category_id = category_id;
  }
  if let Some(title) = changes.title {
    article.title = title.trim().to_string();
  }
  if let Some(content) = changes.content {
    article.content = content;
  }
  if let Some(excerpt) = changes.excerpt {
    article.excerpt = default_excerpt(excerpt, &article.content);
  }
  if let Some(cover_image) = changes.cover_image {
    article.cover_image = empty_string_to_none(cover_image);
  }
  if let Some(seo_title) = changes.seo_title {
    article.seo_title = empty_string_to_none(seo_title);
  }
  if let Some(seo_description) = changes.seo_description {
    article.seo_description = empty_string_to_none(seo_description);
  }
  if let Some(seo_keywords) = changes.seo_keywords {
    article.seo_keywords = empty_string_to_none(seo_keywords);
  }
  if let Some(status) = changes.status {
    article.status = status;
  }
  let now = current_timestamp();
  article.updated_at = now;
  stamp_published_at(&mut article, now);

  // The current slug stays unless a new one is asked for, it
  // still goes through the uniqueness check (excluding this
  // article) so the write path is the same either way.
  let base = match changes.slug.as_deref().map(slug::slugify) {
    Some(explicit) if !explicit.is_empty() => explicit,
    _ => article.slug.clone()
  };
  write_with_unique_slug(pool, &mut article, &base, Some(id), |pool, article| {
    db::update_article(pool, article).map(|_| ())
  })?;

  db::article_by_id(pool, id)?
    .ok_or_else(|| ContentError::NotFound(String::from("文章不存在")))
}

pub fn delete_article(pool: &Pool, id: i64) -> ContentResult<()> {
  if db::delete_article(pool, id)? {
    info!("Deleted article {}", id);
    Ok(())
  } else {
    Err(ContentError::NotFound(String::from("文章不存在")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::entities::{Category, Role};
  use crate::db::testing::{insert_test_user, test_db};

  fn new_article(title: &str) -> NewArticle {
    NewArticle {
      title: title.to_string(),
      content: "<p>Some <b>content</b></p>".to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn same_title_twice_gets_suffixed_slug() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    let first = create_article(&db.pool, user.id, new_article("Hello World!!")).unwrap();
    let second = create_article(&db.pool, user.id, new_article("Hello World")).unwrap();
    assert_eq!("hello-world", first.slug);
    assert_eq!("hello-world-1", second.slug);
  }

  #[test]
  fn excerpt_defaults_to_stripped_content() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    let article = create_article(&db.pool, user.id, new_article("Title")).unwrap();
    assert_eq!(Some("Some content".to_string()), article.excerpt);
    assert_eq!(ArticleStatus::Draft, article.status);
    assert_eq!(None, article.published_at);
  }

  #[test]
  fn publishing_stamps_published_at_once() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    let draft = create_article(&db.pool, user.id, new_article("Title")).unwrap();

    let published = update_article(&db.pool, draft.id, ArticleChanges {
      status: Some(ArticleStatus::Published),
      ..Default::default()
    }).unwrap();
    let stamp = published.published_at.expect("published_at should be set");

    // Pretend the first publication happened a while ago so a
    // second stamp would be visible.
    let mut old = published.clone();
    old.published_at = Some(stamp - 1000);
    db::update_article(&db.pool, &old).unwrap();

    let saved_again = update_article(&db.pool, draft.id, ArticleChanges {
      title: Some("New title".to_string()),
      status: Some(ArticleStatus::Published),
      ..Default::default()
    }).unwrap();
    assert_eq!(Some(stamp - 1000), saved_again.published_at);
    assert_eq!("New title", saved_again.title);
    // The slug didn't follow the title.
    assert_eq!("title", saved_again.slug);
  }

  #[test]
  fn explicit_slug_on_update_is_checked_against_others() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    create_article(&db.pool, user.id, new_article("Taken")).unwrap();
    let other = create_article(&db.pool, user.id, new_article("Other")).unwrap();
    let updated = update_article(&db.pool, other.id, ArticleChanges {
      slug: Some("Taken".to_string()),
      ..Default::default()
    }).unwrap();
    assert_eq!("taken-1", updated.slug);
  }

  #[test]
  fn unknown_category_is_refused() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    let mut input = new_article("Title");
    input.category_id = Some(99);
    match create_article(&db.pool, user.id, input) {
      Err(ContentError::Invalid(_)) => {},
      other => panic!("expected Invalid, got {:?}", other.map(|a| a.id))
    }
  }

  #[test]
  fn auto_categorize_picks_matching_category() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    let mut tools = Category {
      id: -1,
      name: "AI工具".to_string(),
      slug: "ai-tools".to_string(),
      color: "#3B82F6".to_string(),
      description: None,
      created_at: 0,
      article_count: 0
    };
    db::insert_category(&db.pool, &mut tools).unwrap();
    let mut input = new_article("一个新的写作工具");
    input.auto_categorize = true;
    let article = create_article(&db.pool, user.id, input).unwrap();
    assert_eq!(Some(tools.id), article.category_id);
    assert_eq!(Some("ai-tools".to_string()), article.category_slug);
  }

  #[test]
  fn deleting_missing_article_is_not_found() {
    let db = test_db();
    assert!(matches!(delete_article(&db.pool, 5), Err(ContentError::NotFound(_))));
  }

  #[test]
  fn slug_race_is_retried() {
    // Simulates another writer taking the slug between the
    // probe and the insert on the first attempt.
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    let mut article = crate::db::testing::bare_article("Race", "", user.id);
    let mut first_attempt = true;
    write_with_unique_slug(&db.pool, &mut article, "race", None, |pool, a| {
      if first_attempt {
        first_attempt = false;
        let mut other = crate::db::testing::bare_article("Other", &a.slug, a.author_id);
        db::insert_article(pool, &mut other)?;
      }
      db::insert_article(pool, a)
    }).unwrap();
    assert_eq!("race-1", article.slug);
  }
}
