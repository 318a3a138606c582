use rusqlite::params;
use color_eyre::Result;
use super::entities::Category;
use super::mappers::map_category;
use super::{execute, select_many, select_one, Pool};

// The article count is a subquery so that the same mapper
// works for single categories and the listing.
const CATEGORY_SELECT: &'static str =
  "SELECT c.id, c.name, c.slug, c.color, c.description, c.created_at, \
  (SELECT count(*) FROM articles a WHERE a.category_id = c.id) \
  FROM categories c";

// Ordered by id: auto-categorization breaks ties with the
// first category seen, which has to be stable.
pub fn all_categories(pool: &Pool) -> Result<Vec<Category>> {
  select_many(
    pool,
    &format!("{} ORDER BY c.id ASC", CATEGORY_SELECT),
    [],
    map_category
  )
}

pub fn category_by_id(pool: &Pool, id: i64) -> Result<Option<Category>> {
  select_one(
    pool,
    &format!("{} WHERE c.id = ?", CATEGORY_SELECT),
    params![id],
    map_category
  )
}

pub fn category_by_slug(pool: &Pool, slug: &str) -> Result<Option<Category>> {
  select_one(
    pool,
    &format!("{} WHERE c.slug = ?", CATEGORY_SELECT),
    params![slug],
    map_category
  )
}

// Case-insensitive, "AI Tools" and "ai tools" are the same
// category for humans.
pub fn category_by_name(pool: &Pool, name: &str) -> Result<Option<Category>> {
  select_one(
    pool,
    &format!("{} WHERE lower(c.name) = lower(?)", CATEGORY_SELECT),
    params![name],
    map_category
  )
}

pub fn insert_category(pool: &Pool, category: &mut Category) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO categories (name, slug, color, description, created_at) \
    VALUES (?, ?, ?, ?, ?)",
    params![
      category.name,
      category.slug,
      category.color,
      category.description,
      category.created_at
    ]
  )?;
  category.id = conn.last_insert_rowid();
  Ok(())
}

pub fn update_category(pool: &Pool, category: &Category) -> Result<bool> {
  let changed = execute(
    pool,
    "UPDATE categories SET name = ?, slug = ?, color = ?, description = ? WHERE id = ?",
    params![
      category.name,
      category.slug,
      category.color,
      category.description,
      category.id
    ]
  )?;
  Ok(changed > 0)
}

// The foreign key is ON DELETE RESTRICT so this errors out
// when articles still point at the category. The content
// module checks first to give a proper message.
pub fn delete_category(pool: &Pool, id: i64) -> Result<bool> {
  let changed = execute(pool, "DELETE FROM categories WHERE id = ?", params![id])?;
  Ok(changed > 0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::entities::Role;
  use crate::db::testing::{bare_article, insert_test_user, test_db};
  use crate::db::insert_article;

  fn category(name: &str, slug: &str) -> Category {
    Category {
      id: -1,
      name: name.to_string(),
      slug: slug.to_string(),
      color: "#3B82F6".to_string(),
      description: None,
      created_at: 0,
      article_count: 0
    }
  }

  #[test]
  fn listing_counts_articles() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    let mut news = category("News", "news");
    insert_category(&db.pool, &mut news).unwrap();
    let mut tools = category("Tools", "tools");
    insert_category(&db.pool, &mut tools).unwrap();
    let mut article = bare_article("One", "one", user.id);
    article.category_id = Some(tools.id);
    insert_article(&db.pool, &mut article).unwrap();

    let all = all_categories(&db.pool).unwrap();
    assert_eq!(vec!["news", "tools"], all.iter().map(|c| c.slug.as_str()).collect::<Vec<_>>());
    assert_eq!(0, all[0].article_count);
    assert_eq!(1, all[1].article_count);
  }

  #[test]
  fn referenced_category_cannot_be_deleted_by_the_database() {
    let db = test_db();
    let user = insert_test_user(&db.pool, "a@example.com", Role::Admin);
    let mut tools = category("Tools", "tools");
    insert_category(&db.pool, &mut tools).unwrap();
    let mut article = bare_article("One", "one", user.id);
    article.category_id = Some(tools.id);
    insert_article(&db.pool, &mut article).unwrap();

    assert!(delete_category(&db.pool, tools.id).is_err());
    assert!(category_by_id(&db.pool, tools.id).unwrap().is_some());
  }

  #[test]
  fn name_lookup_ignores_case() {
    let db = test_db();
    let mut tools = category("AI Tools", "ai-tools");
    insert_category(&db.pool, &mut tools).unwrap();
    assert!(category_by_name(&db.pool, "ai tools").unwrap().is_some());
    assert!(category_by_slug(&db.pool, "ai-tools").unwrap().is_some());
  }
}
