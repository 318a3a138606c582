use log::info;
use crate::db::{self, Pool};
use crate::db::entities::Category;
use crate::utils::serde_utils::empty_string_to_none;
use crate::utils::time_utils::current_timestamp;
use super::{slug, ContentError, ContentResult};

pub const DEFAULT_COLOR: &'static str = "#3B82F6";

#[derive(Debug, Default, Clone)]
pub struct CategoryInput {
  pub name: String,
  pub slug: Option<String>,
  pub color: Option<String>,
  pub description: Option<String>
}

#[derive(Debug, Default, Clone)]
pub struct CategoryChanges {
  pub name: Option<String>,
  pub slug: Option<String>,
  pub color: Option<String>,
  pub description: Option<Option<String>>
}

// Category names are often Chinese, which slugify throws away
// entirely, hence the synthetic fallback.
fn category_slug(requested: Option<&str>, name: &str) -> String {
  let from_request = requested.map(slug::slugify).unwrap_or_default();
  if !from_request.is_empty() {
    return from_request;
  }
  let from_name = slug::slugify(name);
  if from_name.is_empty() {
    slug::synthetic_slug("category")
  } else {
    from_name
  }
}

// Name and slug are both unique, checked here first so the
// user gets a readable message instead of a constraint error.
fn check_unique(pool: &Pool, name: &str, slug: &str, own_id: Option<i64>) -> ContentResult<()> {
  if let Some(existing) = db::category_by_name(pool, name)? {
    if Some(existing.id) != own_id {
      return Err(ContentError::Invalid(format!("分类名称“{}”已存在", name)));
    }
  }
  if let Some(existing) = db::category_by_slug(pool, slug)? {
    if Some(existing.id) != own_id {
      return Err(ContentError::Invalid(format!("分类别名“{}”已存在", slug)));
    }
  }
  Ok(())
}

pub fn create_category(pool: &Pool, input: CategoryInput) -> ContentResult<Category> {
  let name = input.name.trim().to_string();
  let slug = category_slug(input.slug.as_deref(), &name);
  check_unique(pool, &name, &slug, None)?;
  let mut category = Category {
    id: -1,
    name,
    slug,
    color: empty_string_to_none(input.color).unwrap_or(DEFAULT_COLOR.to_string()),
    description: empty_string_to_none(input.description),
    created_at: current_timestamp(),
    article_count: 0
  };
  db::insert_category(pool, &mut category)?;
  info!("Created category {} ({})", category.id, category.slug);
  Ok(category)
}

pub fn update_category(pool: &Pool, id: i64, changes: CategoryChanges) -> ContentResult<Category> {
  let mut category = db::category_by_id(pool, id)?
    .ok_or_else(|| ContentError::NotFound(String::from("分类不存在")))?;
  if let Some(name) = changes.name {
    category.name = name.trim().to_string();
  }
  if let Some(requested) = changes.slug {
    category.slug = category_slug(Some(requested.as_str()), &category.name);
  }
  if let Some(color) = empty_string_to_none(changes.color) {
    category.color = color;
  }
  if let Some(description) = changes.description {
    category.description = empty_string_to_none(description);
  }
  check_unique(pool, &category.name, &category.slug, Some(id))?;
  db::update_category(pool, &category)?;
  Ok(category)
}

// Refused while any article points at the category, whatever
// its status.
pub fn delete_category(pool: &Pool, id: i64) -> ContentResult<()> {
  if db::category_by_id(pool, id)?.is_none() {
    return Err(ContentError::NotFound(String::from("分类不存在")));
  }
  let count = db::article_count_for_category(pool, id)?;
  if count > 0 {
    return Err(ContentError::Invalid(
      format!("该分类下还有 {} 篇文章，无法删除", count)
    ));
  }
  db::delete_category(pool, id)?;
  info!("Deleted category {}", id);
  Ok(())
}
