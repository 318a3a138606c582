use super::entities::*;
use rusqlite::{Row, Error};

// Column lists have to stay in sync with the mappers below,
// which read by index.
pub const USER_FIELDS: &'static str =
  "id, email, password_hash, display_name, avatar_url, bio, role, created_at, updated_at";

pub const ARTICLE_FIELDS: [&'static str; 20] = [
  "a.id", "a.title", "a.slug", "a.content", "a.excerpt", "a.cover_image",
  "a.seo_title", "a.seo_description", "a.seo_keywords", "a.status",
  "a.category_id", "a.author_id", "a.view_count", "a.published_at",
  "a.created_at", "a.updated_at", "c.name", "c.slug", "c.color",
  "u.display_name"
];

pub const ARTICLE_FROM: &'static str =
  "articles a LEFT JOIN categories c ON a.category_id = c.id \
  LEFT JOIN users u ON a.author_id = u.id";

pub const MEDIA_FIELDS: &'static str =
  "id, file_name, file_path, url, file_size, mime_type, width, height, \
  duration, alt_text, uploaded_by, created_at";

pub fn map_user(row: &Row) -> Result<User, Error> {
  Ok(User {
    id: row.get(0)?,
    email: row.get(1)?,
    password_hash: row.get(2)?,
    display_name: row.get(3)?,
    avatar_url: row.get(4)?,
    bio: row.get(5)?,
    role: row.get(6)?,
    created_at: row.get(7)?,
    updated_at: row.get(8)?
  })
}

pub fn map_article(row: &Row) -> Result<Article, Error> {
  Ok(Article {
    id: row.get(0)?,
    title: row.get(1)?,
    slug: row.get(2)?,
    content: row.get(3)?,
    excerpt: row.get(4)?,
    cover_image: row.get(5)?,
    seo_title: row.get(6)?,
    seo_description: row.get(7)?,
    seo_keywords: row.get(8)?,
    status: row.get(9)?,
    category_id: row.get(10)?,
    author_id: row.get(11)?,
    view_count: row.get(12)?,
    published_at: row.get(13)?,
    created_at: row.get(14)?,
    updated_at: row.get(15)?,
    category_name: row.get(16)?,
    category_slug: row.get(17)?,
    category_color: row.get(18)?,
    author_name: row.get(19)?
  })
}

pub fn map_category(row: &Row) -> Result<Category, Error> {
  Ok(Category {
    id: row.get(0)?,
    name: row.get(1)?,
    slug: row.get(2)?,
    color: row.get(3)?,
    description: row.get(4)?,
    created_at: row.get(5)?,
    article_count: row.get(6)?
  })
}

pub fn map_media(row: &Row) -> Result<MediaAsset, Error> {
  Ok(MediaAsset {
    id: row.get(0)?,
    file_name: row.get(1)?,
    file_path: row.get(2)?,
    url: row.get(3)?,
    file_size: row.get(4)?,
    mime_type: row.get(5)?,
    width: row.get(6)?,
    height: row.get(7)?,
    duration: row.get(8)?,
    alt_text: row.get(9)?,
    uploaded_by: row.get(10)?,
    created_at: row.get(11)?
  })
}

pub fn map_page(row: &Row) -> Result<Page, Error> {
  Ok(Page {
    slug: row.get(0)?,
    title: row.get(1)?,
    content: row.get(2)?,
    seo_description: row.get(3)?,
    updated_at: row.get(4)?,
    updated_by: row.get(5)?
  })
}

pub fn map_setting(row: &Row) -> Result<Setting, Error> {
  Ok(Setting {
    key: row.get(0)?,
    value: row.get(1)?,
    updated_at: row.get(2)?
  })
}

pub fn map_subscriber(row: &Row) -> Result<Subscriber, Error> {
  Ok(Subscriber {
    id: row.get(0)?,
    email: row.get(1)?,
    is_active: row.get(2)?,
    subscribed_at: row.get(3)?,
    unsubscribed_at: row.get(4)?
  })
}
