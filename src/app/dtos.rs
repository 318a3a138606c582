use serde::{Deserialize, Serialize};
use derive_more::Display;
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidateUrl, ValidationError};
use crate::content::articles::{ArticleChanges, NewArticle};
use crate::content::categories::{CategoryChanges, CategoryInput};
use crate::db::entities::*;
use crate::db::ArticleStats;
use crate::newsletter::SubscribeOutcome;
use crate::utils::{serde_utils, time_utils};

// Entities go out through these with From, dates become
// RFC 3339 strings on the way.

/* --- Custom validation functions --- */

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
  let mut error = ValidationError::new(code);
  error.message = Some(Cow::Borrowed(message));
  error
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
  let hex = color.strip_prefix('#').unwrap_or("");
  if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
    Ok(())
  } else {
    Err(invalid("color", "颜色必须是 #RRGGBB 格式"))
  }
}

// Empty strings are how the editor clears a link.
fn validate_optional_url(url: &str) -> Result<(), ValidationError> {
  if url.is_empty() || url.validate_url() {
    Ok(())
  } else {
    Err(invalid("url", "请输入有效的链接地址"))
  }
}

fn validate_mime_type(mime: &str) -> Result<(), ValidationError> {
  let allowed = ["image/", "video/", "audio/"]
    .iter()
    .any(|prefix| mime.starts_with(prefix) && mime.len() > prefix.len());
  if allowed || mime == "application/pdf" {
    Ok(())
  } else {
    Err(invalid("mime_type", "不支持的文件类型"))
  }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    Err(invalid("blank", "内容不能为空"))
  } else {
    Ok(())
  }
}

/* --- Request bodies and query strings --- */

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
  #[validate(email(message = "请输入有效的邮箱地址"))]
  pub email: String,
  #[validate(length(min = 8, max = 128, message = "密码长度必须在8到128个字符之间"))]
  pub password: String,
  #[validate(length(min = 1, max = 50, message = "昵称长度必须在1到50个字符之间"))]
  pub display_name: String
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
  #[validate(email(message = "请输入有效的邮箱地址"))]
  pub email: String,
  #[validate(length(min = 1, message = "请输入密码"))]
  pub password: String
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileRequest {
  #[validate(length(min = 1, max = 50, message = "昵称长度必须在1到50个字符之间"))]
  pub display_name: String,
  #[validate(custom(function = "validate_optional_url"))]
  pub avatar_url: Option<String>,
  #[validate(length(max = 500, message = "个人简介不能超过500个字符"))]
  pub bio: Option<String>
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
  #[validate(length(min = 1, message = "请输入当前密码"))]
  pub current_password: String,
  #[validate(length(min = 8, max = 128, message = "新密码长度必须在8到128个字符之间"))]
  pub new_password: String
}

#[derive(Debug, Deserialize, Validate)]
pub struct ArticleRequest {
  #[validate(length(min = 1, max = 200, message = "标题长度必须在1到200个字符之间"))]
  pub title: String,
  pub slug: Option<String>,
  #[validate(custom(function = "validate_not_blank"))]
  pub content: String,
  #[validate(length(max = 500, message = "摘要不能超过500个字符"))]
  pub excerpt: Option<String>,
  #[validate(custom(function = "validate_optional_url"))]
  pub cover_image: Option<String>,
  #[validate(length(max = 70, message = "SEO标题不能超过70个字符"))]
  pub seo_title: Option<String>,
  #[validate(length(max = 160, message = "SEO描述不能超过160个字符"))]
  pub seo_description: Option<String>,
  pub seo_keywords: Option<String>,
  pub status: Option<ArticleStatus>,
  pub category_id: Option<i64>,
  pub auto_categorize: Option<bool>
}

impl ArticleRequest {
  // The caller decides what happens when auto_categorize
  // wasn't in the body.
  pub fn into_new_article(self, auto_categorize_default: bool) -> NewArticle {
    NewArticle {
      title: self.title,
      slug: self.slug,
      content: self.content,
      excerpt: self.excerpt,
      cover_image: self.cover_image,
      seo_title: self.seo_title,
      seo_description: self.seo_description,
      seo_keywords: self.seo_keywords,
      status: self.status,
      category_id: self.category_id,
      auto_categorize: self.auto_categorize.unwrap_or(auto_categorize_default)
    }
  }
}

// Absent fields are left alone, explicit nulls clear the
// nullable ones. That's what the double Options are for.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ArticleUpdateRequest {
  #[validate(length(min = 1, max = 200, message = "标题长度必须在1到200个字符之间"))]
  pub title: Option<String>,
  pub slug: Option<String>,
  #[validate(custom(function = "validate_not_blank"))]
  pub content: Option<String>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  #[validate(length(max = 500, message = "摘要不能超过500个字符"))]
  pub excerpt: Option<Option<String>>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  #[validate(custom(function = "validate_optional_url"))]
  pub cover_image: Option<Option<String>>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  #[validate(length(max = 70, message = "SEO标题不能超过70个字符"))]
  pub seo_title: Option<Option<String>>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  #[validate(length(max = 160, message = "SEO描述不能超过160个字符"))]
  pub seo_description: Option<Option<String>>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  pub seo_keywords: Option<Option<String>>,
  pub status: Option<ArticleStatus>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  pub category_id: Option<Option<i64>>
}

impl From<ArticleUpdateRequest> for ArticleChanges {
  fn from(dto: ArticleUpdateRequest) -> Self {
    Self {
      title: dto.title,
      slug: dto.slug,
      content: dto.content,
      excerpt: dto.excerpt,
      cover_image: dto.cover_image,
      seo_title: dto.seo_title,
      seo_description: dto.seo_description,
      seo_keywords: dto.seo_keywords,
      status: dto.status,
      category_id: dto.category_id
    }
  }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
  #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1到50个字符之间"))]
  pub name: String,
  pub slug: Option<String>,
  #[validate(custom(function = "validate_color"))]
  pub color: Option<String>,
  #[validate(length(max = 200, message = "分类描述不能超过200个字符"))]
  pub description: Option<String>
}

impl From<CategoryRequest> for CategoryInput {
  fn from(dto: CategoryRequest) -> Self {
    Self {
      name: dto.name,
      slug: dto.slug,
      color: dto.color,
      description: dto.description
    }
  }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CategoryUpdateRequest {
  #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1到50个字符之间"))]
  pub name: Option<String>,
  pub slug: Option<String>,
  #[validate(custom(function = "validate_color"))]
  pub color: Option<String>,
  #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
  #[validate(length(max = 200, message = "分类描述不能超过200个字符"))]
  pub description: Option<Option<String>>
}

impl From<CategoryUpdateRequest> for CategoryChanges {
  fn from(dto: CategoryUpdateRequest) -> Self {
    Self {
      name: dto.name,
      slug: dto.slug,
      color: dto.color,
      description: dto.description
    }
  }
}

// The file itself is uploaded to object storage by the
// client, we only keep track of it.
#[derive(Debug, Deserialize, Validate)]
pub struct MediaRequest {
  #[validate(custom(function = "validate_not_blank"))]
  pub file_name: String,
  #[validate(custom(function = "validate_not_blank"))]
  pub file_path: String,
  #[validate(url(message = "请输入有效的链接地址"))]
  pub url: String,
  #[validate(range(min = 1, max = 52428800, message = "文件大小必须在1字节到50MB之间"))]
  pub file_size: i64,
  #[validate(custom(function = "validate_mime_type"))]
  pub mime_type: String,
  pub width: Option<i64>,
  pub height: Option<i64>,
  pub duration: Option<f64>,
  #[validate(length(max = 200, message = "替代文本不能超过200个字符"))]
  pub alt_text: Option<String>
}

impl MediaRequest {
  pub fn into_media(self, uploaded_by: i64, now: i64) -> MediaAsset {
    MediaAsset {
      id: -1,
      file_name: self.file_name.trim().to_string(),
      file_path: self.file_path,
      url: self.url,
      file_size: self.file_size,
      mime_type: self.mime_type,
      width: self.width,
      height: self.height,
      duration: self.duration,
      alt_text: serde_utils::empty_string_to_none(self.alt_text),
      uploaded_by,
      created_at: now
    }
  }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PageRequest {
  #[validate(length(min = 1, max = 200, message = "标题长度必须在1到200个字符之间"))]
  pub title: String,
  pub content: String,
  #[validate(length(max = 160, message = "SEO描述不能超过160个字符"))]
  pub seo_description: Option<String>
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewsletterRequest {
  #[validate(email(message = "请输入有效的邮箱地址"))]
  pub email: String
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticlesQuery {
  pub page: Option<i64>,
  pub per_page: Option<i64>,
  // Category slug.
  pub category: Option<String>,
  pub search: Option<String>,
  // Ignored on the public listing.
  pub status: Option<ArticleStatus>
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaQuery {
  pub page: Option<i64>,
  pub per_page: Option<i64>,
  // "image", "video"... matched as a prefix.
  pub mime_type: Option<String>
}

// The workflow endpoints take their target in the query
// string.
#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
  pub id: Option<i64>,
  pub slug: Option<String>,
  pub page: Option<i64>,
  pub per_page: Option<i64>,
  pub status: Option<ArticleStatus>,
  pub category: Option<String>
}

/* --- Response objects --- */

#[derive(Debug, Serialize)]
pub struct UserDto {
  pub id: i64,
  pub email: String,
  pub display_name: String,
  pub avatar_url: Option<String>,
  pub bio: Option<String>,
  pub role: Role,
  pub created_at: String
}

impl From<User> for UserDto {
  fn from(user: User) -> Self {
    Self {
      id: user.id,
      email: user.email,
      display_name: user.display_name,
      avatar_url: user.avatar_url,
      bio: user.bio,
      role: user.role,
      created_at: time_utils::timestamp_to_rfc3339(user.created_at)
    }
  }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub token: String,
  pub user: UserDto
}

#[derive(Debug, Serialize)]
pub struct CategoryRefDto {
  pub id: i64,
  pub name: String,
  pub slug: String,
  pub color: String
}

#[derive(Debug, Serialize)]
pub struct ArticleDto {
  pub id: i64,
  pub title: String,
  pub slug: String,
  pub excerpt: Option<String>,
  // Left out of listings.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  pub cover_image: Option<String>,
  pub seo_title: Option<String>,
  pub seo_description: Option<String>,
  pub seo_keywords: Option<String>,
  pub status: ArticleStatus,
  pub category_id: Option<i64>,
  pub category: Option<CategoryRefDto>,
  pub author_id: i64,
  pub author_name: Option<String>,
  pub view_count: i64,
  pub published_at: Option<String>,
  pub created_at: String,
  pub updated_at: String
}

impl From<Article> for ArticleDto {
  fn from(article: Article) -> Self {
    let category = match (article.category_id, article.category_name, article.category_slug) {
      (Some(id), Some(name), Some(slug)) => Some(CategoryRefDto {
        id,
        name,
        slug,
        color: article.category_color.unwrap_or_default()
      }),
      _ => None
    };
    Self {
      id: article.id,
      title: article.title,
      slug: article.slug,
      excerpt: article.excerpt,
      content: Some(article.content),
      cover_image: article.cover_image,
      seo_title: article.seo_title,
      seo_description: article.seo_description,
      seo_keywords: article.seo_keywords,
      status: article.status,
      category_id: article.category_id,
      category,
      author_id: article.author_id,
      author_name: article.author_name,
      view_count: article.view_count,
      published_at: article.published_at.map(time_utils::timestamp_to_rfc3339),
      created_at: time_utils::timestamp_to_rfc3339(article.created_at),
      updated_at: time_utils::timestamp_to_rfc3339(article.updated_at)
    }
  }
}

impl ArticleDto {
  pub fn without_content(mut self) -> Self {
    self.content = None;
    self
  }
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
  pub id: i64,
  pub name: String,
  pub slug: String,
  pub color: String,
  pub description: Option<String>,
  pub article_count: i64,
  pub created_at: String
}

impl From<Category> for CategoryDto {
  fn from(category: Category) -> Self {
    Self {
      id: category.id,
      name: category.name,
      slug: category.slug,
      color: category.color,
      description: category.description,
      article_count: category.article_count,
      created_at: time_utils::timestamp_to_rfc3339(category.created_at)
    }
  }
}

#[derive(Debug, Serialize)]
pub struct MediaDto {
  pub id: i64,
  pub file_name: String,
  pub file_path: String,
  pub url: String,
  pub file_size: i64,
  pub mime_type: String,
  pub width: Option<i64>,
  pub height: Option<i64>,
  pub duration: Option<f64>,
  pub alt_text: Option<String>,
  pub uploaded_by: i64,
  pub created_at: String
}

impl From<MediaAsset> for MediaDto {
  fn from(media: MediaAsset) -> Self {
    Self {
      id: media.id,
      file_name: media.file_name,
      file_path: media.file_path,
      url: media.url,
      file_size: media.file_size,
      mime_type: media.mime_type,
      width: media.width,
      height: media.height,
      duration: media.duration,
      alt_text: media.alt_text,
      uploaded_by: media.uploaded_by,
      created_at: time_utils::timestamp_to_rfc3339(media.created_at)
    }
  }
}

#[derive(Debug, Serialize)]
pub struct PageDto {
  pub slug: String,
  pub title: String,
  pub content: String,
  pub seo_description: Option<String>,
  pub updated_at: String
}

impl From<Page> for PageDto {
  fn from(page: Page) -> Self {
    Self {
      slug: page.slug,
      title: page.title,
      content: page.content,
      seo_description: page.seo_description,
      updated_at: time_utils::timestamp_to_rfc3339(page.updated_at)
    }
  }
}

// Settings go out as one object, key => parsed JSON value.
// A value that somehow isn't valid JSON goes out as a string.
pub fn settings_to_map(settings: Vec<Setting>) -> BTreeMap<String, serde_json::Value> {
  settings.into_iter()
    .map(|s| {
      let value = serde_json::from_str(&s.value)
        .unwrap_or(serde_json::Value::String(s.value));
      (s.key, value)
    })
    .collect()
}

#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
  pub items: Vec<T>,
  pub total: i64,
  pub page: i64,
  pub per_page: i64,
  pub total_pages: i64
}

impl<T: Serialize> Paginated<T> {
  pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
    Self {
      items,
      total,
      page,
      per_page,
      total_pages: (total + per_page - 1) / per_page
    }
  }
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
  pub status: SubscribeOutcome,
  pub message: String
}

#[derive(Debug, Serialize)]
pub struct StatsDto {
  pub articles: ArticleStats,
  pub categories: usize,
  pub users: i64,
  pub subscribers: i64,
  pub active_subscribers: i64,
  pub media: i64
}

// Used for the responses that only need to say how it went.
#[derive(Debug, Deserialize, Serialize)]
pub struct JsonStatus {
  pub status: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>
}

#[derive(Debug, Display)]
pub enum JsonStatusType {
  #[display(fmt = "success")]
  Success,
  #[display(fmt = "error")]
  Error
}

impl JsonStatus {
  pub fn new(status: JsonStatusType, message: &str) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: None
    }
  }

  pub fn new_with_id(
    status: JsonStatusType,
    message: &str,
    id: i64
  ) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: Some(id)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MAX_MEDIA_SIZE: i64 = 50 * 1024 * 1024;

  #[test]
  fn color_must_be_hex_triplet() {
    assert!(validate_color("#3B82F6").is_ok());
    assert!(validate_color("#3b82f6").is_ok());
    assert!(validate_color("3B82F6").is_err());
    assert!(validate_color("#3B82F").is_err());
    assert!(validate_color("#GGGGGG").is_err());
  }

  #[test]
  fn mime_families() {
    assert!(validate_mime_type("image/png").is_ok());
    assert!(validate_mime_type("audio/mpeg").is_ok());
    assert!(validate_mime_type("application/pdf").is_ok());
    assert!(validate_mime_type("application/zip").is_err());
    assert!(validate_mime_type("image/").is_err());
  }

  #[test]
  fn media_size_is_bounded() {
    let mut media = MediaRequest {
      file_name: "cat.png".to_string(),
      file_path: "uploads/cat.png".to_string(),
      url: "https://cdn.example.com/cat.png".to_string(),
      file_size: MAX_MEDIA_SIZE,
      mime_type: "image/png".to_string(),
      width: None,
      height: None,
      duration: None,
      alt_text: None
    };
    assert!(media.validate().is_ok());
    media.file_size = MAX_MEDIA_SIZE + 1;
    assert!(media.validate().is_err());
    media.file_size = 0;
    assert!(media.validate().is_err());
  }

  #[test]
  fn update_request_tells_null_from_absent() {
    let dto: ArticleUpdateRequest = serde_json::from_str(
      r#"{"cover_image": null, "title": "New"}"#
    ).unwrap();
    assert_eq!(Some(None), dto.cover_image);
    assert_eq!(None, dto.excerpt);
    assert_eq!(None, dto.category_id);
    assert!(dto.validate().is_ok());
  }

  #[test]
  fn empty_cover_image_is_allowed() {
    let dto: ArticleUpdateRequest = serde_json::from_str(r#"{"cover_image": ""}"#).unwrap();
    assert!(dto.validate().is_ok());
    let dto: ArticleUpdateRequest = serde_json::from_str(r#"{"cover_image": "not a url"}"#).unwrap();
    assert!(dto.validate().is_err());
  }

  #[test]
  fn article_dto_nests_the_category() {
    let mut article = crate::db::testing::bare_article("T", "t", 1);
    article.category_id = Some(3);
    article.category_name = Some("AI工具".to_string());
    article.category_slug = Some("ai-tools".to_string());
    article.category_color = Some("#3B82F6".to_string());
    let dto = ArticleDto::from(article).without_content();
    assert_eq!("ai-tools", dto.category.as_ref().unwrap().slug);
    assert!(dto.content.is_none());
    assert_eq!("1970-01-01T00:01:40Z", dto.created_at);
  }

  #[test]
  fn total_pages_rounds_up() {
    assert_eq!(3, Paginated::<i64>::new(vec![], 21, 1, 10).total_pages);
    assert_eq!(0, Paginated::<i64>::new(vec![], 0, 1, 10).total_pages);
  }
}
