use actix_web::{web, HttpResponse};
use log::info;
use std::collections::BTreeMap;
use crate::content::slug::slugify;
use crate::db;
use crate::db::entities::Page;
use crate::utils::serde_utils::empty_string_to_none;
use crate::utils::time_utils::current_timestamp;
use super::super::dtos::*;
use super::super::error::{map_db_error, Error};
use super::super::extractors::Manager;
use super::super::AppState;
use super::validated;

const MAX_SETTING_KEY_LENGTH: usize = 64;

pub async fn page(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  db::page_by_slug(&app_state.pool, &slug)
    .map_err(map_db_error)?
    .map(|p| HttpResponse::Ok().json(PageDto::from(p)))
    .ok_or_else(|| Error::NotFound(String::from("页面不存在")))
}

pub async fn settings(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  let settings = db::all_settings(&app_state.pool).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(settings_to_map(settings)))
}

pub async fn admin_pages(
  app_state: web::Data<AppState>,
  _manager: Manager
) -> Result<HttpResponse, Error> {
  let pages: Vec<PageDto> = db::all_pages(&app_state.pool)
    .map_err(map_db_error)?
    .into_iter()
    .map(PageDto::from)
    .collect();
  Ok(HttpResponse::Ok().json(pages))
}

// Creates the page if the slug is new.
pub async fn upsert_page(
  app_state: web::Data<AppState>,
  manager: Manager,
  path: web::Path<(String,)>,
  body: web::Json<PageRequest>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  if slugify(&slug) != slug {
    return Err(Error::BadRequest(String::from("页面别名只能包含小写字母、数字和连字符")));
  }
  let body = validated(body)?;
  let page = Page {
    slug,
    title: body.title.trim().to_string(),
    content: body.content,
    seo_description: empty_string_to_none(body.seo_description),
    updated_at: current_timestamp(),
    updated_by: match manager {
      Manager::Admin(user) => Some(user.id),
      Manager::ApiKey => None
    }
  };
  db::upsert_page(&app_state.pool, &page).map_err(map_db_error)?;
  info!("Saved page {}", page.slug);
  Ok(HttpResponse::Ok().json(PageDto::from(page)))
}

// Takes an object of key => any JSON value, unknown keys are
// created. Answers with the whole settings object.
pub async fn update_settings(
  app_state: web::Data<AppState>,
  _manager: Manager,
  body: web::Json<BTreeMap<String, serde_json::Value>>
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  if body.is_empty() {
    return Err(Error::BadRequest(String::from("没有需要保存的设置")));
  }
  if let Some(key) = body.keys().find(|k| k.trim().is_empty() || k.len() > MAX_SETTING_KEY_LENGTH) {
    return Err(Error::BadRequest(format!("设置项名称无效：{}", key)));
  }
  let now = current_timestamp();
  let values = body.iter().map(|(key, value)| (key.as_str(), value.to_string()));
  db::upsert_settings(&app_state.pool, values, now)
    .map_err(map_db_error)?;
  let settings = db::all_settings(&app_state.pool).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(settings_to_map(settings)))
}

pub async fn stats(
  app_state: web::Data<AppState>,
  _manager: Manager
) -> Result<HttpResponse, Error> {
  let pool = &app_state.pool;
  let stats = StatsDto {
    articles: db::article_stats(pool).map_err(map_db_error)?,
    categories: db::all_categories(pool).map_err(map_db_error)?.len(),
    users: db::user_count(pool).map_err(map_db_error)?,
    subscribers: db::subscriber_count(pool, false).map_err(map_db_error)?,
    active_subscribers: db::subscriber_count(pool, true).map_err(map_db_error)?,
    media: db::media_count(pool, None).map_err(map_db_error)?
  };
  Ok(HttpResponse::Ok().json(stats))
}
