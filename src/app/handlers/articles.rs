use actix_web::{web, HttpResponse};
use crate::content::articles as content;
use crate::db::{self, ArticleFilter, Pool};
use crate::db::entities::ArticleStatus;
use crate::utils::serde_utils::empty_string_to_none;
use super::super::dtos::*;
use super::super::error::{map_db_error, Error};
use super::super::extractors::Manager;
use super::super::helpers::page_params;
use super::super::AppState;
use super::validated;

// Shared by the public listing, the admin one and the
// workflow API.
pub(super) fn article_listing(
  pool: &Pool,
  filter: &ArticleFilter,
  page: Option<i64>,
  per_page: Option<i64>
) -> Result<Paginated<ArticleDto>, Error> {
  let (page, per_page, offset) = page_params(page, per_page);
  let total = db::article_count(pool, filter).map_err(map_db_error)?;
  let items = db::articles_page(pool, filter, offset, per_page)
    .map_err(map_db_error)?
    .into_iter()
    .map(|a| ArticleDto::from(a).without_content())
    .collect();
  Ok(Paginated::new(items, total, page, per_page))
}

pub(super) fn admin_filter(
  status: Option<ArticleStatus>,
  category: Option<String>,
  search: Option<String>
) -> ArticleFilter {
  ArticleFilter {
    status,
    category_slug: empty_string_to_none(category),
    search: empty_string_to_none(search),
    ..Default::default()
  }
}

pub(super) fn article_or_404(pool: &Pool, id: i64) -> Result<ArticleDto, Error> {
  db::article_by_id(pool, id)
    .map_err(map_db_error)?
    .map(ArticleDto::from)
    .ok_or_else(|| Error::NotFound(String::from("文章不存在")))
}

/* --- Public --- */

// Published articles only, newest first.
pub async fn published_articles(
  app_state: web::Data<AppState>,
  query: web::Query<ArticlesQuery>
) -> Result<HttpResponse, Error> {
  let query = query.into_inner();
  let filter = admin_filter(Some(ArticleStatus::Published), query.category, query.search);
  let listing = article_listing(&app_state.pool, &filter, query.page, query.per_page)?;
  Ok(HttpResponse::Ok().json(listing))
}

// Reading an article counts as a view.
pub async fn published_article(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  let mut article = db::article_by_slug(&app_state.pool, &slug)
    .map_err(map_db_error)?
    .filter(|a| a.status == ArticleStatus::Published)
    .ok_or_else(|| Error::NotFound(String::from("文章不存在")))?;
  db::increment_views(&app_state.pool, article.id).map_err(map_db_error)?;
  article.view_count += 1;
  Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
}

/* --- Admin --- */

pub async fn admin_articles(
  app_state: web::Data<AppState>,
  _manager: Manager,
  query: web::Query<ArticlesQuery>
) -> Result<HttpResponse, Error> {
  let query = query.into_inner();
  let filter = admin_filter(query.status, query.category, query.search);
  let listing = article_listing(&app_state.pool, &filter, query.page, query.per_page)?;
  Ok(HttpResponse::Ok().json(listing))
}

pub async fn admin_article(
  app_state: web::Data<AppState>,
  _manager: Manager,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  Ok(HttpResponse::Ok().json(article_or_404(&app_state.pool, id)?))
}

pub async fn create_article(
  app_state: web::Data<AppState>,
  manager: Manager,
  body: web::Json<ArticleRequest>
) -> Result<HttpResponse, Error> {
  let body = validated(body)?;
  let author_id = manager.author_id(&app_state.pool)?;
  let article = content::create_article(
    &app_state.pool,
    author_id,
    body.into_new_article(false)
  )?;
  Ok(HttpResponse::Created().json(ArticleDto::from(article)))
}

pub async fn update_article(
  app_state: web::Data<AppState>,
  _manager: Manager,
  path: web::Path<(i64,)>,
  body: web::Json<ArticleUpdateRequest>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  let body = validated(body)?;
  let article = content::update_article(&app_state.pool, id, body.into())?;
  Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
}

pub async fn delete_article(
  app_state: web::Data<AppState>,
  _manager: Manager,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  content::delete_article(&app_state.pool, id)?;
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "文章已删除", id)
  ))
}
