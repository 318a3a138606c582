use actix_web::{web, HttpResponse};
use log::info;
use crate::content::{articles as article_content, categories as category_content};
use crate::db;
use crate::newsletter::SubscribeOutcome;
use super::super::dtos::*;
use super::super::error::{map_db_error, map_internal_error, Error};
use super::super::extractors::Manager;
use super::super::AppState;
use super::articles::{admin_filter, article_listing, article_or_404};
use super::categories::{category_list, category_or_404};
use super::{check_rate_limit, validated};

// The /functions/* endpoints, used by workflow automation
// (n8n and the like) and by the site's newsletter form. The
// target of PUT and DELETE goes in the query string.

fn required_id(query: &TargetQuery) -> Result<i64, Error> {
  query.id.ok_or_else(|| Error::BadRequest(String::from("缺少参数 id")))
}

/* --- article-api --- */

pub async fn article_api_get(
  app_state: web::Data<AppState>,
  _manager: Manager,
  query: web::Query<TargetQuery>
) -> Result<HttpResponse, Error> {
  let query = query.into_inner();
  if let Some(id) = query.id {
    return Ok(HttpResponse::Ok().json(article_or_404(&app_state.pool, id)?));
  }
  if let Some(slug) = &query.slug {
    return db::article_by_slug(&app_state.pool, slug)
      .map_err(map_db_error)?
      .map(|a| HttpResponse::Ok().json(ArticleDto::from(a)))
      .ok_or_else(|| Error::NotFound(String::from("文章不存在")));
  }
  let filter = admin_filter(query.status, query.category, None);
  let listing = article_listing(&app_state.pool, &filter, query.page, query.per_page)?;
  Ok(HttpResponse::Ok().json(listing))
}

// Auto-categorizes unless told otherwise, the automations
// rarely know the category ids.
pub async fn article_api_post(
  app_state: web::Data<AppState>,
  manager: Manager,
  body: web::Json<ArticleRequest>
) -> Result<HttpResponse, Error> {
  let body = validated(body)?;
  let author_id = manager.author_id(&app_state.pool)?;
  let article = article_content::create_article(
    &app_state.pool,
    author_id,
    body.into_new_article(true)
  )?;
  Ok(HttpResponse::Created().json(ArticleDto::from(article)))
}

pub async fn article_api_put(
  app_state: web::Data<AppState>,
  _manager: Manager,
  query: web::Query<TargetQuery>,
  body: web::Json<ArticleUpdateRequest>
) -> Result<HttpResponse, Error> {
  let id = required_id(&query)?;
  let body = validated(body)?;
  let article = article_content::update_article(&app_state.pool, id, body.into())?;
  Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
}

pub async fn article_api_delete(
  app_state: web::Data<AppState>,
  _manager: Manager,
  query: web::Query<TargetQuery>
) -> Result<HttpResponse, Error> {
  let id = required_id(&query)?;
  article_content::delete_article(&app_state.pool, id)?;
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "文章已删除", id)
  ))
}

/* --- categories-api --- */

pub async fn categories_api_get(
  app_state: web::Data<AppState>,
  _manager: Manager,
  query: web::Query<TargetQuery>
) -> Result<HttpResponse, Error> {
  match query.id {
    Some(id) => Ok(HttpResponse::Ok().json(category_or_404(&app_state.pool, id)?)),
    None => Ok(HttpResponse::Ok().json(category_list(&app_state.pool)?))
  }
}

pub async fn categories_api_post(
  app_state: web::Data<AppState>,
  _manager: Manager,
  body: web::Json<CategoryRequest>
) -> Result<HttpResponse, Error> {
  let body = validated(body)?;
  let category = category_content::create_category(&app_state.pool, body.into())?;
  Ok(HttpResponse::Created().json(CategoryDto::from(category)))
}

pub async fn categories_api_put(
  app_state: web::Data<AppState>,
  _manager: Manager,
  query: web::Query<TargetQuery>,
  body: web::Json<CategoryUpdateRequest>
) -> Result<HttpResponse, Error> {
  let id = required_id(&query)?;
  let body = validated(body)?;
  let category = category_content::update_category(&app_state.pool, id, body.into())?;
  Ok(HttpResponse::Ok().json(CategoryDto::from(category)))
}

pub async fn categories_api_delete(
  app_state: web::Data<AppState>,
  _manager: Manager,
  query: web::Query<TargetQuery>
) -> Result<HttpResponse, Error> {
  let id = required_id(&query)?;
  category_content::delete_category(&app_state.pool, id)?;
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "分类已删除", id)
  ))
}

/* --- Newsletter --- */

pub async fn newsletter_subscribe(
  app_state: web::Data<AppState>,
  body: web::Json<NewsletterRequest>
) -> Result<HttpResponse, Error> {
  check_rate_limit(&app_state)?;
  let body = validated(body)?;
  let outcome = app_state.newsletter
    .subscribe(&app_state.pool, &body.email)
    .await
    .map_err(map_internal_error)?;
  let message = match outcome {
    SubscribeOutcome::Subscribed => "订阅成功，欢迎邮件已发送",
    SubscribeOutcome::Reactivated => "已重新订阅",
    SubscribeOutcome::AlreadySubscribed => "该邮箱已订阅"
  };
  Ok(HttpResponse::Ok().json(SubscribeResponse {
    status: outcome,
    message: message.to_string()
  }))
}

pub async fn newsletter_unsubscribe(
  app_state: web::Data<AppState>,
  body: web::Json<NewsletterRequest>
) -> Result<HttpResponse, Error> {
  check_rate_limit(&app_state)?;
  let body = validated(body)?;
  let found = app_state.newsletter
    .unsubscribe(&app_state.pool, &body.email)
    .await
    .map_err(map_internal_error)?;
  if found {
    Ok(HttpResponse::Ok().json(JsonStatus::new(JsonStatusType::Success, "已取消订阅")))
  } else {
    Err(Error::NotFound(String::from("该邮箱未订阅")))
  }
}

/* --- Scraper --- */

// Manual run from the admin area or an automation.
pub async fn scraper(
  app_state: web::Data<AppState>,
  _manager: Manager
) -> Result<HttpResponse, Error> {
  let report = app_state.scraper.run(&app_state.pool).await?;
  Ok(HttpResponse::Ok().json(report))
}

// Same thing for the cron job on the server itself, the route
// is behind the loopback guard.
pub async fn scheduled_scraper(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  info!("Scheduled scraper run triggered");
  let report = app_state.scraper.run(&app_state.pool).await?;
  Ok(HttpResponse::Ok().json(report))
}
