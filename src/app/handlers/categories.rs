use actix_web::{web, HttpResponse};
use crate::content::categories as content;
use crate::db::{self, Pool};
use super::super::dtos::*;
use super::super::error::{map_db_error, Error};
use super::super::extractors::Manager;
use super::super::AppState;
use super::validated;

pub(super) fn category_list(pool: &Pool) -> Result<Vec<CategoryDto>, Error> {
  Ok(
    db::all_categories(pool)
      .map_err(map_db_error)?
      .into_iter()
      .map(CategoryDto::from)
      .collect()
  )
}

pub(super) fn category_or_404(pool: &Pool, id: i64) -> Result<CategoryDto, Error> {
  db::category_by_id(pool, id)
    .map_err(map_db_error)?
    .map(CategoryDto::from)
    .ok_or_else(|| Error::NotFound(String::from("分类不存在")))
}

pub async fn categories(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  Ok(HttpResponse::Ok().json(category_list(&app_state.pool)?))
}

pub async fn create_category(
  app_state: web::Data<AppState>,
  _manager: Manager,
  body: web::Json<CategoryRequest>
) -> Result<HttpResponse, Error> {
  let body = validated(body)?;
  let category = content::create_category(&app_state.pool, body.into())?;
  Ok(HttpResponse::Created().json(CategoryDto::from(category)))
}

pub async fn update_category(
  app_state: web::Data<AppState>,
  _manager: Manager,
  path: web::Path<(i64,)>,
  body: web::Json<CategoryUpdateRequest>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  let body = validated(body)?;
  let category = content::update_category(&app_state.pool, id, body.into())?;
  Ok(HttpResponse::Ok().json(CategoryDto::from(category)))
}

// Refused with a 400 while articles still use the category.
pub async fn delete_category(
  app_state: web::Data<AppState>,
  _manager: Manager,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  content::delete_category(&app_state.pool, id)?;
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "分类已删除", id)
  ))
}
