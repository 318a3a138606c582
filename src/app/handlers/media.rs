use actix_web::{web, HttpResponse};
use log::info;
use crate::db;
use crate::utils::time_utils::current_timestamp;
use super::super::dtos::*;
use super::super::error::{map_db_error, Error};
use super::super::extractors::Manager;
use super::super::helpers::page_params;
use super::super::AppState;
use super::validated;

// "image" and "image/" both mean every image type.
fn mime_prefix(mime_type: Option<String>) -> Option<String> {
  mime_type
    .map(|m| m.trim().to_lowercase())
    .filter(|m| !m.is_empty())
    .map(|m| if m.contains('/') { m } else { format!("{}/", m) })
}

pub async fn media_list(
  app_state: web::Data<AppState>,
  _manager: Manager,
  query: web::Query<MediaQuery>
) -> Result<HttpResponse, Error> {
  let query = query.into_inner();
  let prefix = mime_prefix(query.mime_type);
  let (page, per_page, offset) = page_params(query.page, query.per_page);
  let total = db::media_count(&app_state.pool, prefix.as_deref())
    .map_err(map_db_error)?;
  let items: Vec<MediaDto> = db::media_page(&app_state.pool, prefix.as_deref(), offset, per_page)
    .map_err(map_db_error)?
    .into_iter()
    .map(MediaDto::from)
    .collect();
  Ok(HttpResponse::Ok().json(Paginated::new(items, total, page, per_page)))
}

pub async fn create_media(
  app_state: web::Data<AppState>,
  manager: Manager,
  body: web::Json<MediaRequest>
) -> Result<HttpResponse, Error> {
  let body = validated(body)?;
  let uploaded_by = manager.author_id(&app_state.pool)?;
  let mut media = body.into_media(uploaded_by, current_timestamp());
  db::insert_media(&app_state.pool, &mut media).map_err(map_db_error)?;
  info!("Registered media {} ({})", media.id, media.mime_type);
  Ok(HttpResponse::Created().json(MediaDto::from(media)))
}

// Only forgets the record, the file lives in object storage.
pub async fn delete_media(
  app_state: web::Data<AppState>,
  _manager: Manager,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  if db::delete_media(&app_state.pool, id).map_err(map_db_error)? {
    Ok(HttpResponse::Ok().json(
      JsonStatus::new_with_id(JsonStatusType::Success, "文件已删除", id)
    ))
  } else {
    Err(Error::NotFound(String::from("文件不存在")))
  }
}
