use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::warn;
use crate::db::{self, Pool};
use crate::db::entities::{Role, User};
use super::error::{map_db_error, Error};
use super::helpers::{bearer_token, header_value, API_KEY_HEADER};
use super::AppState;

// Handlers ask for one of these as an argument and actix
// runs the check before the handler. Everything here is
// synchronous so the futures are ready right away.

/// Any logged in user. The user is reloaded from the database
/// on every request so a deleted account or a role change
/// takes effect immediately, whatever the token says.
pub struct AuthUser(pub User);

/// Who is allowed on the management endpoints: an admin, or
/// an automation tool holding the static API key.
pub enum Manager {
  Admin(User),
  ApiKey
}

impl Manager {
  // Articles created through the API key are credited to the
  // first admin.
  pub fn author_id(&self, pool: &Pool) -> Result<i64, Error> {
    match self {
      Manager::Admin(user) => Ok(user.id),
      Manager::ApiKey => db::first_admin_id(pool)
        .map_err(map_db_error)?
        .ok_or_else(|| Error::BadRequest(String::from("没有管理员账号，无法创建内容")))
    }
  }
}

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, Error> {
  req.app_data::<web::Data<AppState>>()
    .ok_or_else(|| Error::InternalServerError(String::from("Application state is missing")))
}

fn authenticate(req: &HttpRequest) -> Result<User, Error> {
  let state = app_state(req)?;
  let token = bearer_token(req)
    .ok_or_else(|| Error::Unauthorized(String::from("请先登录")))?;
  let claims = state.tokens.verify(&token).map_err(|e| {
    warn!("Rejected token on {}: {}", req.path(), e);
    Error::Unauthorized(String::from("登录已过期，请重新登录"))
  })?;
  let user_id = claims.user_id()
    .ok_or_else(|| Error::Unauthorized(String::from("登录已过期，请重新登录")))?;
  db::user_by_id(&state.pool, user_id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::Unauthorized(String::from("用户不存在")))
}

fn require_admin(user: User) -> Result<User, Error> {
  if user.role == Role::Admin {
    Ok(user)
  } else {
    warn!("User {} tried to reach an admin endpoint", user.id);
    Err(Error::Forbidden(String::from("需要管理员权限")))
  }
}

fn manager(req: &HttpRequest) -> Result<Manager, Error> {
  let state = app_state(req)?;
  if let Some(key) = header_value(req, API_KEY_HEADER) {
    // An empty configured key disables the header entirely.
    if !state.api_key.is_empty() && key == state.api_key {
      return Ok(Manager::ApiKey);
    }
    warn!("Invalid API key used on {}", req.path());
    return Err(Error::Unauthorized(String::from("API密钥无效")));
  }
  authenticate(req)
    .and_then(require_admin)
    .map(Manager::Admin)
}

impl FromRequest for AuthUser {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    ready(authenticate(req).map(AuthUser))
  }
}

impl FromRequest for Manager {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    ready(manager(req))
  }
}
