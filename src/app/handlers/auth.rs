use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde_json::json;
use crate::auth::{hash_password, verify_password};
use crate::db;
use crate::db::entities::{Role, User};
use crate::utils::serde_utils::empty_string_to_none;
use crate::utils::text_utils::normalize_email;
use crate::utils::time_utils::current_timestamp;
use super::super::dtos::*;
use super::super::error::{map_db_error, map_internal_error, Error};
use super::super::extractors::AuthUser;
use super::super::AppState;
use super::{check_rate_limit, validated};

const DUPLICATE_EMAIL: &'static str = "该邮箱已被注册";
const BAD_CREDENTIALS: &'static str = "邮箱或密码错误";

fn auth_response(app_state: &AppState, user: User) -> Result<AuthResponse, Error> {
  let token = app_state.tokens.issue(&user).map_err(map_internal_error)?;
  Ok(AuthResponse {
    token,
    user: user.into()
  })
}

pub async fn register(
  app_state: web::Data<AppState>,
  body: web::Json<RegisterRequest>
) -> Result<HttpResponse, Error> {
  check_rate_limit(&app_state)?;
  let body = validated(body)?;
  let email = normalize_email(&body.email);
  if db::user_by_email(&app_state.pool, &email).map_err(map_db_error)?.is_some() {
    return Err(Error::BadRequest(String::from(DUPLICATE_EMAIL)));
  }
  let now = current_timestamp();
  let mut user = User {
    id: -1,
    email,
    password_hash: hash_password(&body.password).map_err(map_internal_error)?,
    display_name: body.display_name.trim().to_string(),
    avatar_url: None,
    bio: None,
    role: Role::User,
    created_at: now,
    updated_at: now
  };
  // The lookup above can lose a race, the UNIQUE constraint
  // can't.
  match db::insert_user(&app_state.pool, &mut user) {
    Ok(()) => {},
    Err(e) if db::is_unique_violation(&e, "users.email") =>
      return Err(Error::BadRequest(String::from(DUPLICATE_EMAIL))),
    Err(e) => return Err(map_db_error(e))
  }
  info!("New user registered: {}", user.id);
  Ok(HttpResponse::Created().json(auth_response(&app_state, user)?))
}

pub async fn login(
  app_state: web::Data<AppState>,
  body: web::Json<LoginRequest>
) -> Result<HttpResponse, Error> {
  check_rate_limit(&app_state)?;
  let body = validated(body)?;
  let email = normalize_email(&body.email);
  let user = db::user_by_email(&app_state.pool, &email)
    .map_err(map_db_error)?;
  // Same answer for unknown email and wrong password.
  let user = match user {
    Some(user) if verify_password(&body.password, &user.password_hash)
      .map_err(map_internal_error)? => user,
    _ => {
      warn!("Failed login attempt for {}", email);
      return Err(Error::Unauthorized(String::from(BAD_CREDENTIALS)));
    }
  };
  Ok(HttpResponse::Ok().json(auth_response(&app_state, user)?))
}

pub async fn profile(AuthUser(user): AuthUser) -> HttpResponse {
  HttpResponse::Ok().json(UserDto::from(user))
}

pub async fn update_profile(
  app_state: web::Data<AppState>,
  AuthUser(user): AuthUser,
  body: web::Json<ProfileRequest>
) -> Result<HttpResponse, Error> {
  let body = validated(body)?;
  let avatar_url = empty_string_to_none(body.avatar_url);
  let bio = empty_string_to_none(body.bio);
  db::update_profile(
    &app_state.pool,
    user.id,
    body.display_name.trim(),
    avatar_url.as_deref(),
    bio.as_deref()
  ).map_err(map_db_error)?;
  let updated = db::user_by_id(&app_state.pool, user.id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound(String::from("用户不存在")))?;
  Ok(HttpResponse::Ok().json(UserDto::from(updated)))
}

pub async fn change_password(
  app_state: web::Data<AppState>,
  AuthUser(user): AuthUser,
  body: web::Json<ChangePasswordRequest>
) -> Result<HttpResponse, Error> {
  check_rate_limit(&app_state)?;
  let body = validated(body)?;
  if body.new_password == body.current_password {
    return Err(Error::BadRequest(String::from("新密码不能与当前密码相同")));
  }
  if !verify_password(&body.current_password, &user.password_hash)
    .map_err(map_internal_error)? {
    warn!("Wrong current password given by user {}", user.id);
    return Err(Error::BadRequest(String::from("当前密码错误")));
  }
  let hash = hash_password(&body.new_password).map_err(map_internal_error)?;
  db::update_password_hash(&app_state.pool, user.id, &hash)
    .map_err(map_db_error)?;
  info!("User {} changed their password", user.id);
  Ok(HttpResponse::Ok().json(JsonStatus::new(JsonStatusType::Success, "密码已更新")))
}

pub async fn verify(AuthUser(user): AuthUser) -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "valid": true,
    "user": UserDto::from(user)
  }))
}
