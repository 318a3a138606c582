// Password hashing and bearer tokens. The HTTP side of
// authentication (reading headers, loading the user) lives in
// app::extractors, this module doesn't know about actix.

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{Duration, Utc};
use color_eyre::Result;
use eyre::eyre;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use crate::db::entities::{Role, User};

/// Hashes a password with Argon2id, returns the PHC string that
/// goes in `users.password_hash`.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| eyre!("Failed to hash password: {}", e))?;
  Ok(hash.to_string())
}

/// `Ok(false)` on mismatch, `Err` only when the stored hash is
/// malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
  let parsed = PasswordHash::new(hash)
    .map_err(|e| eyre!("Invalid password hash in database: {}", e))?;
  Ok(Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  // User id, as a string like RFC 7519 wants.
  pub sub: String,
  pub email: String,
  pub role: Role,
  pub iat: i64,
  pub exp: i64
}

impl Claims {
  pub fn user_id(&self) -> Option<i64> {
    self.sub.parse().ok()
  }
}

pub struct TokenService {
  encoding_key: EncodingKey,
  decoding_key: DecodingKey,
  validation: Validation,
  expiration: Duration
}

impl TokenService {

  pub fn new(secret: &str, expiration_hours: i64) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    // No clock skew allowance, tokens last days anyway.
    validation.leeway = 0;
    Self {
      encoding_key: EncodingKey::from_secret(secret.as_bytes()),
      decoding_key: DecodingKey::from_secret(secret.as_bytes()),
      validation,
      expiration: Duration::hours(expiration_hours)
    }
  }

  pub fn issue(&self, user: &User) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub: user.id.to_string(),
      email: user.email.clone(),
      role: user.role,
      iat: now.timestamp(),
      exp: (now + self.expiration).timestamp()
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
      .map_err(|e| eyre!("Could not sign token: {}", e))
  }

  // Expired, badly signed and malformed tokens all end up as
  // errors, the caller turns any of them into a 401.
  pub fn verify(&self, token: &str) -> Result<Claims> {
    decode::<Claims>(token, &self.decoding_key, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| eyre!("Invalid token: {}", e))
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  fn user() -> User {
    User {
      id: 42,
      email: "a@example.com".to_string(),
      password_hash: String::new(),
      display_name: "A".to_string(),
      avatar_url: None,
      bio: None,
      role: Role::Admin,
      created_at: 0,
      updated_at: 0
    }
  }

  #[test]
  fn password_hash_verifies() {
    let hash = hash_password("s3cret-password").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(verify_password("s3cret-password", &hash).unwrap());
    assert!(!verify_password("wrong", &hash).unwrap());
  }

  #[test]
  fn malformed_hash_is_an_error() {
    assert!(verify_password("x", "not-a-hash").is_err());
  }

  #[test]
  fn issued_token_verifies_with_same_secret() {
    let service = TokenService::new("a-long-enough-test-secret", 1);
    let token = service.issue(&user()).unwrap();
    let claims = service.verify(&token).unwrap();
    assert_eq!(Some(42), claims.user_id());
    assert_eq!(Role::Admin, claims.role);
  }

  #[test]
  fn token_from_other_secret_is_refused() {
    let token = TokenService::new("a-long-enough-test-secret", 1).issue(&user()).unwrap();
    let other = TokenService::new("another-long-enough-secret", 1);
    assert!(other.verify(&token).is_err());
  }

  #[test]
  fn expired_token_is_refused() {
    let service = TokenService::new("a-long-enough-test-secret", -1);
    let token = service.issue(&user()).unwrap();
    assert!(service.verify(&token).is_err());
  }
}
