// Adding the context method to errors:
use eyre::{WrapErr, eyre};
use color_eyre::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  // "production" hides internal error messages from
  // API responses, anything else shows them.
  pub environment: String,
  pub cors_origin: String,
  // Token settings:
  pub jwt_secret: String,
  pub jwt_expiration_hours: i64,
  // Static key for the workflow automation endpoints,
  // empty string disables it.
  pub api_key: String,
  // Rate limiter settings:
  pub rl_max_requests: u32,
  pub rl_max_requests_time: u32,
  pub rl_block_duration: u32,
  // Transactional email (newsletter welcome message):
  pub mail_api_url: String,
  pub mail_api_key: String,
  pub mail_from: String,
  // Used in emails and to build absolute links:
  pub site_title: String,
  pub site_root: String,
  // Scraper and translation settings:
  pub scraper_source_url: String,
  pub scraper_max_items: usize,
  pub scraper_delay_ms: u64,
  pub llm_api_url: String,
  pub llm_api_key: String,
  pub llm_model: String
}

// Same idea as the old blog: templates get this instead
// of the whole config because there are secrets in there.
#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
  pub title: String,
  pub root: String
}

impl From<&Config> for SiteInfo {
  fn from(config: &Config) -> Self {
    Self {
      title: config.site_title.clone(),
      root: config.site_root.clone()
    }
  }
}

impl Config {

  pub fn from_env() -> Result<Config> {
    // RUST_LOG is already set in main.rs if it
    // was absent.
    // Keys are lowercase here when compared to what's
    // in the .env file.
    let c = config::Config::builder()
      .set_default("db_path", "./cms.sqlite")?
      .set_default("bind_address", "127.0.0.1:8080")?
      .set_default("environment", "production")?
      .set_default("cors_origin", "")?
      .set_default("jwt_secret", "")?
      // One week:
      .set_default("jwt_expiration_hours", 168)?
      .set_default("api_key", "")?
      .set_default("rl_max_requests", 30)?
      .set_default("rl_max_requests_time", 60)?
      .set_default("rl_block_duration", 60)?
      .set_default("mail_api_url", "https://api.resend.com/emails")?
      .set_default("mail_api_key", "")?
      .set_default("mail_from", "AI News <newsletter@example.com>")?
      .set_default("site_title", "AI News")?
      // Should never have a trailing slash.
      .set_default("site_root", "http://localhost:5173")?
      .set_default("scraper_source_url", "https://www.futuretools.io/")?
      .set_default("scraper_max_items", 10)?
      .set_default("scraper_delay_ms", 1000)?
      .set_default("llm_api_url", "https://api.openai.com/v1/chat/completions")?
      .set_default("llm_api_key", "")?
      .set_default("llm_model", "gpt-4o-mini")?
      .add_source(config::Environment::default().try_parsing(true))
      .build()
      .context("Reading configuration sources")?;

    // The error has to be given a context for
    // color_eyre to work here:
    let config: Config = c.try_deserialize()
      .context("Loading configuration from env")?;
    config.check()?;
    Ok(config)
  }

  // Refusing to start with an empty secret, tokens signed
  // with it would be forgeable by anyone.
  fn check(&self) -> Result<()> {
    if self.jwt_secret.trim().len() < 16 {
      return Err(eyre!("JWT_SECRET is missing or shorter than 16 characters"));
    }
    if self.site_root.ends_with('/') {
      return Err(eyre!("SITE_ROOT must not end with a slash"));
    }
    Ok(())
  }

  pub fn is_production(&self) -> bool {
    self.environment.eq_ignore_ascii_case("production")
  }

}

#[cfg(test)]
impl Config {
  // Config used by tests all over the crate, never reads the
  // environment.
  pub fn for_tests(db_path: &str) -> Self {
    Self {
      db_path: db_path.to_string(),
      bind_address: "127.0.0.1:0".to_string(),
      environment: "development".to_string(),
      cors_origin: String::new(),
      jwt_secret: "test-secret-that-is-long-enough".to_string(),
      jwt_expiration_hours: 1,
      api_key: "test-api-key".to_string(),
      rl_max_requests: 1000,
      rl_max_requests_time: 60,
      rl_block_duration: 60,
      mail_api_url: String::new(),
      mail_api_key: String::new(),
      mail_from: "AI News <newsletter@example.com>".to_string(),
      site_title: "AI News".to_string(),
      site_root: "http://localhost".to_string(),
      scraper_source_url: "http://localhost/tools".to_string(),
      scraper_max_items: 10,
      scraper_delay_ms: 0,
      llm_api_url: String::new(),
      llm_api_key: String::new(),
      llm_model: "test-model".to_string()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_secret_is_refused() {
    let mut config = Config::for_tests("unused");
    config.jwt_secret = "short".to_string();
    assert!(config.check().is_err());
  }

  #[test]
  fn trailing_slash_in_site_root_is_refused() {
    let mut config = Config::for_tests("unused");
    config.site_root = "https://example.com/".to_string();
    assert!(config.check().is_err());
  }

  #[test]
  fn site_info_only_carries_public_fields() {
    let config = Config::for_tests("unused");
    let info = SiteInfo::from(&config);
    assert_eq!("AI News", info.title);
    assert_eq!("http://localhost", info.root);
  }
}
