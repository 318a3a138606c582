use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpServer};
use color_eyre::Result;
use eyre::WrapErr;
use log::{debug, error, info, warn};
use rate_limiter::BasicRateLimiter;
use std::sync::RwLock;
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::auth::TokenService;
use crate::config::{Config, SiteInfo};
use crate::db::{self, Pool};
use crate::newsletter::mailer::{HttpMailer, LogMailer, Mailer};
use crate::newsletter::NewsletterService;
use crate::scraper::translate::{LlmTranslator, Translator};
use crate::scraper::{ScraperService, ScraperSettings};
use error::Error;
use handlers::*;
mod handlers;
mod dtos;
mod error;
mod extractors;
mod helpers;
mod rate_limiter;
mod guards;

// Article bodies can get long, the default JSON limit is a
// bit short for them.
const JSON_LIMIT: usize = 4 * 1024 * 1024;

// Declare app state struct:
pub struct AppState {
  pub pool: Pool,
  pub tokens: TokenService,
  pub newsletter: NewsletterService,
  pub scraper: ScraperService,
  pub rate_limiter: RwLock<BasicRateLimiter>,
  pub site_info: SiteInfo,
  // Empty means the x-api-key header is refused.
  pub api_key: String
}

impl AppState {

  pub fn new(
    config: &Config,
    pool: Pool,
    mailer: Box<dyn Mailer>,
    translator: Box<dyn Translator>
  ) -> Result<Self> {
    let site_info = SiteInfo::from(config);
    Ok(Self {
      pool,
      tokens: TokenService::new(&config.jwt_secret, config.jwt_expiration_hours),
      newsletter: NewsletterService::new(mailer, site_info.clone())?,
      scraper: ScraperService::new(translator, ScraperSettings::from(config))?,
      rate_limiter: RwLock::new(
        BasicRateLimiter::new(
          config.rl_max_requests,
          config.rl_max_requests_time,
          config.rl_block_duration
        )
      ),
      site_info,
      api_key: config.api_key.clone()
    })
  }

  // Returns true when the request has to be refused.
  pub fn check_rate_limit(&self) -> bool {
    match self.rate_limiter.write() {
      Ok(mut rl) => {
        let was_locked = rl.is_locked();
        let refused = rl.hit();
        if refused && !was_locked {
          warn!("Rate limit reached, sensitive endpoints are blocked for a while");
        }
        refused
      },
      Err(e) => {
        // I decided to ignore possible weird rate limiter lock
        // errors which should never happen.
        error!("Could not get a write handle on the \
          rate limiter, SHOULD NEVER HAPPEN - {}", e);
        false
      }
    }
  }

}

// Picks the real mail and translation clients, or stand-ins
// that only log when the API keys are missing.
fn external_services(config: &Config) -> Result<(Box<dyn Mailer>, Box<dyn Translator>)> {
  let mailer: Box<dyn Mailer> = if config.mail_api_key.is_empty() {
    warn!("MAIL_API_KEY is not set, emails will only be logged");
    Box::new(LogMailer)
  } else {
    Box::new(HttpMailer::new(&config.mail_api_url, &config.mail_api_key, &config.mail_from)?)
  };
  let translator = LlmTranslator::new(&config.llm_api_url, &config.llm_api_key, &config.llm_model)?;
  if !translator.is_configured() {
    warn!("LLM_API_KEY is not set, the scraper will refuse to run");
  }
  Ok((mailer, Box::new(translator)))
}

fn cors(config: &Config) -> Cors {
  let cors = if config.cors_origin.is_empty() {
    Cors::permissive()
  } else {
    config.cors_origin
      .split(',')
      .map(str::trim)
      .filter(|o| !o.is_empty())
      .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
      .allow_any_method()
      .allowed_headers(vec![
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::HeaderName::from_static(helpers::API_KEY_HEADER)
      ])
  };
  cors.max_age(3600)
}

// Extractor settings, the rejections have to come out as our
// JSON errors too.
fn extractor_config(cfg: &mut web::ServiceConfig) {
  cfg.app_data(
    web::JsonConfig::default()
      .limit(JSON_LIMIT)
      .error_handler(|err, _| {
        Error::BadRequest(format!("请求体格式错误：{}", err)).into()
      })
  )
  .app_data(web::PathConfig::default().error_handler(|_, _| {
    Error::BadRequest(String::from("路径参数无效")).into()
  }))
  .app_data(web::QueryConfig::default().error_handler(|err, _| {
    Error::BadRequest(format!("查询参数无效：{}", err)).into()
  }));
}

// Function to start the server.
pub async fn run() -> Result<()> {
  let config = Config::from_env()?;
  debug!("Current environment: {}", config.environment);
  error::show_internal_errors(!config.is_production());

  let pool = db::open_pool(&config.db_path)?;
  db::migrate(&pool)?;
  let (mailer, translator) = external_services(&config)?;

  let bind_address = config.bind_address.clone();
  let app_state = web::Data::new(AppState::new(&config, pool, mailer, translator)?);

  info!("Starting server on {}", bind_address);
  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      .wrap(cors(&config))
      .wrap(middleware::Logger::default())
      .configure(extractor_config)
      .configure(configure_routes)
      .default_service(web::route().to(not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")
}

// Route configuration:
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
  // Lets the cron job on the server trigger the scraper
  // without credentials. Anyone else falls through to the
  // authenticated route.
  let loopback_guard = guards::IPRestrictedGuard::loopback();

  cfg.route("/", web::get().to(index))
    .service(
      web::scope("/api")
        .route("/articles", web::get().to(articles::published_articles))
        .route("/articles/{slug}", web::get().to(articles::published_article))
        .route("/categories", web::get().to(categories::categories))
        .route("/pages/{slug}", web::get().to(site::page))
        .route("/settings", web::get().to(site::settings))
        .service(
          web::scope("/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .service(
              web::resource("/profile")
                .route(web::get().to(auth::profile))
                .route(web::put().to(auth::update_profile))
            )
            .route("/password", web::put().to(auth::change_password))
            .route("/verify", web::get().to(auth::verify))
        )
        .service(
          web::scope("/admin")
            .service(
              web::resource("/articles")
                .route(web::get().to(articles::admin_articles))
                .route(web::post().to(articles::create_article))
            )
            .service(
              web::resource("/articles/{id}")
                .route(web::get().to(articles::admin_article))
                .route(web::put().to(articles::update_article))
                .route(web::delete().to(articles::delete_article))
            )
            .route("/categories", web::post().to(categories::create_category))
            .service(
              web::resource("/categories/{id}")
                .route(web::put().to(categories::update_category))
                .route(web::delete().to(categories::delete_category))
            )
            .service(
              web::resource("/media")
                .route(web::get().to(media::media_list))
                .route(web::post().to(media::create_media))
            )
            .route("/media/{id}", web::delete().to(media::delete_media))
            .route("/pages", web::get().to(site::admin_pages))
            .route("/pages/{slug}", web::put().to(site::upsert_page))
            .route("/settings", web::put().to(site::update_settings))
            .route("/stats", web::get().to(site::stats))
        )
    )
    .service(
      web::scope("/functions")
        .service(
          web::resource("/article-api")
            .route(web::get().to(functions::article_api_get))
            .route(web::post().to(functions::article_api_post))
            .route(web::put().to(functions::article_api_put))
            .route(web::delete().to(functions::article_api_delete))
        )
        .service(
          web::resource("/categories-api")
            .route(web::get().to(functions::categories_api_get))
            .route(web::post().to(functions::categories_api_post))
            .route(web::put().to(functions::categories_api_put))
            .route(web::delete().to(functions::categories_api_delete))
        )
        .route("/newsletter-subscribe", web::post().to(functions::newsletter_subscribe))
        .route("/newsletter-unsubscribe", web::post().to(functions::newsletter_unsubscribe))
        .service(
          web::resource("/futuretools-scraper")
            .route(web::post().guard(loopback_guard).to(functions::scheduled_scraper))
            .route(web::post().to(functions::scraper))
        )
    );
}

#[cfg(test)]
mod tests;
