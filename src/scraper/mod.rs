// Pulls AI tools off a public listing page, has them
// translated to Chinese by an LLM and publishes each one as an
// article. Runs from the CLI (cron) or the functions endpoint.

use derive_more::Display;
use eyre::Report;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::atomic::{self, AtomicBool};
use std::time::Duration;
use crate::config::Config;
use crate::content::articles::{create_article, NewArticle};
use crate::content::categorize::categorize;
use crate::db::{self, Pool};
use crate::db::entities::ArticleStatus;
use crate::utils::text_utils::{escape_html, truncate_utf8};
pub mod extract;
pub mod translate;
use extract::{extract_tools, ExtractionStrategy, ToolEntry};
use translate::{TranslatedEntry, Translator};

const FETCH_TIMEOUT_SECS: u64 = 30;
const SEO_DESCRIPTION_LENGTH: usize = 160;
const EXCERPT_LENGTH: usize = 500;

#[derive(Debug, Display)]
pub enum ScrapeError {
  #[display(fmt = "A scraper run is already in progress")]
  AlreadyRunning,
  #[display(fmt = "The translation API is not configured")]
  NotConfigured,
  #[display(fmt = "No admin user to publish the articles as")]
  NoAuthor,
  #[display(fmt = "Could not fetch the source page: {}", _0)]
  Fetch(String),
  #[display(fmt = "Database error: {}", _0)]
  Database(Report)
}

impl std::error::Error for ScrapeError {}

impl From<Report> for ScrapeError {
  fn from(report: Report) -> Self {
    ScrapeError::Database(report)
  }
}

impl From<reqwest::Error> for ScrapeError {
  fn from(error: reqwest::Error) -> Self {
    ScrapeError::Fetch(error.to_string())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
  Inserted,
  Duplicate,
  Failed
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
  pub name: String,
  pub status: ItemStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub article_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slug: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>
}

impl ItemReport {
  fn new(name: &str, status: ItemStatus) -> Self {
    Self {
      name: name.to_string(),
      status,
      article_id: None,
      slug: None,
      error: None
    }
  }
}

// What gets sent back to whoever triggered the run.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
  pub source_url: String,
  pub strategy: ExtractionStrategy,
  pub extracted: usize,
  pub translated: usize,
  pub inserted: usize,
  pub duplicates: usize,
  pub failed: usize,
  pub items: Vec<ItemReport>
}

impl ScrapeReport {
  fn record(&mut self, item: ItemReport) {
    match item.status {
      ItemStatus::Inserted => self.inserted += 1,
      ItemStatus::Duplicate => self.duplicates += 1,
      ItemStatus::Failed => self.failed += 1
    }
    self.items.push(item);
  }
}

#[derive(Debug, Clone)]
pub struct ScraperSettings {
  pub source_url: String,
  pub max_items: usize,
  // Pause between two translation calls, the LLM APIs rate
  // limit aggressively.
  pub delay: Duration
}

impl From<&Config> for ScraperSettings {
  fn from(config: &Config) -> Self {
    Self {
      source_url: config.scraper_source_url.clone(),
      max_items: config.scraper_max_items,
      delay: Duration::from_millis(config.scraper_delay_ms)
    }
  }
}

pub struct ScraperService {
  client: reqwest::Client,
  translator: Box<dyn Translator>,
  settings: ScraperSettings,
  is_running: AtomicBool
}

impl ScraperService {

  pub fn new(
    translator: Box<dyn Translator>,
    settings: ScraperSettings
  ) -> color_eyre::Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
      .user_agent(concat!("ai-news-cms/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self {
      client,
      translator,
      settings,
      is_running: AtomicBool::new(false)
    })
  }

  pub fn is_running(&self) -> bool {
    self.is_running.load(atomic::Ordering::SeqCst)
  }

  // Fetch the page and process it, one run at a time.
  pub async fn run(&self, pool: &Pool) -> Result<ScrapeReport, ScrapeError> {
    if !self.translator.is_configured() {
      return Err(ScrapeError::NotConfigured);
    }
    if self.check_lock_set_if_unlocked() {
      warn!("A scraper run was attempted while another one is in progress");
      return Err(ScrapeError::AlreadyRunning);
    }
    // Dropped with this future, so a caller giving up halfway
    // (client disconnect, timeout) still frees the scraper.
    let _lock = RunLock(&self.is_running);
    let result = self.run_no_lock(pool).await;
    match &result {
      Ok(report) => info!(
        "Scraper run done: {} extracted, {} inserted, {} duplicates, {} failed",
        report.extracted, report.inserted, report.duplicates, report.failed
      ),
      Err(e) => error!("Scraper run failed: {}", e)
    }
    result
  }

  async fn run_no_lock(&self, pool: &Pool) -> Result<ScrapeReport, ScrapeError> {
    info!("Fetching {}", self.settings.source_url);
    let html = self.client
      .get(&self.settings.source_url)
      .send()
      .await?
      .error_for_status()?
      .text()
      .await?;
    self.process_html(pool, &html).await
  }

  // Everything after the fetch, separate so it can be fed a
  // page from anywhere.
  pub async fn process_html(
    &self,
    pool: &Pool,
    html: &str
  ) -> Result<ScrapeReport, ScrapeError> {
    let author_id = db::first_admin_id(pool)?
      .ok_or(ScrapeError::NoAuthor)?;
    let categories = db::all_categories(pool)?;
    let (entries, strategy) = extract_tools(
      html,
      &self.settings.source_url,
      self.settings.max_items
    );
    info!("Extracted {} tools using the {:?} strategy", entries.len(), strategy);

    let mut report = ScrapeReport {
      source_url: self.settings.source_url.clone(),
      strategy,
      extracted: entries.len(),
      translated: 0,
      inserted: 0,
      duplicates: 0,
      failed: 0,
      items: Vec::with_capacity(entries.len())
    };

    for (index, entry) in entries.iter().enumerate() {
      if index > 0 && !self.settings.delay.is_zero() {
        tokio::time::sleep(self.settings.delay).await;
      }
      let translated = match self.translator.translate(entry).await {
        Ok(t) => t,
        Err(e) => {
          warn!("Translation failed for {}: {}", entry.name, e);
          let mut item = ItemReport::new(&entry.name, ItemStatus::Failed);
          item.error = Some(e.to_string());
          report.record(item);
          continue;
        }
      };
      report.translated += 1;
      let item = publish_entry(pool, author_id, &categories, entry, translated);
      report.record(item);
    }
    Ok(report)
  }

  // Returns false if no run was in progress, but one is now.
  // Returns true if it was already locked.
  fn check_lock_set_if_unlocked(&self) -> bool {
    self.is_running.compare_exchange(
      false,
      true,
      atomic::Ordering::SeqCst,
      atomic::Ordering::Acquire
    ).is_err()
  }

}

struct RunLock<'a>(&'a AtomicBool);

impl Drop for RunLock<'_> {
  fn drop(&mut self) {
    self.0.store(false, atomic::Ordering::SeqCst);
  }
}

fn article_body(translated: &TranslatedEntry, entry: &ToolEntry) -> String {
  match &entry.url {
    Some(url) => format!(
      "{}\n<p><a href=\"{}\" target=\"_blank\" rel=\"noopener\">访问官网</a></p>",
      translated.content,
      escape_html(url)
    ),
    None => translated.content.clone()
  }
}

fn publish_entry(
  pool: &Pool,
  author_id: i64,
  categories: &[db::entities::Category],
  entry: &ToolEntry,
  translated: TranslatedEntry
) -> ItemReport {
  let title = translated.title.trim().to_string();
  let text = format!(
    "{} {} {} {}",
    title, translated.description, entry.name, entry.description
  );
  let category_id = categorize(&text, categories);

  match db::article_exists_with_title(pool, &title, category_id) {
    Ok(true) => {
      info!("Skipping {}, already published", title);
      return ItemReport::new(&entry.name, ItemStatus::Duplicate);
    },
    Ok(false) => {},
    Err(e) => {
      warn!("Duplicate check failed for {}: {}", title, e);
      let mut item = ItemReport::new(&entry.name, ItemStatus::Failed);
      item.error = Some(e.to_string());
      return item;
    }
  }

  let mut excerpt = translated.description.trim().to_string();
  truncate_utf8(&mut excerpt, EXCERPT_LENGTH);
  let mut seo_description = excerpt.clone();
  truncate_utf8(&mut seo_description, SEO_DESCRIPTION_LENGTH);
  let input = NewArticle {
    // The original name makes a better slug than the Chinese
    // title, which slugify would mostly throw away.
    slug: Some(entry.name.clone()),
    content: article_body(&translated, entry),
    excerpt: Some(excerpt),
    seo_description: Some(seo_description),
    seo_keywords: Some(format!("{},AI工具", entry.name)),
    status: Some(ArticleStatus::Published),
    category_id,
    title,
    ..Default::default()
  };
  match create_article(pool, author_id, input) {
    Ok(article) => {
      let mut item = ItemReport::new(&entry.name, ItemStatus::Inserted);
      item.article_id = Some(article.id);
      item.slug = Some(article.slug);
      item
    },
    Err(e) => {
      warn!("Could not publish {}: {}", entry.name, e);
      let mut item = ItemReport::new(&entry.name, ItemStatus::Failed);
      item.error = Some(e.to_string());
      item
    }
  }
}
