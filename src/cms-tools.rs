use std::env;
use color_eyre::Result;
use eyre::eyre;
use dotenv::dotenv;
use log::info;
use getopts::Options;
use ai_news_cms::config::Config;
use ai_news_cms::db::{self, entities::Role};
use ai_news_cms::scraper::translate::LlmTranslator;
use ai_news_cms::scraper::{ScraperService, ScraperSettings};
use ai_news_cms::utils::text_utils::normalize_email;

// Copy pasted this from getopts doc.
fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} -t OPERATION [options]\n\n\
    Operations:\n  \
    migrate         Create the database tables\n  \
    scrape          Run the tools scraper once (for cron)\n  \
    promote-admin   Give the admin role to the user given with -e", program);
  print!("{}", opts.usage(&brief));
}

/**
 * Maintenance operations that don't belong in the API.
 */
fn main() -> Result<()> {
  dotenv().ok();
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  color_eyre::install()?;

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();
  let mut opts = Options::new();
  opts.optopt("t", "task", "Maintenance task to run", "OPERATION");
  opts.optopt("e", "email", "User email for promote-admin", "EMAIL");
  opts.optflag("h", "help", "Program usage");
  let opt_matches = opts.parse(&args[1..])?;
  let operation = match opt_matches.opt_str("t") {
    Some(operation) if !opt_matches.opt_present("h") => operation,
    _ => {
      print_usage(&program, opts);
      return Ok(());
    }
  };

  let config = Config::from_env()?;
  let pool = db::open_pool(&config.db_path)?;
  db::migrate(&pool)?;

  match operation.as_str() {
    "migrate" => info!("Database schema is up to date"),
    "scrape" => {
      let translator = LlmTranslator::new(
        &config.llm_api_url,
        &config.llm_api_key,
        &config.llm_model
      )?;
      let scraper = ScraperService::new(Box::new(translator), ScraperSettings::from(&config))?;
      let runtime = tokio::runtime::Runtime::new()?;
      let report = runtime
        .block_on(scraper.run(&pool))
        .map_err(|e| eyre!("Scraper run failed: {}", e))?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    },
    "promote-admin" => {
      let email = opt_matches.opt_str("e")
        .ok_or_else(|| eyre!("promote-admin needs an email (-e)"))?;
      let email = normalize_email(&email);
      if db::set_user_role(&pool, &email, Role::Admin)? {
        info!("{} is now an admin", email);
      } else {
        return Err(eyre!("No user with email {}", email));
      }
    },
    _ => return Err(eyre!("Unknown operation: {}", operation))
  }
  Ok(())
}
