use color_eyre::Result;
use dotenv::dotenv;
use std::env;
use ai_news_cms::app;

#[actix_web::main]
async fn main() -> Result<()> {
  dotenv().ok();
  // Log everything at info level when RUST_LOG isn't
  // set, actix's access logs included.
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info");
  }
  env_logger::init();
  color_eyre::install()?;

  app::run().await
}
