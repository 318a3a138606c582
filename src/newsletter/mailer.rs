use async_trait::async_trait;
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use log::info;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
  pub to: String,
  pub subject: String,
  pub html: String
}

// Trait so that tests can count what would have been sent.
#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

// Request body for the transactional email API (Resend's
// format, most of them look like this anyway).
#[derive(Serialize)]
struct SendEmailRequest<'a> {
  from: &'a str,
  to: Vec<&'a str>,
  subject: &'a str,
  html: &'a str
}

pub struct HttpMailer {
  client: reqwest::Client,
  api_url: String,
  api_key: String,
  from: String
}

impl HttpMailer {
  pub fn new(api_url: &str, api_key: &str, from: &str) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .context("Building the mail HTTP client")?;
    Ok(Self {
      client,
      api_url: api_url.to_string(),
      api_key: api_key.to_string(),
      from: from.to_string()
    })
  }
}

#[async_trait]
impl Mailer for HttpMailer {
  async fn send(&self, email: &OutgoingEmail) -> Result<()> {
    let body = SendEmailRequest {
      from: &self.from,
      to: vec![&email.to],
      subject: &email.subject,
      html: &email.html
    };
    let response = self.client
      .post(&self.api_url)
      .bearer_auth(&self.api_key)
      .json(&body)
      .send()
      .await
      .context("Sending email request")?;
    let status = response.status();
    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      return Err(eyre!("Mail API answered {} - {}", status, text));
    }
    info!("Sent \"{}\" to {}", email.subject, email.to);
    Ok(())
  }
}

// Used when no mail API key is configured (local setups).
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
  async fn send(&self, email: &OutgoingEmail) -> Result<()> {
    info!(
      "Mail API not configured, not sending \"{}\" to {}",
      email.subject, email.to
    );
    Ok(())
  }
}
