use color_eyre::Result;
use eyre::eyre;
use handlebars::Handlebars;
use log::{error, info};
use serde::Serialize;
use crate::config::SiteInfo;
use crate::db::{self, Pool};
use crate::db::entities::Subscriber;
use crate::utils::text_utils::normalize_email;
use crate::utils::time_utils::{current_timestamp, timestamp_to_date_string, DateFormat};
pub mod mailer;
use mailer::{Mailer, OutgoingEmail};

const WELCOME_TEMPLATE: &'static str = "welcome";

// Outcomes of a subscription request. The state is just the
// is_active flag of the (unique) row for the email:
// - no row => insert + welcome email
// - inactive row => reactivate, no email
// - active row => nothing to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeOutcome {
  Subscribed,
  Reactivated,
  AlreadySubscribed
}

#[derive(Serialize)]
struct WelcomeData<'a> {
  site: &'a SiteInfo,
  email: &'a str,
  subscribed_on: String
}

pub struct NewsletterService {
  mailer: Box<dyn Mailer>,
  templates: Handlebars<'static>,
  site_info: SiteInfo
}

impl NewsletterService {

  pub fn new(mailer: Box<dyn Mailer>, site_info: SiteInfo) -> Result<Self> {
    let mut templates = Handlebars::new();
    templates.set_strict_mode(true);
    templates
      .register_template_string(
        WELCOME_TEMPLATE,
        include_str!("../../templates/welcome.hbs")
      )
      .map_err(|e| eyre!("Invalid welcome email template: {}", e))?;
    Ok(Self {
      mailer,
      templates,
      site_info
    })
  }

  pub async fn subscribe(&self, pool: &Pool, email: &str) -> Result<SubscribeOutcome> {
    let email = normalize_email(email);
    let now = current_timestamp();
    match db::subscriber_by_email(pool, &email)? {
      Some(existing) if existing.is_active => Ok(SubscribeOutcome::AlreadySubscribed),
      Some(existing) => {
        db::set_subscriber_active(pool, existing.id, true, now)?;
        info!("Reactivated newsletter subscriber {}", existing.id);
        Ok(SubscribeOutcome::Reactivated)
      },
      None => {
        let mut subscriber = Subscriber {
          id: -1,
          email: email.clone(),
          is_active: true,
          subscribed_at: now,
          unsubscribed_at: None
        };
        match db::insert_subscriber(pool, &mut subscriber) {
          Ok(()) => {},
          // Somebody subscribed the same address between our
          // lookup and the insert, and that somebody already
          // got the welcome email.
          Err(e) if db::is_unique_violation(&e, "newsletter_subscribers.email") => {
            return Ok(SubscribeOutcome::AlreadySubscribed);
          },
          Err(e) => return Err(e)
        }
        info!("New newsletter subscriber {}", subscriber.id);
        // Only this transition sends anything, and a failed
        // send doesn't undo the subscription.
        if let Err(e) = self.send_welcome(&email, now).await {
          error!("Could not send welcome email to subscriber {} - {}", subscriber.id, e);
        }
        Ok(SubscribeOutcome::Subscribed)
      }
    }
  }

  // Returns false when the email isn't subscribed at all.
  pub async fn unsubscribe(&self, pool: &Pool, email: &str) -> Result<bool> {
    let email = normalize_email(email);
    match db::subscriber_by_email(pool, &email)? {
      Some(existing) => {
        if existing.is_active {
          db::set_subscriber_active(pool, existing.id, false, current_timestamp())?;
          info!("Newsletter subscriber {} unsubscribed", existing.id);
        }
        Ok(true)
      },
      None => Ok(false)
    }
  }

  fn render_welcome(&self, email: &str, subscribed_at: i64) -> Result<String> {
    let data = WelcomeData {
      site: &self.site_info,
      email,
      subscribed_on: timestamp_to_date_string(subscribed_at, DateFormat::USCompact)
    };
    self.templates.render(WELCOME_TEMPLATE, &data)
      .map_err(|e| eyre!("Rendering welcome email: {}", e))
  }

  async fn send_welcome(&self, email: &str, subscribed_at: i64) -> Result<()> {
    let html = self.render_welcome(email, subscribed_at)?;
    self.mailer.send(&OutgoingEmail {
      to: email.to_string(),
      subject: format!("欢迎订阅 {}", self.site_info.title),
      html
    }).await
  }

}
