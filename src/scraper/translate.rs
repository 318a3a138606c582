use async_trait::async_trait;
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use super::extract::ToolEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedEntry {
  pub title: String,
  pub description: String,
  // HTML body for the article.
  pub content: String
}

#[async_trait]
pub trait Translator: Send + Sync {
  async fn translate(&self, entry: &ToolEntry) -> Result<TranslatedEntry>;

  // Lets the pipeline refuse to start instead of failing
  // every single item.
  fn is_configured(&self) -> bool {
    true
  }
}

const SYSTEM_PROMPT: &'static str = "你是一名专业的科技编辑，负责把英文的AI工具介绍翻译并改写成简体中文。\
只输出一个JSON对象，包含三个字段：title（工具名称，可保留英文原名）、\
description（一句话中文简介）、content（2到4段中文介绍，使用<p>标签的HTML）。";

lazy_static! {
  // Models like to wrap JSON in markdown fences even when
  // asked not to.
  static ref FENCE_REGEX: Regex = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").unwrap();
}

// Chat-completions style API (OpenAI and the many compatible
// ones).
pub struct LlmTranslator {
  client: reqwest::Client,
  api_url: String,
  api_key: String,
  model: String
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessage
}

#[derive(Deserialize)]
struct ChatMessage {
  content: Option<String>
}

impl LlmTranslator {
  pub fn new(api_url: &str, api_key: &str, model: &str) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .context("Building the LLM HTTP client")?;
    Ok(Self {
      client,
      api_url: api_url.to_string(),
      api_key: api_key.to_string(),
      model: model.to_string()
    })
  }
}

#[async_trait]
impl Translator for LlmTranslator {
  async fn translate(&self, entry: &ToolEntry) -> Result<TranslatedEntry> {
    let user_prompt = format!(
      "工具名称：{}\n英文简介：{}\n官网：{}",
      entry.name,
      if entry.description.is_empty() { "（无）" } else { &entry.description },
      entry.url.as_deref().unwrap_or("（无）")
    );
    let body = json!({
      "model": self.model,
      "temperature": 0.3,
      "response_format": { "type": "json_object" },
      "messages": [
        { "role": "system", "content": SYSTEM_PROMPT },
        { "role": "user", "content": user_prompt }
      ]
    });
    let response = self.client
      .post(&self.api_url)
      .bearer_auth(&self.api_key)
      .json(&body)
      .send()
      .await
      .context("Calling the LLM API")?;
    let status = response.status();
    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      return Err(eyre!("LLM API answered {} - {}", status, text));
    }
    let chat: ChatResponse = response.json()
      .await
      .context("Decoding the LLM API response")?;
    let raw = chat.choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .ok_or_else(|| eyre!("LLM API returned no content"))?;
    parse_translation(&raw)
  }

  fn is_configured(&self) -> bool {
    !self.api_key.is_empty() && !self.api_url.is_empty()
  }
}

pub fn parse_translation(raw: &str) -> Result<TranslatedEntry> {
  let json_text = match FENCE_REGEX.captures(raw) {
    Some(caps) => caps[1].to_string(),
    None => raw.trim().to_string()
  };
  let entry: TranslatedEntry = serde_json::from_str(&json_text)
    .context("Translation is not the expected JSON object")?;
  if entry.title.trim().is_empty() || entry.content.trim().is_empty() {
    return Err(eyre!("Translation has an empty title or content"));
  }
  Ok(entry)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_json_is_parsed() {
    let raw = r#"{"title": "写作助手", "description": "简介", "content": "<p>正文</p>"}"#;
    let entry = parse_translation(raw).unwrap();
    assert_eq!("写作助手", entry.title);
    assert_eq!("<p>正文</p>", entry.content);
  }

  #[test]
  fn fenced_json_is_parsed() {
    let raw = "```json\n{\"title\": \"A\", \"description\": \"B\", \"content\": \"C\"}\n```";
    assert_eq!("A", parse_translation(raw).unwrap().title);
  }

  #[test]
  fn empty_title_is_an_error() {
    let raw = r#"{"title": " ", "description": "", "content": "x"}"#;
    assert!(parse_translation(raw).is_err());
  }

  #[test]
  fn garbage_is_an_error() {
    assert!(parse_translation("Sorry, I can't do that").is_err());
  }

  #[test]
  fn missing_key_means_not_configured() {
    let translator = LlmTranslator::new("https://api.example.com", "", "m").unwrap();
    assert!(!translator.is_configured());
  }
}
