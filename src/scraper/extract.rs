use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use crate::utils::text_utils::strip_html;

// Best-effort extraction of tool entries out of the listing
// page. The markup isn't ours and changes without notice, so
// there are several strategies from most to least precise.

#[derive(Debug, Clone, PartialEq)]
pub struct ToolEntry {
  pub name: String,
  pub description: String,
  pub url: Option<String>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
  ToolCards,
  ToolLinks,
  Headings,
  Placeholder
}

const MAX_NAME_LENGTH: usize = 100;

lazy_static! {
  // Link tag of a card, then the card's description box.
  static ref CARD_REGEX: Regex = Regex::new(
    r#"(?is)(<a\s[^>]*class="[^"]*tool-item-link[^"]*"[^>]*>)(.*?)</a>.*?<div[^>]*class="[^"]*tool-item-description[^"]*"[^>]*>(.*?)</div>"#
  ).unwrap();
  static ref HREF_REGEX: Regex = Regex::new(r#"(?i)href="([^"]+)""#).unwrap();
  static ref TOOL_LINK_REGEX: Regex = Regex::new(
    r#"(?is)<a\s[^>]*href="((?:https?://[^"/]+)?/tools?/[^"]+)"[^>]*>(.*?)</a>"#
  ).unwrap();
  static ref HEADING_REGEX: Regex = Regex::new(r"(?is)<h[23][^>]*>(.*?)</h[23]>").unwrap();
}

pub fn extract_tools(
  html: &str,
  base_url: &str,
  max_items: usize
) -> (Vec<ToolEntry>, ExtractionStrategy) {
  let strategies: [(ExtractionStrategy, fn(&str, &str) -> Vec<ToolEntry>); 3] = [
    (ExtractionStrategy::ToolCards, from_cards),
    (ExtractionStrategy::ToolLinks, from_links),
    (ExtractionStrategy::Headings, from_headings)
  ];
  for (strategy, extract) in strategies.iter() {
    let entries = dedupe(extract(html, base_url), max_items);
    if !entries.is_empty() {
      return (entries, *strategy);
    }
  }
  (dedupe(placeholder_entries(), max_items), ExtractionStrategy::Placeholder)
}

fn from_cards(html: &str, base_url: &str) -> Vec<ToolEntry> {
  CARD_REGEX.captures_iter(html)
    .map(|caps| {
      let url = HREF_REGEX.captures(&caps[1])
        .and_then(|href| absolute_url(base_url, &href[1]));
      ToolEntry {
        name: strip_html(&caps[2]),
        description: strip_html(&caps[3]),
        url
      }
    })
    .collect()
}

fn from_links(html: &str, base_url: &str) -> Vec<ToolEntry> {
  TOOL_LINK_REGEX.captures_iter(html)
    .map(|caps| ToolEntry {
      name: strip_html(&caps[2]),
      description: String::new(),
      url: absolute_url(base_url, &caps[1])
    })
    .collect()
}

fn from_headings(html: &str, _base_url: &str) -> Vec<ToolEntry> {
  HEADING_REGEX.captures_iter(html)
    .map(|caps| ToolEntry {
      name: strip_html(&caps[1]),
      description: String::new(),
      url: None
    })
    .collect()
}

// Last resort so that a run always has something to show.
fn placeholder_entries() -> Vec<ToolEntry> {
  [
    ("ChatGPT", "Conversational AI assistant for writing, coding and research.", "https://chat.openai.com"),
    ("Midjourney", "AI image generator that turns text prompts into artwork.", "https://www.midjourney.com"),
    ("Perplexity", "AI search engine that answers questions with cited sources.", "https://www.perplexity.ai"),
    ("Runway", "AI video generation and editing tools for creators.", "https://runwayml.com"),
    ("ElevenLabs", "Realistic AI voice generation and text to speech.", "https://elevenlabs.io")
  ]
    .iter()
    .map(|(name, description, url)| ToolEntry {
      name: name.to_string(),
      description: description.to_string(),
      url: Some(url.to_string())
    })
    .collect()
}

// Drops empty or silly names and duplicates (case-insensitive),
// keeps the page order.
fn dedupe(entries: Vec<ToolEntry>, max_items: usize) -> Vec<ToolEntry> {
  let mut seen: Vec<String> = Vec::new();
  let mut kept = Vec::new();
  for entry in entries {
    if kept.len() >= max_items {
      break;
    }
    let key = entry.name.to_lowercase();
    let length = entry.name.chars().count();
    if length < 2 || length > MAX_NAME_LENGTH || seen.contains(&key) {
      continue;
    }
    seen.push(key);
    kept.push(entry);
  }
  kept
}

fn absolute_url(base_url: &str, href: &str) -> Option<String> {
  Url::parse(base_url)
    .and_then(|base| base.join(href))
    .map(|url| url.to_string())
    .ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  const BASE: &str = "https://www.futuretools.io/";

  #[test]
  fn cards_give_name_description_and_url() {
    let html = r#"
      <div role="listitem" class="tool-item-columns w-dyn-item">
        <a href="/tools/writer-pro" class="tool-item-link---new">Writer &amp; Pro</a>
        <div class="tool-item-description-box---new">Writes <b>long</b> articles.</div>
      </div>
      <div role="listitem" class="tool-item-columns w-dyn-item">
        <a class="tool-item-link---new" href="https://www.futuretools.io/tools/voicer">Voicer</a>
        <div class="tool-item-description-box---new">Clones voices.</div>
      </div>"#;
    let (entries, strategy) = extract_tools(html, BASE, 10);
    assert_eq!(ExtractionStrategy::ToolCards, strategy);
    assert_eq!(2, entries.len());
    assert_eq!("Writer & Pro", entries[0].name);
    assert_eq!("Writes long articles.", entries[0].description);
    assert_eq!(Some("https://www.futuretools.io/tools/writer-pro".to_string()), entries[0].url);
    assert_eq!("Voicer", entries[1].name);
  }

  #[test]
  fn falls_back_to_tool_links() {
    let html = r#"<ul><li><a href="/tools/alpha">Alpha</a></li>
      <li><a href="/tools/beta">Beta</a></li><li><a href="/tools/alpha">alpha</a></li>
      <li><a href="/about">About</a></li></ul>"#;
    let (entries, strategy) = extract_tools(html, BASE, 10);
    assert_eq!(ExtractionStrategy::ToolLinks, strategy);
    assert_eq!(vec!["Alpha", "Beta"], entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>());
  }

  #[test]
  fn falls_back_to_headings() {
    let html = "<h2>Gamma AI</h2><p>text</p><h3>Delta</h3><h4>Ignored</h4>";
    let (entries, strategy) = extract_tools(html, BASE, 10);
    assert_eq!(ExtractionStrategy::Headings, strategy);
    assert_eq!(2, entries.len());
    assert_eq!(None, entries[0].url);
  }

  #[test]
  fn placeholder_when_nothing_matches() {
    let (entries, strategy) = extract_tools("<p>nothing here</p>", BASE, 3);
    assert_eq!(ExtractionStrategy::Placeholder, strategy);
    assert_eq!(3, entries.len());
  }

  #[test]
  fn max_items_is_respected() {
    let html: String = (0..20)
      .map(|i| format!(r#"<a href="/tools/t{}">Tool {}</a>"#, i, i))
      .collect();
    let (entries, _) = extract_tools(&html, BASE, 10);
    assert_eq!(10, entries.len());
  }

  #[test]
  fn zero_max_items_extracts_nothing() {
    let html = r#"<a href="/tools/alpha">Alpha</a>"#;
    let (entries, _) = extract_tools(html, BASE, 0);
    assert!(entries.is_empty());
  }
}
