use crate::db::entities::Category;

// Bonus weights when the category itself is named in the text.
const NAME_BONUS: u32 = 3;
const SLUG_BONUS: u32 = 2;
// Slugs shorter than this match inside too many words ("ai").
const MIN_SLUG_MATCH_LENGTH: usize = 3;

// Fixed keyword lists per category slug. Scraped content is
// English and gets translated to Chinese before this runs, so
// both languages are listed. Categories without a list still
// score through their name and slug.
fn keywords_for(slug: &str) -> &'static [&'static str] {
  match slug {
    "ai-news" | "news" => &[
      "新闻", "资讯", "发布", "宣布", "融资", "收购", "更新",
      "news", "announce", "release", "launch", "funding", "acquisition"
    ],
    "ai-tools" | "tools" => &[
      "工具", "应用", "平台", "软件", "插件", "扩展", "生成器", "助手",
      "tool", "app", "platform", "software", "plugin", "extension", "generator", "assistant"
    ],
    "prompts" | "prompt-templates" => &[
      "提示词", "提示", "模板", "指令",
      "prompt", "template", "instruction"
    ],
    "tutorials" | "guides" => &[
      "教程", "指南", "入门", "如何", "步骤",
      "tutorial", "guide", "how to", "step by step", "beginner"
    ],
    "industry" | "business" => &[
      "行业", "市场", "企业", "商业", "投资",
      "industry", "market", "enterprise", "business", "investment"
    ],
    "research" => &[
      "研究", "论文", "模型", "算法", "基准",
      "research", "paper", "model", "algorithm", "benchmark"
    ],
    _ => &[]
  }
}

pub fn score(text_lower: &str, category: &Category) -> u32 {
  let mut score = keywords_for(&category.slug)
    .iter()
    .filter(|keyword| text_lower.contains(*keyword))
    .count() as u32;
  let name = category.name.to_lowercase();
  if !name.is_empty() && text_lower.contains(&name) {
    score += NAME_BONUS;
  }
  if category.slug.len() >= MIN_SLUG_MATCH_LENGTH && text_lower.contains(&category.slug) {
    score += SLUG_BONUS;
  }
  score
}

/// Picks the category whose keywords show up the most in the
/// text. Ties go to the category that comes first in the
/// slice, nothing scoring above zero means no category.
pub fn categorize(text: &str, categories: &[Category]) -> Option<i64> {
  let text_lower = text.to_lowercase();
  let mut best: Option<(i64, u32)> = None;
  for category in categories {
    let current = score(&text_lower, category);
    // Strictly greater keeps the first one seen on ties.
    if current > 0 && best.map(|(_, s)| current > s).unwrap_or(true) {
      best = Some((category.id, current));
    }
  }
  best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn category(id: i64, name: &str, slug: &str) -> Category {
    Category {
      id,
      name: name.to_string(),
      slug: slug.to_string(),
      color: "#3B82F6".to_string(),
      description: None,
      created_at: 0,
      article_count: 0
    }
  }

  fn site_categories() -> Vec<Category> {
    vec![
      category(1, "AI资讯", "ai-news"),
      category(2, "AI工具", "ai-tools"),
      category(3, "提示词", "prompts")
    ]
  }

  #[test]
  fn chinese_tool_description_goes_to_tools() {
    let text = "一款强大的AI写作工具，提供浏览器插件和移动应用";
    assert_eq!(Some(2), categorize(text, &site_categories()));
  }

  #[test]
  fn english_text_matches_too() {
    let text = "OpenAI announces new funding round and a product launch";
    assert_eq!(Some(1), categorize(text, &site_categories()));
  }

  #[test]
  fn category_name_gives_a_bonus() {
    // One tools keyword, but the prompts category is named.
    let text = "提示词 大全 app";
    assert_eq!(Some(3), categorize(text, &site_categories()));
  }

  #[test]
  fn ties_go_to_first_category() {
    let categories = vec![
      category(7, "Alpha", "alpha"),
      category(8, "Beta", "beta")
    ];
    assert_eq!(Some(7), categorize("alpha and beta", &categories));
  }

  #[test]
  fn nothing_matching_means_no_category() {
    assert_eq!(None, categorize("completely unrelated", &site_categories()));
    assert_eq!(None, categorize("anything", &[]));
  }
}
