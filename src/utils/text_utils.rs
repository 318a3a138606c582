use html2text::from_read_with_decorator;
use html2text::render::text_renderer::TrivialDecorator;

// Using truncate() directly can panic when cutting a multibyte
// unicode char in half, and this site is mostly Chinese text.
pub fn truncate_utf8(value: &mut String, max_chars: usize) {
  if let Some((idx, _)) = value.char_indices().nth(max_chars) {
    value.truncate(idx);
  }
}

// html2text wraps lines at the given width, I'm giving it a
// large value and collapsing the whitespace afterwards because
// all I want is the plain text. The trivial decorator doesn't
// add the markdown-ish "**" around bold text.
pub fn strip_html(html: &str) -> String {
  let text = from_read_with_decorator(
    html.as_bytes(),
    10_000,
    TrivialDecorator::new()
  );
  text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

// Default excerpt for articles that don't come with one.
pub fn excerpt_from_html(html: &str, max_chars: usize) -> String {
  let mut text = strip_html(html);
  if text.chars().count() > max_chars {
    truncate_utf8(&mut text, max_chars);
    let mut trimmed = text.trim_end().to_string();
    trimmed.push('…');
    return trimmed;
  }
  text
}

// For text that goes inside generated HTML (scraped content).
pub fn escape_html(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      _ => escaped.push(c)
    }
  }
  escaped
}

pub fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncate_does_not_split_multibyte_chars() {
    let mut sut = String::from("人工智能新闻");
    truncate_utf8(&mut sut, 4);
    assert_eq!("人工智能", sut);
    let mut short = String::from("abc");
    truncate_utf8(&mut short, 10);
    assert_eq!("abc", short);
  }

  #[test]
  fn strip_html_keeps_text_only() {
    let text = strip_html("<p>Hello <b>big</b>\n   world</p>");
    assert_eq!("Hello big world", text);
  }

  #[test]
  fn excerpt_is_cut_with_ellipsis() {
    let excerpt = excerpt_from_html("<p>abcdefghij</p>", 4);
    assert_eq!("abcd…", excerpt);
  }

  #[test]
  fn html_special_chars_are_escaped() {
    assert_eq!("a &lt;b&gt; &amp; &quot;c&quot;", escape_html("a <b> & \"c\""));
  }

  #[test]
  fn email_is_trimmed_and_lowercased() {
    assert_eq!("someone@example.com", normalize_email("  SomeOne@Example.com "));
  }
}
