use actix_web::{
  http::header,
  HttpRequest
};

pub const API_KEY_HEADER: &'static str = "x-api-key";
pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 50;
// Nothing has this many pages, keeps the offset math in range.
pub const MAX_PAGE: i64 = 1_000_000;

// Extracting Actix header values is kinda convoluted, they
// can fail to convert to str because of invalid characters.
// Treating these as absent.
pub fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
  req.headers().get(name)
    .and_then(|h| h.to_str().ok())
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

// "Authorization: Bearer <token>", scheme is case-insensitive.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
  header_value(req, header::AUTHORIZATION.as_str())
    .and_then(|value| {
      let (scheme, token) = value.split_once(' ')?;
      if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim().to_string())
      } else {
        None
      }
    })
}

// Returns (page, per_page, offset) with pages starting at 1.
pub fn page_params(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
  let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
  let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
  (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[test]
  fn bearer_token_is_extracted() {
    let req = TestRequest::default()
      .insert_header(("Authorization", "Bearer abc.def"))
      .to_http_request();
    assert_eq!(Some("abc.def".to_string()), bearer_token(&req));
    let req = TestRequest::default()
      .insert_header(("Authorization", "Basic abc"))
      .to_http_request();
    assert_eq!(None, bearer_token(&req));
    assert_eq!(None, bearer_token(&TestRequest::default().to_http_request()));
  }

  #[test]
  fn page_params_are_clamped() {
    assert_eq!((1, 10, 0), page_params(None, None));
    assert_eq!((3, 50, 100), page_params(Some(3), Some(500)));
    assert_eq!((1, 1, 0), page_params(Some(-2), Some(0)));
  }

  #[test]
  fn huge_page_does_not_overflow() {
    let (page, per_page, offset) = page_params(Some(i64::MAX), Some(10));
    assert_eq!(MAX_PAGE, page);
    assert_eq!(10, per_page);
    assert_eq!((MAX_PAGE - 1) * 10, offset);
  }
}
