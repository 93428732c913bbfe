use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};

use crate::error::CleverbotApiError;

/// Desktop browser user agent; the endpoint rejects obvious non-browser agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
pub const BODY_CONTENT_TYPE: &str = "text/plain";
/// Literal cookie pair appended after the bootstrapped session cookie.
pub const SESSION_COOKIE_SUFFIX: &str = "_cbsid=-1";

/// `Cookie` header value for a conversation POST.
pub fn cookie_header_value(session_cookie: &str) -> String {
    format!("{session_cookie}; {SESSION_COOKIE_SUFFIX}")
}

/// Headers for the cookie bootstrap GET.
pub fn bootstrap_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// Headers for a conversation POST signed with `session_cookie`.
pub fn post_headers(session_cookie: &str) -> Result<HeaderMap, CleverbotApiError> {
    let mut headers = bootstrap_headers();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(BODY_CONTENT_TYPE));
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&cookie_header_value(session_cookie))
            .map_err(|_| CleverbotApiError::InvalidHeader { name: "cookie" })?,
    );
    Ok(headers)
}

/// Extracts the `name=value` pair of the first `Set-Cookie` header.
pub fn session_cookie_from(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(reqwest::header::SET_COOKIE)?
        .to_str()
        .ok()?;
    let pair = raw.split(';').next().unwrap_or_default().trim();
    if pair.is_empty() {
        None
    } else {
        Some(pair.to_owned())
    }
}
