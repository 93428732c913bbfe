use time::OffsetDateTime;

/// Default origin for all Cleverbot web endpoints.
pub const DEFAULT_CLEVERBOT_BASE_URL: &str = "https://www.cleverbot.com";

const COOKIE_BOOTSTRAP_PATH: &str = "/extras/conversation-social-min.js";
const WEBSERVICE_PATH: &str = "/webservicemin";

/// URL of the script whose response sets the session cookie.
///
/// The query is a date cache-buster in the exact shape the site's own client
/// uses: four-digit year, then the zero-based month index and the day of the
/// month, both zero-padded to two digits (`2024-01-05` becomes `20240005`).
pub fn cookie_bootstrap_url(base_url: &str, date: OffsetDateTime) -> String {
    let month_index = u8::from(date.month()) - 1;
    format!(
        "{}{COOKIE_BOOTSTRAP_PATH}?{:04}{:02}{:02}",
        normalize_base_url(base_url),
        date.year(),
        month_index,
        date.day()
    )
}

/// URL of the conversation endpoint carrying `query`.
pub fn webservice_url(base_url: &str, query: &str) -> String {
    format!("{}{WEBSERVICE_PATH}?{query}", normalize_base_url(base_url))
}

/// Trims whitespace and trailing slashes, falling back to the public origin.
pub fn normalize_base_url(input: &str) -> &str {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        DEFAULT_CLEVERBOT_BASE_URL
    } else {
        trimmed.trim_end_matches('/')
    }
}
