use crate::checksum::md5_hex;
use crate::escape::encode_stimulus;

/// Query string sent on every request.
pub const BASE_QUERY: &str = "uc=UseOfficialCleverbotAPI";
/// Fixed parameters appended after the session tokens on follow-up turns.
pub const FOLLOW_UP_QUERY_SUFFIX: &str =
    "&ns=2&al=&dl=&flag=&user=&mode=1&alt=0&reac=&emo=&sou=website&xed=&";
/// Fixed body parameters preceding the checksum value.
pub const BODY_TRAILER: &str =
    "cb_settings_language=en&cb_settings_scripting=no&islearning=1&icognoid=wsf&icognocheck=";

/// Byte range of the body the `icognocheck` digest covers.
///
/// The service anchors the slice at a constant offset, so the signed bytes do
/// not depend on how long the stimulus or the context is.
pub const CHECKSUM_RANGE: std::ops::Range<usize> = 7..33;

/// Prior-turn data a follow-up request has to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext<'a> {
    /// Alternating message/reply lines, oldest first.
    pub history: &'a [String],
    pub last_reply: &'a str,
    pub session_id: &'a str,
    pub session_aux: &'a str,
}

/// A signed `webservicemin` request, ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleverbotRequest {
    pub body: String,
    pub query: String,
}

impl CleverbotRequest {
    /// Builds the body and query string for `message`.
    ///
    /// Without `context` this is the opening request of a conversation and the
    /// query string is only [`BASE_QUERY`].
    #[must_use]
    pub fn build(message: &str, context: Option<RequestContext<'_>>) -> Self {
        Self {
            body: build_body(message, context.as_ref()),
            query: build_query(message, context.as_ref()),
        }
    }
}

fn build_body(message: &str, context: Option<&RequestContext<'_>>) -> String {
    let mut body = format!("stimulus={}&", encode_stimulus(message));

    if let Some(context) = context {
        for (line, number) in context.history.iter().rev().zip(2..) {
            body.push_str(&format!("vText{number}={}&", encode_stimulus(line)));
        }
    }

    body.push_str(BODY_TRAILER);
    let checksum = md5_hex(checksum_slice(&body));
    body.push_str(&checksum);
    body
}

/// Returns the bytes inside [`CHECKSUM_RANGE`], clamped to what `body` holds.
pub(crate) fn checksum_slice(body: &str) -> &[u8] {
    let bytes = body.as_bytes();
    let end = CHECKSUM_RANGE.end.min(bytes.len());
    let start = CHECKSUM_RANGE.start.min(end);
    &bytes[start..end]
}

fn build_query(message: &str, context: Option<&RequestContext<'_>>) -> String {
    let mut query = BASE_QUERY.to_owned();

    if let Some(context) = context {
        query.push_str("&out=");
        query.push_str(&urlencoding::encode(context.last_reply));
        query.push_str("&in=");
        query.push_str(&urlencoding::encode(message));
        query.push_str("&bot=c&cbsid=");
        query.push_str(&urlencoding::encode(context.session_id));
        query.push_str("&xai=");
        query.push_str(&urlencoding::encode(context.session_aux));
        query.push_str(FOLLOW_UP_QUERY_SUFFIX);
    }

    query
}
