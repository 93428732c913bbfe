use crate::error::CleverbotApiError;

/// Session id value the service sends back when it is throttling the client.
pub const DENIED_SENTINEL: &str = "DENIED";
const FIELD_SEPARATOR: char = '\r';

/// Reply text and the session tokens the next turn must replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub reply: String,
    pub session_id: String,
    pub session_aux: String,
}

/// Splits a raw `webservicemin` response body into its fields.
///
/// Field 0 is the reply, field 1 the session id, field 2 the suffix of the
/// auxiliary token. Missing trailing fields default to empty strings.
pub fn parse_response(raw: &str) -> Result<ParsedReply, CleverbotApiError> {
    let mut fields = raw.split(FIELD_SEPARATOR);

    let reply = fields.next().unwrap_or_default();
    if reply.is_empty() {
        return Err(CleverbotApiError::EmptyReply);
    }

    let session_id = fields.next().unwrap_or_default();
    if session_id == DENIED_SENTINEL {
        return Err(CleverbotApiError::RateLimited);
    }
    let aux_suffix = fields.next().unwrap_or_default();

    Ok(ParsedReply {
        reply: reply.to_owned(),
        session_id: session_id.to_owned(),
        session_aux: session_aux(session_id, aux_suffix),
    })
}

/// `xai` token: first three characters of the session id, a comma, then the
/// server-supplied suffix.
#[must_use]
pub fn session_aux(session_id: &str, aux_suffix: &str) -> String {
    let prefix: String = session_id.chars().take(3).collect();
    format!("{prefix},{aux_suffix}")
}
