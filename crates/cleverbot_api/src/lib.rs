//! Transport-only Cleverbot web client primitives.
//!
//! This crate owns request signing, stimulus escaping, cookie bootstrap,
//! retrying transport and response parsing for the `webservicemin` endpoint.
//! It intentionally holds no conversation bookkeeping: callers pass the prior
//! turn in as a [`RequestContext`] and keep whatever [`ParsedReply`] returns.
//!
//! The wire contract is the one the service's own browser client speaks: a
//! percent-escaped form body signed with an MD5 over a fixed slice of itself.

pub mod checksum;
pub mod client;
pub mod config;
pub mod cookie;
pub mod error;
pub mod escape;
pub mod headers;
pub mod payload;
pub mod response;
pub mod retry;
pub mod url;

pub use checksum::md5_hex;
pub use client::{CancellationSignal, CleverbotClient, RawResponse};
pub use config::CleverbotConfig;
pub use cookie::CookieCache;
pub use error::CleverbotApiError;
pub use escape::{encode_stimulus, escape};
pub use payload::{CleverbotRequest, RequestContext};
pub use response::{parse_response, ParsedReply};
pub use url::{cookie_bootstrap_url, webservice_url, DEFAULT_CLEVERBOT_BASE_URL};
