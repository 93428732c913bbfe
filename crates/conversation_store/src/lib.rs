//! In-memory conversation state keyed by conversation (e.g. channel) id.
//!
//! Each key owns an async slot lock so a whole turn (read, request, parse,
//! write) runs exclusively per key while different keys proceed concurrently.

mod schema;
mod store;

pub use schema::ConversationState;
pub use store::{ConversationSlot, ConversationStore};
