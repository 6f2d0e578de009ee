pub mod history;
pub mod store;
pub mod types;

pub use history::DialogueHistory;
pub use store::{SessionStore, session_key};
pub use types::{ChatRole, ChatTurn, SessionRecord, validate_session_id};
