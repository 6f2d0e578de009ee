mod conversation;
mod core;
mod gateway;
mod storage;
mod upstream;

pub use conversation::{HistoryConfig, PersonasConfig};
pub use self::core::Config;
pub use gateway::{GatewayConfig, MAX_BODY_BYTES, REQUEST_TIMEOUT};
pub use storage::StorageConfig;
pub use upstream::{DialogueConfig, SpeechConfig};
