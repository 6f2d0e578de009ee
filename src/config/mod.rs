pub mod schema;

pub use schema::{
    Config, DialogueConfig, GatewayConfig, HistoryConfig, MAX_BODY_BYTES, PersonasConfig,
    REQUEST_TIMEOUT, SpeechConfig, StorageConfig,
};
