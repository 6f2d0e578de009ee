pub mod audio;
pub mod client;
pub mod service;

pub use audio::audio_content_type;
pub use client::{HttpSpeechClient, SpeechClient, SpeechFuture, SpeechRequest, SynthesizedAudio};
pub use service::SpeechService;
