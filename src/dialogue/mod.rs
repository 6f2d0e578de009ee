pub mod openai;
pub mod orchestrator;
pub mod traits;

pub use openai::OpenAiCompatibleDialogue;
pub use orchestrator::{Orchestrator, OrchestratorSettings, TurnReply};
pub use traits::{DialogueClient, DialogueFuture};
