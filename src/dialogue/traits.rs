use crate::error::UpstreamError;
use crate::session::ChatTurn;
use std::future::Future;
use std::pin::Pin;

pub type DialogueFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, UpstreamError>> + Send + 'a>>;

/// External dialogue API: ordered role-tagged turns in, one reply out.
pub trait DialogueClient: Send + Sync {
    /// Client identifier for logs (e.g. "openai-compatible").
    fn name(&self) -> &str;

    /// Single completion for `turns` using the `bot` context identifier.
    /// Implementations do not retry.
    fn complete<'a>(&'a self, bot: &'a str, turns: &'a [ChatTurn]) -> DialogueFuture<'a>;
}
