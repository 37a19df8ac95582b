use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("completion request timed out after {0}s")]
    Timeout(u64),
    #[error("completion transport failure: {0}")]
    Transport(String),
    #[error("completion service returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("completion response was malformed: {0}")]
    MalformedResponse(String),
    #[error("completion client failure: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Failures of the service or the network, as opposed to a reply we
    /// could not read or a request we could not build.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_) | Self::Status { .. })
    }
}

/// Text-in/text-out contract with the hosted language model. One call, one
/// attempt; implementations must bound the call with a timeout.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_text: &str)
        -> Result<Completion, GatewayError>;
}
