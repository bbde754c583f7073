//! Completion services: something that turns a prompt into a text reply.

pub mod gemini;
pub mod random;

use thiserror::Error;

pub use gemini::GeminiClient;
pub use random::RandomAgent;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API key configured")]
    MissingCredential,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("response contained no text")]
    EmptyResponse,
}

/// One stateless request/response exchange with a text model.
pub trait CompletionService {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

impl<T: CompletionService + ?Sized> CompletionService for &T {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> { (**self).complete(prompt) }
}

impl<T: CompletionService + ?Sized> CompletionService for Box<T> {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> { (**self).complete(prompt) }
}
