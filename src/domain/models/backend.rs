use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::forward_events;
use super::ChunkControl;
use super::ClientError;
use super::GenerateRequest;
use super::GenerateResponse;
use super::ResponseStream;
use super::StreamOutcome;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Ollama,
}

impl BackendName {
    pub fn parse(text: String) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> BackendName;

    /// Used at startup to verify the backend is reachable.
    async fn health_check(&self) -> Result<()>;

    /// All models available from the backend, sorted by name.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Sends a request and waits for the whole response body. The request's
    /// continuation tokens must already be set by the caller.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ClientError>;

    /// Sends a request and returns the response body as a pull based event
    /// stream. The final event carries the full concatenated text.
    async fn generate_stream(&self, request: GenerateRequest) -> Result<ResponseStream, ClientError>;

    /// Streams a request, handing every partial response and then the terminal
    /// response to `on_chunk`, in the order they were read.
    #[allow(clippy::implicit_return)]
    async fn generate_with(
        &self,
        request: GenerateRequest,
        on_chunk: &mut (dyn for<'r> FnMut(&'r GenerateResponse) -> ChunkControl + Send),
    ) -> Result<StreamOutcome, ClientError> {
        let mut stream = self.generate_stream(request).await?;
        return forward_events(stream.as_mut(), |res| return on_chunk(res)).await;
    }
}

pub type BackendBox = Box<dyn Backend>;
