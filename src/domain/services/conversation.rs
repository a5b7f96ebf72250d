#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use super::SessionRegistry;
use crate::domain::models::forward_events;
use crate::domain::models::BackendBox;
use crate::domain::models::ChunkControl;
use crate::domain::models::ClientError;
use crate::domain::models::GenerateRequest;
use crate::domain::models::GenerateResponse;
use crate::domain::models::Session;
use crate::domain::models::StreamOutcome;

/// Runs turns against a backend, threading continuation tokens through the
/// session registry.
///
/// Each turn reads the session bound to the conversation's model, sends its
/// continuation tokens along with the prompt, and records the finished turn on
/// that same branch. Cancelled streams record nothing.
pub struct Conversation {
    backend: BackendBox,
    sessions: Arc<SessionRegistry>,
    model: String,
    options: Option<Map<String, Value>>,
}

impl Conversation {
    pub fn new(backend: BackendBox, sessions: Arc<SessionRegistry>, model: &str) -> Conversation {
        sessions.ensure_session(model);

        return Conversation {
            backend,
            sessions,
            model: model.to_string(),
            options: None,
        };
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Conversation {
        self.options = Some(options);
        return self;
    }

    pub fn model(&self) -> &str {
        return &self.model;
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        return &self.sessions;
    }

    pub fn backend(&self) -> &BackendBox {
        return &self.backend;
    }

    /// Moves the conversation to another model. Branches of the previous
    /// model are kept.
    pub fn set_model(&mut self, model: &str) -> Session {
        self.model = model.to_string();
        return self.sessions.ensure_session(model);
    }

    /// Forks the current branch of this conversation's model into `name` and
    /// continues on it.
    pub fn branch(&self, name: &str) -> Result<Session, ClientError> {
        self.sessions.ensure_session(&self.model);
        return self.sessions.clone_branch(name);
    }

    /// Continues on an existing branch, adopting its model.
    pub fn switch(&mut self, name: &str) -> Result<Session, ClientError> {
        let session = self.sessions.switch_branch(name)?;
        self.model = session.model.to_string();

        return Ok(session);
    }

    fn request(&self, prompt: &str, images: &[Vec<u8>]) -> (String, GenerateRequest) {
        let session = self.sessions.ensure_session(&self.model);
        let mut req = GenerateRequest::new(&self.model, prompt).with_context(session.context());
        for image in images.iter() {
            req = req.with_image_bytes(image);
        }
        req.options = self.options.clone();

        return (session.name, req);
    }

    /// Sends one turn and waits for the whole answer.
    pub async fn ask(
        &self,
        prompt: &str,
        images: &[Vec<u8>],
    ) -> Result<GenerateResponse, ClientError> {
        let (branch, req) = self.request(prompt, images);
        let res = self.backend.generate(req.clone()).await?;
        self.sessions.append_to(&branch, req, res.clone())?;

        return Ok(res);
    }

    /// Sends one turn, handing partial answers to `on_chunk` as they arrive.
    /// The turn is only recorded when the stream completes.
    pub async fn ask_streaming<F>(
        &self,
        prompt: &str,
        images: &[Vec<u8>],
        on_chunk: F,
    ) -> Result<StreamOutcome, ClientError>
    where
        F: FnMut(&GenerateResponse) -> ChunkControl + Send,
    {
        let (branch, req) = self.request(prompt, images);
        let mut stream = self.backend.generate_stream(req.clone()).await?;
        let outcome = forward_events(stream.as_mut(), on_chunk).await?;

        if let StreamOutcome::Completed(res) = &outcome {
            self.sessions.append_to(&branch, req, res.clone())?;
        }

        return Ok(outcome);
    }
}
