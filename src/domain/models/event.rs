use async_trait::async_trait;

use super::ClientError;
use super::GenerateResponse;

/// Events produced while reading a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A partial response holding only the newest fragment.
    Chunk(GenerateResponse),
    /// The terminal response holding the full concatenated text. Always the
    /// last event of a stream.
    Done(GenerateResponse),
}

/// Returned by chunk callbacks to keep reading or to abandon the stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkControl {
    Continue,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed(GenerateResponse),
    /// The callback asked to stop before the terminal response arrived.
    Cancelled,
}

/// A pull based sequence of stream events. Nothing is read from the transport
/// until the next event is requested, so dropping the stream cancels it.
#[async_trait]
pub trait ResponseEvents: Send {
    async fn next_event(&mut self) -> Result<Option<StreamEvent>, ClientError>;
}

pub type ResponseStream = Box<dyn ResponseEvents>;

/// Pulls every event from `stream` and hands it to `on_chunk`, terminal
/// response included. Stops reading as soon as `on_chunk` returns
/// [`ChunkControl::Stop`] for a partial response.
pub async fn forward_events<S, F>(stream: &mut S, mut on_chunk: F) -> Result<StreamOutcome, ClientError>
where
    S: ResponseEvents + ?Sized,
    F: FnMut(&GenerateResponse) -> ChunkControl + Send,
{
    loop {
        match stream.next_event().await? {
            Some(StreamEvent::Chunk(partial)) => {
                if on_chunk(&partial) == ChunkControl::Stop {
                    tracing::debug!("Stream cancelled by caller");
                    return Ok(StreamOutcome::Cancelled);
                }
            }
            Some(StreamEvent::Done(terminal)) => {
                on_chunk(&terminal);
                return Ok(StreamOutcome::Completed(terminal));
            }
            None => {
                return Err(ClientError::Decode(
                    "stream ended without a terminal response".to_string(),
                ));
            }
        }
    }
}
