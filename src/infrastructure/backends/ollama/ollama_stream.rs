#[cfg(test)]
#[path = "ollama_stream_test.rs"]
mod tests;

use std::io;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::Lines;
use tokio::time;

use super::ollama_codec::decode_response;
use super::ollama_codec::is_error_line;
use crate::domain::models::ClientError;
use crate::domain::models::GenerateResponse;
use crate::domain::models::ObserverBox;
use crate::domain::models::ResponseEvents;
use crate::domain::models::StreamEvent;

/// Streamed HTTP body as handed to the decoder.
pub type BodyReader = Pin<Box<dyn AsyncBufRead + Send>>;

/// Turns a newline delimited body into partial responses followed by exactly
/// one terminal response.
///
/// Lines are read one at a time and only when the next event is requested.
/// The terminal response's text is replaced with every fragment received
/// before it, concatenated. An error line ends the stream with a synthetic
/// terminal response holding the raw line.
pub struct StreamDecoder<R> {
    lines: Lines<R>,
    model: String,
    buffer: String,
    idle_timeout: Duration,
    observer: ObserverBox,
    finished: bool,
}

impl<R: AsyncBufRead + Unpin + Send> StreamDecoder<R> {
    pub fn new(
        reader: R,
        model: &str,
        idle_timeout: Duration,
        observer: ObserverBox,
    ) -> StreamDecoder<R> {
        return StreamDecoder {
            lines: reader.lines(),
            model: model.to_string(),
            buffer: "".to_string(),
            idle_timeout,
            observer,
            finished: false,
        };
    }

    /// Text received so far.
    pub fn text(&self) -> &str {
        return &self.buffer;
    }

    pub fn into_inner(self) -> R {
        return self.lines.into_inner();
    }

    fn fail(&mut self, err: ClientError) -> Result<Option<StreamEvent>, ClientError> {
        self.finished = true;
        self.observer.on_error(&err);
        tracing::error!(error = %err, "Failed reading completion stream");
        return Err(err);
    }

    async fn read_line(&mut self) -> Result<Option<String>, ClientError> {
        match time::timeout(self.idle_timeout, self.lines.next_line()).await {
            Ok(Ok(line)) => return Ok(line),
            Ok(Err(err)) if err.kind() == io::ErrorKind::InvalidData => {
                return Err(ClientError::Decode(format!("stream line is not valid UTF-8: {err}")));
            }
            Ok(Err(err)) => return Err(ClientError::from(err)),
            Err(_) => {
                return Err(ClientError::Network(format!(
                    "no data received from the backend for {}ms",
                    self.idle_timeout.as_millis()
                )));
            }
        }
    }

    async fn decode_next(&mut self) -> Result<Option<StreamEvent>, ClientError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let line = match self.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    return self.fail(ClientError::Decode(
                        "stream ended without a terminal response".to_string(),
                    ));
                }
                Err(err) => return self.fail(err),
            };

            if line.trim().is_empty() {
                continue;
            }

            self.observer.on_response(&line);

            if is_error_line(&line) {
                self.finished = true;
                tracing::error!(line = %line, "Backend returned an error mid stream");
                let res = GenerateResponse::from_error_line(&self.model, &line);
                return Ok(Some(StreamEvent::Done(res)));
            }

            let mut res = match decode_response(&line) {
                Ok(res) => res,
                Err(err) => return self.fail(err),
            };
            tracing::debug!(body = ?res, "Completion response");

            if res.done {
                self.finished = true;
                res.response = self.buffer.to_string();
                return Ok(Some(StreamEvent::Done(res)));
            }

            self.buffer.push_str(&res.response);
            return Ok(Some(StreamEvent::Chunk(res)));
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ResponseEvents for StreamDecoder<R> {
    #[allow(clippy::implicit_return)]
    async fn next_event(&mut self) -> Result<Option<StreamEvent>, ClientError> {
        return self.decode_next().await;
    }
}
