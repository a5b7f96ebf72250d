#[cfg(test)]
#[path = "ollama_test.rs"]
mod tests;

mod ollama_codec;
mod ollama_stream;

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::time;
use tokio_util::io::StreamReader;

pub use self::ollama_codec::ERROR_SENTINEL;
pub use self::ollama_stream::BodyReader;
pub use self::ollama_stream::StreamDecoder;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::ClientError;
use crate::domain::models::GenerateRequest;
use crate::domain::models::GenerateResponse;
use crate::domain::models::ObserverBox;
use crate::domain::models::ResponseStream;
use crate::infrastructure::observers::TracingObserver;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

fn parse_millis(value: &str, fallback: u64) -> Duration {
    return Duration::from_millis(value.parse::<u64>().unwrap_or(fallback));
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Model {
    name: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModelListResponse {
    pub models: Vec<Model>,
}

pub struct Ollama {
    url: String,
    timeout: String,
    request_timeout: Duration,
    idle_timeout: Duration,
    retries: u32,
    observer: ObserverBox,
}

impl Default for Ollama {
    fn default() -> Ollama {
        return Ollama {
            url: Config::get(ConfigKey::OllamaURL),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
            request_timeout: parse_millis(&Config::get(ConfigKey::RequestTimeout), 600000),
            idle_timeout: parse_millis(&Config::get(ConfigKey::StreamIdleTimeout), 300000),
            retries: Config::get(ConfigKey::Retries).parse::<u32>().unwrap_or(0),
            observer: Arc::new(TracingObserver::default()),
        };
    }
}

impl Ollama {
    pub fn with_observer(mut self, observer: ObserverBox) -> Ollama {
        self.observer = observer;
        return self;
    }

    fn observed<T>(&self, res: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(err) = &res {
            self.observer.on_error(err);
        }

        return res;
    }

    fn prepare(&self, mut req: GenerateRequest, stream: bool) -> Result<String, ClientError> {
        if req.model.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "a model name is required".to_string(),
            ));
        }

        req.stream = stream;
        let body = ollama_codec::encode_request(&req)?;
        self.observer.on_request(&body);
        tracing::debug!(body = %body, "Completion request");

        return Ok(body);
    }

    /// Posts a generate request, retrying connection failures. Only the
    /// response headers are awaited here.
    async fn post(&self, body: String) -> Result<reqwest::Response, ClientError> {
        let mut attempt = 0;
        loop {
            let send = reqwest::Client::new()
                .post(format!("{url}/api/generate", url = self.url))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_string())
                .send();

            let err = match time::timeout(self.request_timeout, send).await {
                Ok(Ok(res)) => {
                    if !res.status().is_success() {
                        let status = res.status().as_u16();
                        let body = res.text().await.unwrap_or_default();
                        tracing::error!(status, body = %body, "Failed to make completion request to Ollama");
                        return Err(ClientError::Http { status, body });
                    }

                    return Ok(res);
                }
                Ok(Err(err)) => ClientError::from(err),
                Err(_) => ClientError::Network(format!(
                    "timed out after {}ms waiting for Ollama",
                    self.request_timeout.as_millis()
                )),
            };

            if !err.is_retryable() || attempt >= self.retries {
                return Err(err);
            }

            attempt += 1;
            tracing::warn!(error = %err, attempt, "Retrying completion request to Ollama");
            time::sleep(RETRY_BACKOFF * attempt).await;
        }
    }
}

#[async_trait]
impl Backend for Ollama {
    fn name(&self) -> BackendName {
        return BackendName::Ollama;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Ollama is not running");
                bail!("Ollama is not running");
            }
        };

        if res.status() != 200 {
            tracing::error!(status = res.status().as_u16(), "Ollama health check failed");
            bail!("Ollama health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        let res = reqwest::Client::new()
            .get(format!("{url}/api/tags", url = self.url))
            .send()
            .await?
            .json::<ModelListResponse>()
            .await?;

        let mut models: Vec<String> = res
            .models
            .iter()
            .map(|model| {
                return model.name.to_string();
            })
            .collect();

        models.sort();

        return Ok(models);
    }

    #[allow(clippy::implicit_return)]
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ClientError> {
        let body = self.observed(self.prepare(request, false))?;
        let res = self.observed(self.post(body).await)?;

        let text = match time::timeout(self.request_timeout, res.text()).await {
            Ok(text) => text.map_err(ClientError::from),
            Err(_) => Err(ClientError::Network(format!(
                "timed out after {}ms reading the response from Ollama",
                self.request_timeout.as_millis()
            ))),
        };
        let text = self.observed(text)?;
        self.observer.on_response(&text);

        let res = self.observed(ollama_codec::decode_body(&text))?;
        tracing::debug!(body = ?res, "Completion response");

        return Ok(res);
    }

    #[allow(clippy::implicit_return)]
    async fn generate_stream(&self, request: GenerateRequest) -> Result<ResponseStream, ClientError> {
        let model = request.model.to_string();
        let body = self.observed(self.prepare(request, true))?;
        let res = self.observed(self.post(body).await)?;

        let stream = res.bytes_stream().map_err(convert_err);
        let reader: BodyReader = Box::pin(StreamReader::new(stream));

        return Ok(Box::new(StreamDecoder::new(
            reader,
            &model,
            self.idle_timeout,
            self.observer.clone(),
        )));
    }
}
