use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;
use test_utils::stream_fixture;

use super::Model;
use super::ModelListResponse;
use super::Ollama;
use crate::domain::models::Backend;
use crate::domain::models::ChunkControl;
use crate::domain::models::ClientError;
use crate::domain::models::GenerateRequest;
use crate::domain::models::GenerateResponse;
use crate::domain::models::NoopObserver;
use crate::domain::models::Observer;
use crate::domain::models::ResponseEvents;
use crate::domain::models::StreamEvent;
use crate::domain::models::StreamOutcome;

impl Ollama {
    fn with_url(url: String) -> Ollama {
        return Ollama {
            url,
            timeout: "200".to_string(),
            request_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(5),
            retries: 0,
            observer: Arc::new(NoopObserver::default()),
        };
    }
}

#[derive(Default)]
struct RecordingObserver {
    requests: Mutex<Vec<String>>,
    responses: Mutex<Vec<String>>,
    errors: Mutex<Vec<ClientError>>,
}

impl Observer for RecordingObserver {
    fn on_request(&self, raw: &str) {
        self.requests.lock().unwrap().push(raw.to_string());
    }

    fn on_response(&self, raw: &str) {
        self.responses.lock().unwrap().push(raw.to_string());
    }

    fn on_error(&self, err: &ClientError) {
        self.errors.lock().unwrap().push(err.clone());
    }
}

fn completion_body() -> String {
    return json!({
        "model": "llama2",
        "created_at": "2023-11-15T10:00:00Z",
        "response": "Hello World",
        "done": true,
        "context": [1, 2, 3],
        "prompt_eval_count": 4,
        "eval_count": 2,
        "eval_duration": 1000000
    })
    .to_string();
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .with_status(200)
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .with_status(500)
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_lists_models() -> Result<()> {
    let body = serde_json::to_string(&ModelListResponse {
        models: vec![
            Model {
                name: "second".to_string(),
            },
            Model {
                name: "first".to_string(),
            },
        ],
    })?;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend.list_models().await?;

    assert_eq!(res, vec!["first".to_string(), "second".to_string()]);
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_generates_completions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({
            "model": "llama2",
            "prompt": "Say hi to the world",
            "stream": false,
            "context": [1],
        })))
        .with_status(200)
        .with_body(completion_body())
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let req = GenerateRequest::new("llama2", "Say hi to the world").with_context(Some(vec![1]));
    let res = backend.generate(req).await?;

    mock.assert_async().await;
    assert_eq!(res.response, "Hello World");
    assert!(res.done);
    assert_eq!(res.context, Some(vec![1, 2, 3]));
    assert_eq!(res.eval_count, 2);

    return Ok(());
}

#[tokio::test]
async fn it_surfaces_error_bodies() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(r#"{"error":"model 'nope' not found"}"#)
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend.generate(GenerateRequest::new("nope", "Hi")).await;

    assert_eq!(
        res,
        Err(ClientError::Backend("model 'nope' not found".to_string()))
    );
}

#[tokio::test]
async fn it_fails_on_http_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend.generate(GenerateRequest::new("llama2", "Hi")).await;

    assert_eq!(
        res,
        Err(ClientError::Http {
            status: 500,
            body: "boom".to_string()
        })
    );
}

#[tokio::test]
async fn it_fails_on_malformed_bodies() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend.generate(GenerateRequest::new("llama2", "Hi")).await;

    assert!(matches!(res, Err(ClientError::Decode(_))));
}

#[tokio::test]
async fn it_rejects_requests_without_a_model() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .expect(0)
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let res = backend.generate(GenerateRequest::new(" ", "Hi")).await;

    assert!(matches!(res, Err(ClientError::InvalidRequest(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_on_unreachable_backends() {
    let mut backend = Ollama::with_url("http://127.0.0.1:1".to_string());
    backend.retries = 2;

    let res = backend.generate(GenerateRequest::new("llama2", "Hi")).await;
    assert!(matches!(res, Err(ClientError::Network(_))));

    let res = backend
        .generate_stream(GenerateRequest::new("llama2", "Hi"))
        .await;
    assert!(matches!(res, Err(ClientError::Network(_))));
}

#[tokio::test]
async fn it_streams_completions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({ "stream": true })))
        .with_status(200)
        .with_body(stream_fixture())
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let mut stream = backend
        .generate_stream(GenerateRequest::new("llama2", "Say hi to the world"))
        .await?;

    let mut events = vec![];
    while let Some(event) = stream.next_event().await? {
        events.push(event);
    }

    mock.assert_async().await;
    assert_eq!(events.len(), 4);

    let chunks = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Chunk(res) => return Some(res.response.to_string()),
            StreamEvent::Done(_) => return None,
        })
        .collect::<Vec<String>>();
    assert_eq!(chunks, vec!["Hello", " there", ", world"]);

    match events.last() {
        Some(StreamEvent::Done(res)) => {
            assert_eq!(res.response, "Hello there, world");
            assert_eq!(res.context, Some(vec![1, 2, 3]));
        }
        other => panic!("expected a terminal response, got {other:?}"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_streams_completions_to_callbacks() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(stream_fixture())
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let mut texts: Vec<String> = vec![];
    let mut on_chunk = |res: &GenerateResponse| {
        texts.push(res.response.to_string());
        return ChunkControl::Continue;
    };
    let outcome = backend
        .generate_with(GenerateRequest::new("llama2", "Hi"), &mut on_chunk)
        .await?;

    match outcome {
        StreamOutcome::Completed(res) => assert_eq!(res.response, "Hello there, world"),
        StreamOutcome::Cancelled => panic!("stream should complete"),
    }
    assert_eq!(texts, vec!["Hello", " there", ", world", "Hello there, world"]);

    return Ok(());
}

#[tokio::test]
async fn it_cancels_streams_from_callbacks() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(stream_fixture())
        .create_async()
        .await;

    let backend = Ollama::with_url(server.url());
    let mut calls = 0;
    let mut on_chunk = |_res: &GenerateResponse| {
        calls += 1;
        if calls == 2 {
            return ChunkControl::Stop;
        }
        return ChunkControl::Continue;
    };
    let outcome = backend
        .generate_with(GenerateRequest::new("llama2", "Hi"), &mut on_chunk)
        .await?;

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(calls, 2);

    return Ok(());
}

#[tokio::test]
async fn it_reports_traffic_to_observers() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(completion_body())
        .create_async()
        .await;

    let observer = Arc::new(RecordingObserver::default());
    let backend = Ollama::with_url(server.url()).with_observer(observer.clone());
    backend.generate(GenerateRequest::new("llama2", "Hi")).await?;

    assert_eq!(
        observer.requests.lock().unwrap().clone(),
        vec![r#"{"model":"llama2","prompt":"Hi","stream":false}"#.to_string()]
    );
    assert_eq!(
        observer.responses.lock().unwrap().clone(),
        vec![completion_body()]
    );
    assert!(observer.errors.lock().unwrap().is_empty());

    let res = backend.generate(GenerateRequest::new("", "Hi")).await;
    assert!(res.is_err());
    assert_eq!(observer.errors.lock().unwrap().len(), 1);

    return Ok(());
}
