#[cfg(test)]
#[path = "ollama_codec_test.rs"]
mod tests;

use serde_derive::Deserialize;

use crate::domain::models::ClientError;
use crate::domain::models::GenerateRequest;
use crate::domain::models::GenerateResponse;

/// Raw prefix of a body or stream line carrying an error instead of a
/// response.
pub const ERROR_SENTINEL: &str = "{\"error";

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

pub fn encode_request(req: &GenerateRequest) -> Result<String, ClientError> {
    return Ok(serde_json::to_string(req)?);
}

pub fn is_error_line(line: &str) -> bool {
    return line.starts_with(ERROR_SENTINEL);
}

/// Decodes a single response object, either a whole body or one streamed line.
pub fn decode_response(text: &str) -> Result<GenerateResponse, ClientError> {
    return serde_json::from_str::<GenerateResponse>(text).map_err(|err| {
        return ClientError::Decode(format!("{err}: {text}"));
    });
}

/// Decodes a non streamed body. Error payloads become
/// [`ClientError::Backend`] with the backend's message.
pub fn decode_body(body: &str) -> Result<GenerateResponse, ClientError> {
    let body = body.trim();
    if is_error_line(body) {
        let message = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(res) => res.error,
            Err(_) => body.to_string(),
        };

        return Err(ClientError::Backend(message));
    }

    return decode_response(body);
}
