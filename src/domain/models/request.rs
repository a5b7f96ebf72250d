#[cfg(test)]
#[path = "request_test.rs"]
mod tests;

use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Body of a `/api/generate` call.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub stream: bool,
    /// Continuation tokens of the previous turn. Opaque, forwarded as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    /// Generation knobs (temperature, seed, num_ctx...) passed through
    /// untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl GenerateRequest {
    pub fn new(model: &str, prompt: &str) -> GenerateRequest {
        return GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            ..GenerateRequest::default()
        };
    }

    pub fn with_context(mut self, context: Option<Vec<i64>>) -> GenerateRequest {
        self.context = context;
        return self;
    }

    /// Attaches an already base64 encoded image.
    pub fn with_image(mut self, encoded: String) -> GenerateRequest {
        self.images.get_or_insert_with(Vec::new).push(encoded);
        return self;
    }

    pub fn with_image_bytes(self, bytes: &[u8]) -> GenerateRequest {
        let encoded = b64.encode(bytes);
        return self.with_image(encoded);
    }

    pub fn with_option(mut self, key: &str, value: Value) -> GenerateRequest {
        self.options
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        return self;
    }
}
