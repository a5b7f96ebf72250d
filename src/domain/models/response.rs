use serde_derive::Deserialize;
use serde_derive::Serialize;

/// A response object from `/api/generate`. While streaming, partial objects
/// carry only the newest fragment in `response` and leave the counters empty.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub load_duration: u64,
    #[serde(default)]
    pub prompt_eval_count: u64,
    #[serde(default)]
    pub prompt_eval_duration: u64,
    #[serde(default)]
    pub eval_count: u64,
    #[serde(default)]
    pub eval_duration: u64,
}

impl GenerateResponse {
    /// Terminal response standing in for an error line received mid stream.
    /// The raw line is kept verbatim as the text.
    pub fn from_error_line(model: &str, line: &str) -> GenerateResponse {
        return GenerateResponse {
            model: model.to_string(),
            response: line.to_string(),
            done: true,
            ..GenerateResponse::default()
        };
    }

    /// Output tokens per second, zero when the backend didn't report timings.
    pub fn tokens_per_second(&self) -> f64 {
        if self.eval_duration == 0 {
            return 0.0;
        }

        return self.eval_count as f64 / (self.eval_duration as f64 / 1_000_000_000.0);
    }
}
