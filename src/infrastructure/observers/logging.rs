use crate::domain::models::ClientError;
use crate::domain::models::Observer;

/// Writes raw traffic to the debug log.
#[derive(Default)]
pub struct TracingObserver {}

impl Observer for TracingObserver {
    fn on_request(&self, raw: &str) {
        tracing::debug!(raw, "Backend request");
    }

    fn on_response(&self, raw: &str) {
        tracing::debug!(raw, "Backend response");
    }

    fn on_error(&self, err: &ClientError) {
        tracing::error!(error = %err, retryable = err.is_retryable(), "Backend error");
    }
}
