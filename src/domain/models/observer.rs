use std::sync::Arc;

use super::ClientError;

/// Receives raw traffic of every exchange, for monitoring.
pub trait Observer: Send + Sync {
    fn on_request(&self, raw: &str);
    fn on_response(&self, raw: &str);
    fn on_error(&self, err: &ClientError);
}

pub type ObserverBox = Arc<dyn Observer>;

#[derive(Default)]
pub struct NoopObserver {}

impl Observer for NoopObserver {
    fn on_request(&self, _raw: &str) {}
    fn on_response(&self, _raw: &str) {}
    fn on_error(&self, _err: &ClientError) {}
}
