use dentflow::Services;

use crate::error::ApiResult;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Runs `f` on the blocking pool. Service calls hold the database lock
    /// and do synchronous SQLite work, so handlers never run them inline.
    pub async fn run<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Services) -> dentflow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let services = self.services.clone();
        Ok(tokio::task::spawn_blocking(move || f(&services)).await??)
    }
}
