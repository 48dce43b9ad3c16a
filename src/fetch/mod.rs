mod coordinator;
pub mod retry;
pub mod state;

use reqwest::Method;
use url::Url;

pub use coordinator::RequestCoordinator;
pub use retry::RetryPolicy;
pub use state::{FetchState, Outcome, Retrigger};

/// What a subscription reads: re-evaluated whenever either part changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub endpoint: Url,
    pub method: Method,
}

impl FetchRequest {
    pub fn new(endpoint: Url, method: Method) -> Self {
        Self { endpoint, method }
    }

    pub fn get(endpoint: Url) -> Self {
        Self::new(endpoint, Method::GET)
    }
}
