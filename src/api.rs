use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::fetch::{FetchRequest, RequestCoordinator, RetryPolicy};
use crate::transport::{HttpRequest, HttpResponse, Transport};

pub const USERS: &str = "users";
pub const RECIPES: &str = "recipes";

/// Resolves collection paths against the configured base URL and issues
/// single, non-retried calls.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(base: Url, transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self {
            base,
            transport,
            retry,
        }
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// `/{collection}`
    pub fn collection_url(&self, collection: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(&format!("/{}", collection))?)
    }

    /// `/{collection}/{id}`
    pub fn item_url(&self, collection: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = self.collection_url(collection)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Endpoint(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        Ok(url)
    }

    /// Subscribes to a collection read with the configured retry policy.
    pub fn subscribe<T, E>(&self, collection: &str) -> Result<RequestCoordinator<T, E>, ApiError>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
        E: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let request = FetchRequest::get(self.collection_url(collection)?);
        Ok(RequestCoordinator::subscribe(
            self.transport.clone(),
            request,
            self.retry,
        ))
    }

    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method.clone();
        let path = request.url.path().to_string();
        let response = self
            .transport
            .send(request, &CancellationToken::new())
            .await?;
        if !response.is_success() {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            warn!(%method, %path, status = response.status, "request rejected");
            return Err(ApiError::Status {
                status: response.status,
                body,
            });
        }
        debug!(%method, %path, status = response.status, "request accepted");
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.send(HttpRequest::get(url)).await?;
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn send_json<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<HttpResponse, ApiError> {
        let request = HttpRequest::new(method, url).with_json(body)?;
        self.send(request).await
    }

    pub async fn delete(&self, url: Url) -> Result<(), ApiError> {
        self.send(HttpRequest::new(Method::DELETE, url)).await?;
        Ok(())
    }
}
