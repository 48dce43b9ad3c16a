//! Fakes shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// A request as the fake saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: Url,
    pub body: Option<serde_json::Value>,
}

/// Replies per path when a route matches, otherwise with queued responses
/// in order, then with `fallback`.
pub struct RecordingTransport {
    routes: Mutex<HashMap<String, (u16, String)>>,
    replies: Mutex<VecDeque<Result<(u16, String), TransportError>>>,
    fallback: Result<(u16, String), TransportError>,
    seen: Mutex<Vec<Recorded>>,
}

impl RecordingTransport {
    pub fn new(fallback: Result<(u16, &str), TransportError>) -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            replies: Mutex::new(VecDeque::new()),
            fallback: fallback.map(|(status, body)| (status, body.to_string())),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn ok() -> Self {
        Self::new(Ok((201, "{}")))
    }

    pub fn then(self, status: u16, body: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok((status, body.to_string())));
        self
    }

    pub fn route(self, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    pub fn seen(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        request: HttpRequest,
        _cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(Recorded {
            method: request.method.clone(),
            url: request.url.clone(),
            body: request
                .body
                .as_ref()
                .map(|b| serde_json::from_slice(b).expect("json request body")),
        });
        if let Some((status, body)) = self.routes.lock().unwrap().get(request.url.path()) {
            return Ok(HttpResponse {
                status: *status,
                body: Bytes::from(body.clone()),
            });
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        reply.map(|(status, body)| HttpResponse {
            status,
            body: Bytes::from(body),
        })
    }
}
