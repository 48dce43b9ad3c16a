use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, USERS};
use crate::auth::dto::AuthUser;
use crate::error::AuthError;
use crate::storage::SessionStorage;
use crate::transport::HttpRequest;

/// Storage key of the persisted identity.
pub const SESSION_KEY: &str = "user";

/// Owns the signed-in identity for the lifetime of the process.
///
/// Construct with [`SessionAuthenticator::init`] (or `new` + `hydrate`) and
/// hand the instance to whoever needs to read or change the identity.
pub struct SessionAuthenticator {
    api: ApiClient,
    storage: Arc<dyn SessionStorage>,
    identity: watch::Sender<Option<AuthUser>>,
    loading: watch::Sender<bool>,
}

impl SessionAuthenticator {
    /// Not hydrated yet: `loading` is true and no identity is known.
    pub fn new(api: ApiClient, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            api,
            storage,
            identity: watch::channel(None).0,
            loading: watch::channel(true).0,
        }
    }

    pub async fn init(api: ApiClient, storage: Arc<dyn SessionStorage>) -> Self {
        let auth = Self::new(api, storage);
        auth.hydrate().await;
        auth
    }

    /// Adopts the persisted identity, if any. Never touches the network.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) {
        self.loading.send_replace(true);
        match self.storage.get_item(SESSION_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<AuthUser>(&raw) {
                Ok(user) => {
                    info!(user_id = %user.id, username = %user.username, "session restored");
                    self.identity.send_replace(Some(user));
                }
                Err(e) => warn!(error = %e, "ignoring unreadable session record"),
            },
            Ok(None) => debug!("no stored session"),
            Err(e) => warn!(error = %e, "session storage unavailable"),
        }
        self.loading.send_replace(false);
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn current_identity(&self) -> Option<AuthUser> {
        self.identity.borrow().clone()
    }

    pub fn watch_identity(&self) -> watch::Receiver<Option<AuthUser>> {
        self.identity.subscribe()
    }

    pub fn watch_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Looks the credentials up on `/users` and, on a match, persists and
    /// adopts the projected identity.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthUser, AuthError> {
        let mut url = self
            .api
            .collection_url(USERS)
            .map_err(|_| AuthError::Unreachable)?;
        // Credentials travel in the query string and end up in server and proxy logs.
        // TODO: send them in a POST body once the service exposes a login endpoint.
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("password", password);

        let response = match self
            .api
            .transport()
            .send(HttpRequest::get(url), &CancellationToken::new())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "login request failed");
                return Err(AuthError::Unreachable);
            }
        };

        if !response.is_success() {
            warn!(status = response.status, "login rejected");
            return Err(AuthError::UserNotFound);
        }

        let body: Value =
            serde_json::from_slice(&response.body).map_err(|_| AuthError::MalformedResponse)?;
        let first = match body.get(0) {
            Some(first) if !first.is_null() => first,
            _ => {
                debug!("no user matched the credentials");
                return Err(AuthError::UserNotFound);
            }
        };
        let user = AuthUser::deserialize(first).map_err(|e| {
            warn!(error = %e, "user record has an unexpected shape");
            AuthError::MalformedResponse
        })?;

        match serde_json::to_string(&user) {
            Ok(raw) => {
                if let Err(e) = self.storage.set_item(SESSION_KEY, &raw).await {
                    warn!(error = %e, "failed to persist session, keeping it in memory only");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode session"),
        }
        self.identity.send_replace(Some(user.clone()));
        info!(user_id = %user.id, role = ?user.role, "logged in");
        Ok(user)
    }

    /// Forgets the identity in memory and in storage.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> anyhow::Result<()> {
        let cleared = self.storage.remove_item(SESSION_KEY).await;
        self.identity.send_replace(None);
        info!("logged out");
        cleared.context("clear stored session")
    }
}
