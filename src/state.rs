use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::services::SessionAuthenticator;
use crate::config::AppConfig;
use crate::fetch::RetryPolicy;
use crate::storage::{FileSessionStorage, SessionStorage};
use crate::transport::{ReqwestTransport, Transport};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: ApiClient,
    pub session: Arc<SessionAuthenticator>,
}

impl AppState {
    /// Wires the HTTP transport and file-backed session, then restores any
    /// persisted identity.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let transport = Arc::new(ReqwestTransport::new(&config.fetch)?) as Arc<dyn Transport>;
        let storage = Arc::new(FileSessionStorage::new(config.session_file.clone()))
            as Arc<dyn SessionStorage>;

        Ok(Self::from_parts(config, transport, storage).await)
    }

    pub async fn from_parts(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let api = ApiClient::new(
            config.api_url.clone(),
            transport,
            RetryPolicy::from(&config.fetch),
        );
        let session = Arc::new(SessionAuthenticator::init(api.clone(), storage).await);
        Self {
            config: Arc::new(config),
            api,
            session,
        }
    }

    #[cfg(test)]
    pub async fn fake(transport: Arc<dyn Transport>) -> Self {
        use crate::config::FetchConfig;
        use crate::storage::MemorySessionStorage;

        let config = AppConfig {
            api_url: url::Url::parse("http://api.test").expect("fake url"),
            session_file: std::env::temp_dir().join("recipebook-fake-session.json"),
            fetch: FetchConfig {
                backoff_base_ms: 10,
                ..FetchConfig::default()
            },
        };
        Self::from_parts(config, transport, Arc::new(MemorySessionStorage::new())).await
    }
}
