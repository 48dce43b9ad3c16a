use reqwest::Method;
use tracing::instrument;

use crate::api::{ApiClient, USERS};
use crate::error::ApiError;
use crate::users::dto::User;

impl User {
    #[instrument(skip(api))]
    pub async fn find(api: &ApiClient, id: &str) -> Result<User, ApiError> {
        api.get_json(api.item_url(USERS, id)?).await
    }

    /// Create a new user record.
    #[instrument(skip(api, user), fields(user_id = %user.id))]
    pub async fn create(api: &ApiClient, user: &User) -> Result<(), ApiError> {
        api.send_json(Method::POST, api.collection_url(USERS)?, user)
            .await?;
        Ok(())
    }

    /// Replace the stored record with `user`.
    #[instrument(skip(api, user), fields(user_id = %user.id))]
    pub async fn update(api: &ApiClient, user: &User) -> Result<(), ApiError> {
        api.send_json(Method::PUT, api.item_url(USERS, &user.id)?, user)
            .await?;
        Ok(())
    }

    #[instrument(skip(api))]
    pub async fn delete(api: &ApiClient, id: &str) -> Result<(), ApiError> {
        api.delete(api.item_url(USERS, id)?).await
    }
}
