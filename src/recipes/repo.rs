use reqwest::Method;
use tracing::instrument;

use crate::api::{ApiClient, RECIPES};
use crate::error::ApiError;
use crate::recipes::dto::Recipe;

impl Recipe {
    #[instrument(skip(api))]
    pub async fn find(api: &ApiClient, id: &str) -> Result<Recipe, ApiError> {
        api.get_json(api.item_url(RECIPES, id)?).await
    }

    #[instrument(skip(api, recipe), fields(recipe_id = %recipe.id, user_id = %recipe.user_id))]
    pub async fn create(api: &ApiClient, recipe: &Recipe) -> Result<(), ApiError> {
        api.send_json(Method::POST, api.collection_url(RECIPES)?, recipe)
            .await?;
        Ok(())
    }

    #[instrument(skip(api, recipe), fields(recipe_id = %recipe.id))]
    pub async fn update(api: &ApiClient, recipe: &Recipe) -> Result<(), ApiError> {
        api.send_json(Method::PUT, api.item_url(RECIPES, &recipe.id)?, recipe)
            .await?;
        Ok(())
    }

    #[instrument(skip(api))]
    pub async fn delete(api: &ApiClient, id: &str) -> Result<(), ApiError> {
        api.delete(api.item_url(RECIPES, id)?).await
    }
}
