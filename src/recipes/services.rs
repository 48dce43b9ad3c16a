use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::auth::dto::AuthUser;
use crate::error::SubmitError;
use crate::recipes::dto::{Recipe, RecipeDraft};
use crate::records::{new_id, today};
use crate::validation::Validate;

fn check(recipe: &Recipe) -> Result<(), SubmitError> {
    let messages = recipe.validate();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(SubmitError::Invalid(messages))
    }
}

/// New recipe owned by `owner`.
#[instrument(skip(api, owner, draft), fields(user_id = %owner.id))]
pub async fn create_recipe(
    api: &ApiClient,
    owner: &AuthUser,
    draft: RecipeDraft,
) -> Result<Recipe, SubmitError> {
    let now = today();
    let recipe = Recipe {
        id: new_id(),
        user_id: owner.id.clone(),
        name: draft.name,
        short_description: draft.short_description,
        cook_time: draft.cook_time,
        products: draft.products,
        picture: draft.picture,
        long_description: draft.long_description,
        tags: draft.tags,
        created_at: now.clone(),
        updated_at: now,
    };
    check(&recipe)?;
    Recipe::create(api, &recipe)
        .await
        .map_err(SubmitError::rejected)?;
    info!(recipe_id = %recipe.id, "recipe created");
    Ok(recipe)
}

#[instrument(skip(api, actor, existing, changes), fields(recipe_id = %existing.id))]
pub async fn edit_recipe(
    api: &ApiClient,
    actor: &AuthUser,
    existing: &Recipe,
    changes: RecipeDraft,
) -> Result<Recipe, SubmitError> {
    if !actor.can_modify_recipe(existing) {
        return Err(SubmitError::Forbidden);
    }
    let recipe = Recipe {
        id: existing.id.clone(),
        user_id: existing.user_id.clone(),
        name: changes.name,
        short_description: changes.short_description,
        cook_time: changes.cook_time,
        products: changes.products,
        picture: changes.picture,
        long_description: changes.long_description,
        tags: changes.tags,
        created_at: existing.created_at.clone(),
        updated_at: today(),
    };
    check(&recipe)?;
    Recipe::update(api, &recipe)
        .await
        .map_err(SubmitError::rejected)?;
    Ok(recipe)
}

#[instrument(skip(api, actor, recipe), fields(recipe_id = %recipe.id, actor = %actor.id))]
pub async fn delete_recipe(
    api: &ApiClient,
    actor: &AuthUser,
    recipe: &Recipe,
) -> Result<(), SubmitError> {
    if !actor.can_modify_recipe(recipe) {
        return Err(SubmitError::Forbidden);
    }
    Recipe::delete(api, &recipe.id)
        .await
        .map_err(SubmitError::rejected)?;
    info!("recipe deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RetryPolicy;
    use crate::testing::RecordingTransport;
    use crate::users::dto::Role;
    use reqwest::Method;
    use std::sync::Arc;
    use url::Url;

    fn api(transport: Arc<RecordingTransport>) -> ApiClient {
        ApiClient::new(
            Url::parse("http://api.test").unwrap(),
            transport,
            RetryPolicy::default(),
        )
    }

    fn user(id: &str, role: Role) -> AuthUser {
        AuthUser {
            id: id.into(),
            name: "Cook".into(),
            username: "cook".into(),
            role,
        }
    }

    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: "Borscht".into(),
            short_description: "Beet soup".into(),
            cook_time: 90.0,
            products: vec!["beet".into(), "cabbage".into()],
            picture: "https://example.com/borscht.png".into(),
            long_description: "Boil everything.".into(),
            tags: vec!["soup".into()],
        }
    }

    #[tokio::test]
    async fn create_assigns_owner_and_dates() {
        let transport = Arc::new(RecordingTransport::ok());
        let recipe = create_recipe(&api(transport.clone()), &user("u1", Role::User), draft())
            .await
            .expect("created");

        assert_eq!(recipe.user_id, "u1");
        assert_eq!(recipe.created_at, today());
        let seen = transport.seen();
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].url.path(), "/recipes");
        assert_eq!(seen[0].body.as_ref().unwrap()["tags"][0], "soup");
    }

    #[tokio::test]
    async fn invalid_recipe_lists_messages_in_order() {
        let transport = Arc::new(RecordingTransport::ok());
        let err = create_recipe(
            &api(transport.clone()),
            &user("u1", Role::User),
            RecipeDraft {
                name: String::new(),
                cook_time: 0.0,
                picture: "not a url".into(),
                ..draft()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.messages(),
            vec![
                "Name is required!",
                "Cook time must be positive number!",
                "Picture url must be valid url!"
            ]
        );
        assert!(transport.seen().is_empty());
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_mutate() {
        let transport = Arc::new(RecordingTransport::ok());
        let api = api(transport.clone());
        let recipe = create_recipe(&api, &user("u1", Role::User), draft())
            .await
            .expect("created");

        let stranger = user("u2", Role::User);
        assert_eq!(
            delete_recipe(&api, &stranger, &recipe).await.unwrap_err(),
            SubmitError::Forbidden
        );
        assert_eq!(
            edit_recipe(&api, &stranger, &recipe, draft())
                .await
                .unwrap_err(),
            SubmitError::Forbidden
        );
        assert_eq!(transport.seen().len(), 1);

        let edited = edit_recipe(
            &api,
            &user("u1", Role::User),
            &recipe,
            RecipeDraft {
                name: "Green borscht".into(),
                ..draft()
            },
        )
        .await
        .expect("edited");
        assert_eq!(edited.id, recipe.id);
        assert_eq!(edited.user_id, "u1");

        delete_recipe(&api, &user("a1", Role::Admin), &recipe)
            .await
            .expect("admin delete");
        let seen = transport.seen();
        assert_eq!(seen[1].method, Method::PUT);
        assert_eq!(seen[2].method, Method::DELETE);
        assert_eq!(seen[2].url.path(), format!("/recipes/{}", recipe.id));
    }
}
