use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::auth::dto::AuthUser;
use crate::auth::services::SessionAuthenticator;
use crate::error::SubmitError;
use crate::records::{new_id, today};
use crate::users::dto::{Role, Status, User, UserDraft};
use crate::validation::Validate;

fn check(user: &User) -> Result<(), SubmitError> {
    let messages = user.validate();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(SubmitError::Invalid(messages))
    }
}

fn new_user(draft: UserDraft) -> User {
    let now = today();
    let mut user = User {
        id: new_id(),
        name: draft.name,
        username: draft.username,
        password: draft.password,
        gender: draft.gender,
        role: draft.role,
        profile_picture: draft.profile_picture,
        description: draft.description,
        status: Status::Active,
        created_at: now.clone(),
        updated_at: now,
    };
    user.apply_default_picture();
    user
}

/// Admin form: create a user without signing in as them.
#[instrument(skip(api, draft), fields(username = %draft.username))]
pub async fn create_user(api: &ApiClient, draft: UserDraft) -> Result<User, SubmitError> {
    let user = new_user(draft);
    check(&user)?;
    User::create(api, &user)
        .await
        .map_err(SubmitError::rejected)?;
    info!(user_id = %user.id, "user created");
    Ok(user)
}

/// Public sign-up: always a regular user, signed in on success.
#[instrument(skip(api, auth, draft), fields(username = %draft.username))]
pub async fn register(
    api: &ApiClient,
    auth: &SessionAuthenticator,
    draft: UserDraft,
) -> Result<AuthUser, SubmitError> {
    let user = new_user(UserDraft {
        role: Role::User,
        ..draft
    });
    check(&user)?;
    User::create(api, &user)
        .await
        .map_err(SubmitError::rejected)?;
    info!(user_id = %user.id, "user registered");
    Ok(auth.authenticate(&user.username, &user.password).await?)
}

/// Applies `changes` to `existing`, keeping its id and creation date.
#[instrument(skip(api, existing, changes), fields(user_id = %existing.id))]
pub async fn edit_user(
    api: &ApiClient,
    existing: &User,
    changes: UserDraft,
) -> Result<User, SubmitError> {
    let mut user = User {
        id: existing.id.clone(),
        name: changes.name,
        username: changes.username,
        password: changes.password,
        gender: changes.gender,
        role: changes.role,
        profile_picture: changes.profile_picture,
        description: changes.description,
        status: changes.status,
        created_at: existing.created_at.clone(),
        updated_at: today(),
    };
    user.apply_default_picture();
    check(&user)?;
    User::update(api, &user)
        .await
        .map_err(SubmitError::rejected)?;
    Ok(user)
}

#[instrument(skip(api, actor, target), fields(actor = %actor.id, target = %target.id))]
pub async fn delete_user(
    api: &ApiClient,
    actor: &AuthUser,
    target: &User,
) -> Result<(), SubmitError> {
    if !actor.can_delete_user(target) {
        return Err(SubmitError::Forbidden);
    }
    User::delete(api, &target.id)
        .await
        .map_err(SubmitError::rejected)?;
    info!("user deleted");
    Ok(())
}
