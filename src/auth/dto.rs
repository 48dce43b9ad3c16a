use serde::{Deserialize, Serialize};

use crate::recipes::dto::Recipe;
use crate::users::dto::{Role, User};

/// The only identity shape kept client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub role: Role,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may edit or delete any recipe, everyone else only their own.
    pub fn can_modify_recipe(&self, recipe: &Recipe) -> bool {
        self.is_admin() || self.id == recipe.user_id
    }

    pub fn can_manage_users(&self) -> bool {
        self.is_admin()
    }

    /// Admins cannot delete their own account.
    pub fn can_delete_user(&self, user: &User) -> bool {
        self.can_manage_users() && self.id != user.id
    }
}
