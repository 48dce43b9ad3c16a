use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::api::{ApiClient, RECIPES, USERS};
use crate::auth::dto::AuthUser;
use crate::fetch::Outcome;
use crate::recipes::dto::{Recipe, RecipeDraft};
use crate::recipes::query::{process_raw, AuthorDirectory, ALL};
use crate::recipes::services as recipe_services;
use crate::state::AppState;
use crate::users::dto::{Gender, Role, Status, User, UserDraft};
use crate::users::services as user_services;

/// Consulted before stdin whenever a command needs a password.
pub const PASSWORD_ENV: &str = "RECIPEBOOK_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "recipebook", version, about = "Browse and manage a shared recipe book")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    ///
    /// The password is taken from RECIPEBOOK_PASSWORD, or else from the
    /// first line of stdin.
    Login {
        username: String,
        #[arg(skip)]
        password: String,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List recipes
    Recipes {
        /// "All" or a number
        #[arg(long, default_value = ALL)]
        limit: String,
        /// "Asc" or "Desc" by creation date
        #[arg(long, default_value = "Asc")]
        sort: String,
        /// Author display name or "All"
        #[arg(long, default_value = ALL)]
        author: String,
        /// Required tag, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List users (admins only)
    Users,
    /// Create an account and sign in
    Register(UserArgs),
    /// Create a user without signing in (admins only)
    AddUser {
        #[command(flatten)]
        user: UserArgs,
        #[arg(long, default_value_t = Role::User)]
        role: Role,
    },
    /// Change a user's profile (admins only)
    EditUser {
        id: String,
        #[command(flatten)]
        changes: UserChanges,
    },
    AddRecipe(RecipeArgs),
    /// Change a recipe you own, or any recipe as an admin
    EditRecipe {
        id: String,
        #[command(flatten)]
        changes: RecipeChanges,
    },
    DeleteRecipe {
        id: String,
    },
    DeleteUser {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct UserArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub username: String,
    #[arg(skip)]
    pub password: String,
    #[arg(long, default_value_t = Gender::Male)]
    pub gender: Gender,
    #[arg(long, default_value = "")]
    pub picture: String,
    #[arg(long, default_value = "")]
    pub description: String,
}

impl From<UserArgs> for UserDraft {
    fn from(args: UserArgs) -> Self {
        UserDraft {
            name: args.name,
            username: args.username,
            password: args.password,
            gender: args.gender,
            profile_picture: args.picture,
            description: args.description,
            ..UserDraft::default()
        }
    }
}

/// Fields left out keep their current value.
#[derive(Debug, Default, Args)]
pub struct UserChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    /// Read a new password the way `login` does
    #[arg(long)]
    pub set_password: bool,
    #[arg(skip)]
    pub password: Option<String>,
    #[arg(long)]
    pub gender: Option<Gender>,
    #[arg(long)]
    pub role: Option<Role>,
    #[arg(long)]
    pub status: Option<Status>,
    #[arg(long)]
    pub picture: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

impl UserChanges {
    fn apply(self, existing: &User) -> UserDraft {
        UserDraft {
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            username: self.username.unwrap_or_else(|| existing.username.clone()),
            password: self.password.unwrap_or_else(|| existing.password.clone()),
            gender: self.gender.unwrap_or(existing.gender),
            role: self.role.unwrap_or(existing.role),
            profile_picture: self
                .picture
                .unwrap_or_else(|| existing.profile_picture.clone()),
            description: self
                .description
                .unwrap_or_else(|| existing.description.clone()),
            status: self.status.unwrap_or(existing.status),
        }
    }
}

#[derive(Debug, Args)]
pub struct RecipeArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long = "short", default_value = "")]
    pub short_description: String,
    /// Minutes
    #[arg(long)]
    pub cook_time: f64,
    #[arg(long = "product")]
    pub products: Vec<String>,
    #[arg(long)]
    pub picture: String,
    #[arg(long = "long", default_value = "")]
    pub long_description: String,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl From<RecipeArgs> for RecipeDraft {
    fn from(args: RecipeArgs) -> Self {
        RecipeDraft {
            name: args.name,
            short_description: args.short_description,
            cook_time: args.cook_time,
            products: args.products,
            picture: args.picture,
            long_description: args.long_description,
            tags: args.tags,
        }
    }
}

/// Fields left out keep their current value. Repeating `--product` or
/// `--tag` replaces the whole list.
#[derive(Debug, Default, Args)]
pub struct RecipeChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "short")]
    pub short_description: Option<String>,
    #[arg(long)]
    pub cook_time: Option<f64>,
    #[arg(long = "product")]
    pub products: Vec<String>,
    #[arg(long)]
    pub picture: Option<String>,
    #[arg(long = "long")]
    pub long_description: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Remove every tag
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
}

impl RecipeChanges {
    fn apply(self, existing: &Recipe) -> RecipeDraft {
        let tags = if self.clear_tags {
            Vec::new()
        } else if self.tags.is_empty() {
            existing.tags.clone()
        } else {
            self.tags
        };
        RecipeDraft {
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            short_description: self
                .short_description
                .unwrap_or_else(|| existing.short_description.clone()),
            cook_time: self.cook_time.unwrap_or(existing.cook_time),
            products: if self.products.is_empty() {
                existing.products.clone()
            } else {
                self.products
            },
            picture: self.picture.unwrap_or_else(|| existing.picture.clone()),
            long_description: self
                .long_description
                .unwrap_or_else(|| existing.long_description.clone()),
            tags,
        }
    }
}

pub async fn run(cli: Cli, state: &AppState) -> anyhow::Result<()> {
    let command = with_password(cli.command).await?;
    let output = execute(command, state).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Runs one command and returns what it prints.
pub async fn execute(command: Command, state: &AppState) -> anyhow::Result<Value> {
    let api = &state.api;
    let session = &state.session;

    match command {
        Command::Login { username, password } => {
            let user = session.authenticate(&username, &password).await?;
            Ok(serde_json::to_value(user)?)
        }
        Command::Logout => {
            session.logout().await?;
            Ok(Value::Null)
        }
        Command::Whoami => Ok(serde_json::to_value(session.current_identity())?),
        Command::Recipes {
            limit,
            sort,
            author,
            tags,
        } => {
            let (recipes, users) = tokio::try_join!(
                load::<Recipe>(api, RECIPES),
                load::<User>(api, USERS)
            )?;
            let authors = AuthorDirectory::from_users(&users);
            let selected = process_raw(&recipes, &authors, &limit, &sort, &author, &tags)
                .with_context(|| format!("invalid view limit {:?}", limit))?;
            let rows: Vec<Value> = selected
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "name": r.name,
                        "author": authors.display_name(&r.user_id),
                        "summary": r.summary(),
                        "cook_time": r.cook_time,
                        "tags": r.tags,
                        "created_at": r.created_at,
                    })
                })
                .collect();
            Ok(Value::Array(rows))
        }
        Command::Users => {
            require_admin(state)?;
            let users = load::<User>(api, USERS).await?;
            let rows: Vec<Value> = users
                .iter()
                .map(|u| {
                    json!({
                        "id": u.id,
                        "name": u.name,
                        "username": u.username,
                        "role": u.role,
                        "status": u.status,
                    })
                })
                .collect();
            Ok(Value::Array(rows))
        }
        Command::Register(args) => {
            let user = user_services::register(api, session, args.into()).await?;
            Ok(serde_json::to_value(user)?)
        }
        Command::AddUser { user, role } => {
            require_admin(state)?;
            let draft = UserDraft {
                role,
                ..UserDraft::from(user)
            };
            let created = user_services::create_user(api, draft).await?;
            Ok(json!({ "id": created.id, "username": created.username }))
        }
        Command::EditUser { id, changes } => {
            require_admin(state)?;
            let existing = User::find(api, &id).await?;
            let user = user_services::edit_user(api, &existing, changes.apply(&existing)).await?;
            info!(user_id = %id, "edited");
            Ok(json!({
                "id": user.id,
                "username": user.username,
                "role": user.role,
                "status": user.status,
                "updated_at": user.updated_at,
            }))
        }
        Command::AddRecipe(args) => {
            let owner = require_identity(state)?;
            let recipe = recipe_services::create_recipe(api, &owner, args.into()).await?;
            Ok(serde_json::to_value(recipe)?)
        }
        Command::EditRecipe { id, changes } => {
            let actor = require_identity(state)?;
            let existing = Recipe::find(api, &id).await?;
            let recipe =
                recipe_services::edit_recipe(api, &actor, &existing, changes.apply(&existing))
                    .await?;
            info!(recipe_id = %id, "edited");
            Ok(serde_json::to_value(recipe)?)
        }
        Command::DeleteRecipe { id } => {
            let actor = require_identity(state)?;
            let recipe = Recipe::find(api, &id).await?;
            recipe_services::delete_recipe(api, &actor, &recipe).await?;
            info!(recipe_id = %id, "deleted");
            Ok(json!({ "deleted": id }))
        }
        Command::DeleteUser { id } => {
            let actor = require_admin(state)?;
            let target = User::find(api, &id).await?;
            user_services::delete_user(api, &actor, &target).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

/// Fills in the passwords that never travel on the command line.
async fn with_password(command: Command) -> anyhow::Result<Command> {
    Ok(match command {
        Command::Login { username, .. } => Command::Login {
            username,
            password: read_password().await?,
        },
        Command::Register(mut args) => {
            args.password = read_password().await?;
            Command::Register(args)
        }
        Command::AddUser { mut user, role } => {
            user.password = read_password().await?;
            Command::AddUser { user, role }
        }
        Command::EditUser { id, mut changes } if changes.set_password => {
            changes.password = Some(read_password().await?);
            Command::EditUser { id, changes }
        }
        other => other,
    })
}

async fn read_password() -> anyhow::Result<String> {
    if let Ok(value) = std::env::var(PASSWORD_ENV) {
        return password_from_line(&value);
    }
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("read password from stdin")?;
    password_from_line(&line)
}

fn password_from_line(line: &str) -> anyhow::Result<String> {
    let password = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
    if password.is_empty() {
        bail!("no password given: set {} or pipe it on stdin", PASSWORD_ENV);
    }
    Ok(password.to_string())
}

fn require_identity(state: &AppState) -> anyhow::Result<AuthUser> {
    state
        .session
        .current_identity()
        .ok_or_else(|| anyhow!("not logged in"))
}

fn require_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let user = require_identity(state)?;
    if !user.can_manage_users() {
        bail!("only admins can manage users");
    }
    Ok(user)
}

/// Reads a collection through a subscription and waits for it to settle.
async fn load<T>(api: &ApiClient, collection: &str) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let subscription = api.subscribe::<Vec<T>, Value>(collection)?;
    let state = subscription.settled().await;
    subscription.close();

    match state.outcome {
        Some(Outcome::Success) => state
            .data
            .ok_or_else(|| anyhow!("{}: response could not be parsed", collection)),
        Some(Outcome::DomainError) => match state.error {
            Some(body) => bail!("{}: server returned an error: {}", collection, body),
            None => bail!("{}: server returned an error", collection),
        },
        Some(Outcome::TransportFailed) | None => {
            bail!("{}: server unreachable", collection)
        }
    }
}
