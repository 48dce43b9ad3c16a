use std::collections::HashMap;
use std::str::FromStr;

use crate::recipes::dto::Recipe;
use crate::users::dto::User;

pub const ALL: &str = "All";
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewLimit {
    #[default]
    All,
    First(usize),
}

impl FromStr for ViewLimit {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL {
            return Ok(ViewLimit::All);
        }
        s.trim().parse().map(ViewLimit::First)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything but `"Asc"` sorts newest first.
    pub fn from_label(s: &str) -> Self {
        if s == "Asc" {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

impl FromStr for SortDirection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthorFilter {
    #[default]
    All,
    Named(String),
}

impl From<&str> for AuthorFilter {
    fn from(s: &str) -> Self {
        if s == ALL {
            AuthorFilter::All
        } else {
            AuthorFilter::Named(s.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeQuery {
    pub limit: ViewLimit,
    pub sort: SortDirection,
    pub author: AuthorFilter,
    pub required_tags: Vec<String>,
}

/// Display names keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct AuthorDirectory {
    names: HashMap<String, String>,
}

impl AuthorDirectory {
    pub fn from_users(users: &[User]) -> Self {
        let names = users
            .iter()
            .map(|u| (u.id.clone(), u.name.clone()))
            .collect();
        Self { names }
    }

    pub fn insert(&mut self, user_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(user_id.into(), name.into());
    }

    pub fn display_name(&self, user_id: &str) -> &str {
        self.names
            .get(user_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_AUTHOR)
    }
}

/// Filters, stable-sorts by `created_at` and truncates a fetched collection.
pub fn process(recipes: &[Recipe], authors: &AuthorDirectory, query: &RecipeQuery) -> Vec<Recipe> {
    let mut selected: Vec<Recipe> = recipes
        .iter()
        .filter(|r| match &query.author {
            AuthorFilter::All => true,
            AuthorFilter::Named(name) => authors.display_name(&r.user_id) == name,
        })
        .filter(|r| query.required_tags.iter().all(|tag| r.tags.contains(tag)))
        .cloned()
        .collect();

    // sort_by is stable, so equal dates keep their input order in both directions.
    selected.sort_by(|a, b| {
        let ord = a.created_at.cmp(&b.created_at);
        match query.sort {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    if let ViewLimit::First(n) = query.limit {
        selected.truncate(n);
    }
    selected
}

/// String-argument form used by the command line.
pub fn process_raw(
    recipes: &[Recipe],
    authors: &AuthorDirectory,
    view_limit: &str,
    sort_direction: &str,
    author_filter: &str,
    required_tags: &[String],
) -> Result<Vec<Recipe>, std::num::ParseIntError> {
    let query = RecipeQuery {
        limit: view_limit.parse()?,
        sort: SortDirection::from_label(sort_direction),
        author: AuthorFilter::from(author_filter),
        required_tags: required_tags.to_vec(),
    };
    Ok(process(recipes, authors, &query))
}
