//! Rule tables for the user and recipe forms.
//!
//! Every rule of an entity is evaluated, in table order, regardless of
//! earlier failures; each failing rule contributes its message once.

use lazy_static::lazy_static;
use regex::Regex;

use crate::recipes::dto::Recipe;
use crate::users::dto::User;

/// A predicate that holds when the entity breaks the rule.
pub struct Rule<T> {
    pub violated: fn(&T) -> bool,
    pub message: &'static str,
}

impl<T> Rule<T> {
    fn new(message: &'static str, violated: fn(&T) -> bool) -> Self {
        Self { violated, message }
    }
}

/// Entities that carry their own rule table.
pub trait Validate: Sized + 'static {
    fn rules() -> &'static [Rule<Self>];

    fn validate(&self) -> Vec<String> {
        validate(self)
    }
}

pub fn validate<T: Validate>(entity: &T) -> Vec<String> {
    T::rules()
        .iter()
        .filter(|rule| (rule.violated)(entity))
        .map(|rule| rule.message.to_string())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z_]*$").unwrap();
    static ref RECIPE_RULES: Vec<Rule<Recipe>> = vec![
        Rule::new("Name is required!", |r: &Recipe| r.name.is_empty()),
        Rule::new("Name length must less than 80!", |r: &Recipe| char_len(&r.name) > 80),
        Rule::new("Short description length must less than 256!", |r: &Recipe| {
            char_len(&r.short_description) > 256
        }),
        // NaN is not a positive number either.
        Rule::new("Cook time must be positive number!", |r: &Recipe| !(r.cook_time > 0.0)),
        Rule::new("Products are required!", |r: &Recipe| r.products.is_empty()),
        Rule::new("Long description length must less than 2024!", |r: &Recipe| {
            char_len(&r.long_description) > 2024
        }),
        Rule::new("Picture url is required!", |r: &Recipe| r.picture.is_empty()),
        Rule::new("Picture url must be valid url!", |r: &Recipe| {
            !r.picture.is_empty() && !is_url(&r.picture)
        }),
    ];
    static ref USER_RULES: Vec<Rule<User>> = vec![
        Rule::new("Name is required!", |u: &User| u.name.is_empty()),
        Rule::new("Username is required!", |u: &User| u.username.is_empty()),
        Rule::new("Username length must less than 15!", |u: &User| char_len(&u.username) > 15),
        Rule::new("Username must contain only a-z, A-Z and _", |u: &User| {
            !USERNAME_RE.is_match(&u.username)
        }),
        Rule::new("Password must be at least 8 symbol!", |u: &User| char_len(&u.password) < 8),
        Rule::new("Password must contain at least 1 digit!", |u: &User| {
            !u.password.chars().any(is_digit)
        }),
        Rule::new("Password must contain at least 1 special symbol!", |u: &User| {
            !u.password.chars().any(|c| !is_digit(c) && !is_letter(c))
        }),
        Rule::new("Profile picture url is required!", |u: &User| u.profile_picture.is_empty()),
        Rule::new("Profile picture url must be valid url!", |u: &User| {
            !u.profile_picture.is_empty() && !is_url(&u.profile_picture)
        }),
        Rule::new("Description length must less than 512!", |u: &User| {
            char_len(&u.description) > 512
        }),
    ];
}

impl Validate for Recipe {
    fn rules() -> &'static [Rule<Self>] {
        &RECIPE_RULES
    }
}

impl Validate for User {
    fn rules() -> &'static [Rule<Self>] {
        &USER_RULES
    }
}
