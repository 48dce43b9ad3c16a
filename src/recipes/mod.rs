pub mod dto;
pub mod query;
mod repo;
pub mod services;

pub use dto::{Recipe, RecipeDraft};
