pub mod dto;
mod repo;
pub mod services;

pub use dto::{Gender, Role, Status, User, UserDraft};
