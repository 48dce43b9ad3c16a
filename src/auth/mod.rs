pub mod dto;
pub mod services;

pub use dto::AuthUser;
pub use services::{SessionAuthenticator, SESSION_KEY};
