pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod recipes;
pub mod records;
pub mod state;
pub mod storage;
#[cfg(test)]
mod testing;
pub mod transport;
pub mod users;
pub mod validation;
