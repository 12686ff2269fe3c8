// src/lib.rs

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use routes::create_router;
