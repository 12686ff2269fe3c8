// src/handlers/mod.rs

pub mod analysis;
pub mod quiz;
pub mod results;
