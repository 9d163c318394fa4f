// src/handlers/mod.rs
pub mod error;
pub mod fund;
pub mod page;
