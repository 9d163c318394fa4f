// src/services/mod.rs
pub mod charts;
pub mod export;
pub mod metrics;
pub mod normalizer;
pub mod okanebox;
pub mod pipeline;
