//! Database layer for mealtrack: connection pooling, embedded migrations,
//! typed row models, and per-table query modules.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
