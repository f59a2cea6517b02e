// db/mod.rs
// Taxonomy database: pooled rusqlite access, schema, seed data and queries

pub mod cache;
pub mod pool;
mod schema;
pub mod seed;
pub mod taxonomy;

pub use pool::{DatabasePool, PoolStatus};
pub use schema::run_all_migrations;
pub use seed::{SeedStats, seed_default_taxonomy};
pub use taxonomy::{CodeRow, CrosswalkRow, KeywordRow, PatternRow, TopicRow};
