// crates/bizclass-server/src/lib.rs
// bizclass - multi-strategy business industry classifier

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod cache;
pub mod codes;
pub mod combiner;
pub mod config;
pub mod context;
pub mod db;
pub mod entities;
pub mod error;
pub mod fuzzy;
pub mod http;
pub mod ml;
pub mod resilience;
pub mod service;
pub mod stats;
pub mod store;
pub mod strategies;
pub mod web;

pub use error::{ClassifierError, Result};
