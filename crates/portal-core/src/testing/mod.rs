//! Testing utilities for the portal setup crates.
//!
//! Database-backed tests are opt-in: they connect through
//! [`TestDatabase::from_env`], which reads `TEST_DATABASE_URL`, and skip
//! themselves when it is not set. Each test should work inside its own
//! [`IsolatedTestDb`] so migrations can be applied from a clean slate.

pub mod db;

pub use db::{IsolatedTestDb, TestDatabase};
