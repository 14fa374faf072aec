//! Core types and trait definitions for the guci flashcard store.
//!
//! This crate is free of parsing and database dependencies. All other
//! crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod card;
pub mod error;
pub mod order;
pub mod store;

pub use error::{Error, Result};
