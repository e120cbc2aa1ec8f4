//! Core types and trait definitions for the tweetwatch store.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! implement [`store::TweetStore`]; the binary and the label workflow depend
//! only on that abstraction.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod error;
pub mod label;
pub mod profile;
pub mod schema;
pub mod store;
pub mod tweet;
pub mod workflow;

pub use error::{Error, Result};
