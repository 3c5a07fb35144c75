//! Integration tests for the durable record log.
//!
//! These tests exercise the full lifecycle at the Database level
//! (open, write, close, reopen). Encoding and truncation of damaged tails
//! are covered by unit tests in crates/durability/src/.

#[path = "../common/mod.rs"]
mod common;

mod compaction;
mod reopen;
