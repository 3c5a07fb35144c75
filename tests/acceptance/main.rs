//! End-to-end behavior of the record store through the command API.
//!
//! Every test opens a schema-enforcing database in a temporary directory
//! and drives it only through `Executor::execute`, checking the status
//! codes a REST boundary would answer with.

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod lifecycle;
mod patching;
mod references;
