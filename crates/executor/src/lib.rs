//! # thingdb executor
//!
//! Command layer over the record store. A REST boundary (or an SDK) turns
//! each request into a [`Command`], hands it to an [`Executor`], and maps the
//! result to a response with [`Output::status_code`] and
//! [`Error::status_code`].
//!
//! ## Quick Start
//!
//! ```text
//! use thingdb_executor::{Command, Executor, ResourceFamily};
//!
//! let executor = Executor::new(Database::ephemeral());
//! let output = executor.execute(Command::CreateRecord {
//!     family: ResourceFamily::Things,
//!     class: "TestThing".into(),
//!     context: String::new(),
//!     schema: serde_json::json!({"testString": "wibbly"}),
//! })?;
//! ```
//!
//! ## Resource Families
//!
//! | Family | Backed by |
//! |--------|-----------|
//! | `things` | record store, kind Thing |
//! | `actions` | record store, kind Action |
//! | `keys`, `adapters`, `commands` | nothing: every command answers 501 |

#![warn(missing_docs)]

mod command;
mod convert;
mod error;
mod executor;
mod output;

// Handler modules
mod handlers;

// Test modules
#[cfg(test)]
mod tests;

pub use command::{Command, ResourceFamily};
pub use error::{Error, Result};
pub use executor::Executor;
pub use output::Output;
