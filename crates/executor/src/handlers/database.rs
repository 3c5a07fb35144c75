//! Database-level handlers.

use thingdb_engine::Database;

use crate::{Output, Result};

/// Handle Ping command.
pub fn ping() -> Result<Output> {
    Ok(Output::Pong {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle Flush command.
pub fn flush(db: &Database) -> Result<Output> {
    db.flush()?;
    Ok(Output::Unit)
}

/// Handle Compact command.
pub fn compact(db: &Database) -> Result<Output> {
    let records = db.compact()?;
    Ok(Output::Compacted { records })
}
