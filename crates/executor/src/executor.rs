//! The Executor - single entry point to the record store.
//!
//! The Executor is a stateless dispatcher that routes commands to the
//! handler for their resource family and converts results to outputs.

use std::sync::Arc;

use thingdb_engine::Database;
use tracing::debug;

use crate::handlers::{self, family_kind};
use crate::{Command, Output, Result};

/// The command executor.
///
/// The Executor is **stateless**: it holds a reference to the database but
/// maintains no state of its own.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads. Commands on
/// the same record are serialized by the database, commands on different
/// records run in parallel.
///
/// # Example
///
/// ```ignore
/// use thingdb_executor::{Command, Executor, ResourceFamily};
///
/// let executor = Executor::new(Database::ephemeral());
///
/// let results = executor.execute_many(vec![
///     Command::GetRecord { family: ResourceFamily::Things, id: a },
///     Command::GetRecord { family: ResourceFamily::Things, id: b },
/// ]);
/// ```
pub struct Executor {
    db: Arc<Database>,
}

impl Executor {
    /// Create a new executor wrapping a database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The wrapped database.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Execute a single command.
    ///
    /// Returns the command result or an error.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        let name = cmd.name();
        let result = self.dispatch(cmd);
        if let Err(e) = &result {
            debug!(target: "thingdb::executor", command = name, status = e.status_code(), error = %e, "Command failed");
        }
        result
    }

    fn dispatch(&self, cmd: Command) -> Result<Output> {
        let db = self.db.as_ref();
        let op = cmd.name();
        match cmd {
            Command::Ping => handlers::database::ping(),
            Command::Flush => handlers::database::flush(db),
            Command::Compact => handlers::database::compact(db),

            Command::CreateRecord {
                family,
                class,
                context,
                schema,
            } => handlers::record::create(db, family_kind(family, op)?, class, context, schema),
            Command::GetRecord { family, id } => {
                handlers::record::get(db, family_kind(family, op)?, id)
            }
            Command::ListRecords { family } => handlers::record::list(db, family_kind(family, op)?),
            Command::UpdateRecord {
                family,
                id,
                class,
                context,
                schema,
            } => handlers::record::update(db, family_kind(family, op)?, id, class, context, schema),
            Command::PatchRecord {
                family,
                id,
                operations,
            } => handlers::record::patch(db, family_kind(family, op)?, id, operations),
            Command::DeleteRecord { family, id } => {
                handlers::record::delete(db, family_kind(family, op)?, id)
            }

            Command::ResolveReference {
                family,
                id,
                property,
            } => handlers::reference::resolve(db, family_kind(family, op)?, id, property),
        }
    }

    /// Execute multiple commands sequentially.
    ///
    /// Returns all results in the same order as the input commands.
    /// Execution continues even if some commands fail.
    pub fn execute_many(&self, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(cmd)).collect()
    }
}
