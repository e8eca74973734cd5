//! Module: db::batch
//! Responsibility: accumulating writes into one logical batch and applying
//! the batch's consistency level when it flushes.
//! Does not own: wire-level batching (the port may or may not coalesce),
//! conditional-write settlement (delegated per operation).

use crate::{
    db::consistency::{ConsistencyLevel, ConsistencyPolicy, apply_batch_override},
    db::lwt::{LwtOutcome, WriteOp},
    db::options::Options,
    db::port::{BoundStatement, StatementPort},
    db::write,
    error::RuntimeError,
};

///
/// PendingWrite
///
/// One write queued in a batch window: the bound statement, its operation
/// kind, its target table, and the options it was queued with.
///

#[derive(Clone, Debug)]
pub struct PendingWrite {
    statement: BoundStatement,
    operation: WriteOp,
    table: String,
    options: Options,
}

impl PendingWrite {
    #[must_use]
    pub fn new(
        statement: BoundStatement,
        operation: WriteOp,
        table: impl Into<String>,
        options: Options,
    ) -> Self {
        Self {
            statement,
            operation,
            table: table.into(),
            options,
        }
    }

    #[must_use]
    pub const fn operation(&self) -> WriteOp {
        self.operation
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }
}

///
/// BatchWindow
///
/// Accumulates writes for one logical batch. A window configured with its
/// own consistency level replaces every operation's level at flush time:
/// whether or not the operation's options carried one, the batch level wins.
///

#[derive(Debug, Default)]
pub struct BatchWindow {
    level: Option<ConsistencyLevel>,
    pending: Vec<PendingWrite>,
}

impl BatchWindow {
    /// Window without its own level; operations keep their own options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: None,
            pending: Vec::new(),
        }
    }

    /// Window that forces `level` onto every operation at flush time.
    #[must_use]
    pub const fn with_level(level: ConsistencyLevel) -> Self {
        Self {
            level: Some(level),
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub const fn level(&self) -> Option<ConsistencyLevel> {
        self.level
    }

    pub fn push(&mut self, write: PendingWrite) {
        self.pending.push(write);
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Execute every queued write in order and settle each outcome. The
    /// first error stops the flush; nothing is suppressed.
    pub fn flush(
        self,
        port: &dyn StatementPort,
        policy: &ConsistencyPolicy,
    ) -> Result<Vec<LwtOutcome>, RuntimeError> {
        let level = self.level;
        let mut outcomes = Vec::with_capacity(self.pending.len());

        for write in self.pending {
            let options = match level {
                Some(level) => apply_batch_override(&write.options, level),
                None => write.options.clone(),
            };
            let outcome = write::execute_conditional(
                port,
                &write.statement,
                write.operation,
                &write.table,
                &options,
                policy,
            )?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
