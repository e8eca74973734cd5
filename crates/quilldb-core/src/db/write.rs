//! Module: db::write
//! Responsibility: executing conditional writes and settling their outcome
//! against the options' listener contract.
//! Does not own: CQL generation, consistency defaults (policy), batching.

use crate::{
    db::consistency::ConsistencyPolicy,
    db::lwt::{LwtOutcome, LwtResult, WriteOp},
    db::options::Options,
    db::port::{BoundStatement, RowSet, StatementPort},
    error::RuntimeError,
    obs::{self, MetricsEvent},
};

/// Execute one (possibly conditional) write at its resolved consistency
/// level and settle the outcome.
pub fn execute_conditional(
    port: &dyn StatementPort,
    statement: &BoundStatement,
    operation: WriteOp,
    table: &str,
    options: &Options,
    policy: &ConsistencyPolicy,
) -> Result<LwtOutcome, RuntimeError> {
    let consistency = policy.resolve_write(table, options);
    let rows = port.execute(statement, consistency)?;

    settle(rows, operation, options)
}

/// Settle a write's `RowSet` into an outcome.
///
/// A registered listener turns a rejection into a hook invocation; without
/// one, the rejection surfaces as the typed error so callers can always
/// inspect why the write did not apply.
pub(crate) fn settle(
    rows: RowSet,
    operation: WriteOp,
    options: &Options,
) -> Result<LwtOutcome, RuntimeError> {
    match rows.applied() {
        // Unconditional statement; nothing to settle.
        None => Ok(LwtOutcome::Applied),
        Some(true) => {
            obs::record(MetricsEvent::LwtApplied);
            if let Some(listener) = options.lwt_listener() {
                listener.on_applied();
            }
            Ok(LwtOutcome::Applied)
        }
        Some(false) => {
            let current = rows.into_rows().into_iter().next().unwrap_or_default();
            let result = LwtResult::from_row(operation, current);
            obs::record(MetricsEvent::LwtRejected);

            match options.lwt_listener() {
                Some(listener) => {
                    listener.on_rejected(&result);
                    Ok(LwtOutcome::Rejected(result))
                }
                None => Err(RuntimeError::lwt_rejected(result)),
            }
        }
    }
}
