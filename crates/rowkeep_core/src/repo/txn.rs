//! Transaction ownership coordination.
//!
//! # Responsibility
//! - Track whether a transaction is already open on a connection.
//! - Let nested repository calls share one physical transaction.
//!
//! # Invariants
//! - Only the scope that opened the transaction may commit or roll it
//!   back; nested scopes observe it and never close it.
//! - An owned scope that is dropped without committing rolls the whole
//!   chain back, on every exit path.

use crate::repo::RepoResult;
use log::{error, trace};
use rusqlite::Connection;

/// Returns whether a transaction is already open on this handle.
pub fn in_transaction(conn: &Connection) -> bool {
    !conn.is_autocommit()
}

/// Scoped ownership of at most one physical transaction per connection.
///
/// The scope that finds the handle idle begins a transaction and owns it.
/// Scopes created while a transaction is already open do not own it, and
/// their commit and drop are no-ops, so an inner failure leaves the
/// decision to the outermost owner.
#[derive(Debug)]
pub struct TxnScope<'conn> {
    conn: &'conn Connection,
    owns: bool,
    finished: bool,
}

impl<'conn> TxnScope<'conn> {
    /// Begins a transaction when the handle is idle.
    ///
    /// Returns an owning scope in that case, a non-owning scope when a
    /// transaction is already in flight.
    pub fn begin_if_needed(conn: &'conn Connection) -> RepoResult<Self> {
        let owns = !in_transaction(conn);
        if owns {
            conn.execute_batch("BEGIN IMMEDIATE;")?;
            trace!("event=txn_begin module=repo");
        }
        Ok(Self {
            conn,
            owns,
            finished: false,
        })
    }

    /// Returns whether this scope opened the transaction.
    pub fn owns(&self) -> bool {
        self.owns
    }

    /// Commits the transaction when this scope owns it.
    ///
    /// On a commit failure the scope still rolls back on drop, so the
    /// handle never leaks an open transaction.
    pub fn commit_if_owned(mut self) -> RepoResult<()> {
        if self.owns {
            self.conn.execute_batch("COMMIT;")?;
            trace!("event=txn_commit module=repo");
        }
        self.finished = true;
        Ok(())
    }
}

impl Drop for TxnScope<'_> {
    fn drop(&mut self) {
        if self.owns && !self.finished {
            match self.conn.execute_batch("ROLLBACK;") {
                Ok(()) => trace!("event=txn_rollback module=repo status=ok"),
                Err(err) => {
                    error!("event=txn_rollback module=repo status=error error={err}");
                }
            }
        }
    }
}
