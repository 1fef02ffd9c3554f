//! SQLite doer, connection wrapper and transaction handle.

use std::ops::Deref;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

use txe_core::doer::{
    with_max_ping, with_max_retry, with_options, with_rethrow_panic, with_timeout, with_title,
    Doer, DoerBase, Setter,
};
use txe_core::{BoxError, Context, Pinger, TxnHandle};

/// Adapter-level failures around the raw driver.
#[derive(Debug, thiserror::Error)]
pub enum SqliteTxnError {
    /// The handle no longer wraps a live transaction (a commit or rollback
    /// already consumed it).
    #[error("no active transaction, handle already consumed")]
    Consumed,
    /// The doer carries no options payload; the adapter cannot pick a begin
    /// behavior without one.
    #[error("transaction options not configured")]
    MissingOptions,
    #[error(transparent)]
    Driver(#[from] rusqlite::Error),
}

/// How the transaction acquires its locks, mapped onto
/// [`rusqlite::TransactionBehavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeginBehavior {
    #[default]
    Deferred,
    Immediate,
    Exclusive,
}

impl From<BeginBehavior> for TransactionBehavior {
    fn from(value: BeginBehavior) -> Self {
        match value {
            BeginBehavior::Deferred => TransactionBehavior::Deferred,
            BeginBehavior::Immediate => TransactionBehavior::Immediate,
            BeginBehavior::Exclusive => TransactionBehavior::Exclusive,
        }
    }
}

/// Opaque options payload for the SQLite backend.
///
/// `read_only` is advisory: SQLite has no per-transaction read-only mode, so
/// the flag documents intent and steers the preset toward deferred locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SqliteOptions {
    pub behavior: BeginBehavior,
    pub read_only: bool,
}

/// Connection wrapper carrying the engine capability impls. Derefs to the
/// raw [`Connection`] so work units can run statements directly.
pub struct SqliteConn(Connection);

impl SqliteConn {
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        Ok(Self(Connection::open(path)?))
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self(Connection::open_in_memory()?))
    }

    pub fn into_inner(self) -> Connection {
        self.0
    }
}

impl From<Connection> for SqliteConn {
    fn from(conn: Connection) -> Self {
        Self(conn)
    }
}

impl Deref for SqliteConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.0
    }
}

impl Pinger for SqliteConn {
    fn ping(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.0
            .query_row("SELECT 1", [], |_| Ok(()))
            .map_err(Into::into)
    }
}

/// One begun SQLite transaction. The raw driver transaction is consumed by
/// commit/rollback, so the wrapper keeps it in an `Option`; `is_nil` reports
/// whether a live transaction remains.
pub struct SqliteTxn<'c> {
    raw: Option<Transaction<'c>>,
}

impl TxnHandle for SqliteTxn<'_> {
    fn commit(&mut self, _ctx: &Context) -> Result<(), BoxError> {
        match self.raw.take() {
            Some(tx) => tx.commit().map_err(|e| SqliteTxnError::from(e).into()),
            None => Err(SqliteTxnError::Consumed.into()),
        }
    }

    fn rollback(&mut self, _ctx: &Context) -> Result<(), BoxError> {
        match self.raw.take() {
            Some(tx) => tx.rollback().map_err(|e| SqliteTxnError::from(e).into()),
            None => Err(SqliteTxnError::Consumed.into()),
        }
    }

    fn is_nil(&self) -> bool {
        self.raw.is_none()
    }
}

/// Doer for the SQLite backend: the configuration bag plus the begin
/// capability.
#[derive(Debug, Default)]
pub struct SqliteDoer {
    base: DoerBase<SqliteOptions>,
}

impl SqliteDoer {
    pub fn new(setters: impl IntoIterator<Item = Setter<SqliteOptions>>) -> Self {
        Self {
            base: DoerBase::new(setters),
        }
    }

    /// True when the configured options mark this call read-only.
    pub fn is_read_only(&self) -> bool {
        self.options().map(|o| o.read_only).unwrap_or(false)
    }

    /// Preset bundle for read-only calls: short timeout, light probing.
    pub fn read_only_setters(title: &str) -> Vec<Setter<SqliteOptions>> {
        vec![
            with_title(format!("TxnRo`{title}")),
            with_rethrow_panic(false),
            with_timeout(Duration::from_secs(2)),
            with_max_ping(2),
            with_max_retry(1),
            with_options(SqliteOptions {
                behavior: BeginBehavior::Deferred,
                read_only: true,
            }),
        ]
    }

    /// Preset bundle for read-write calls: immediate locking, longer timeout,
    /// more patience with a flaky backend.
    pub fn read_write_setters(title: &str) -> Vec<Setter<SqliteOptions>> {
        vec![
            with_title(format!("TxnRw`{title}")),
            with_rethrow_panic(false),
            with_timeout(Duration::from_secs(5)),
            with_max_ping(8),
            with_max_retry(2),
            with_options(SqliteOptions {
                behavior: BeginBehavior::Immediate,
                read_only: false,
            }),
        ]
    }
}

impl Doer for SqliteDoer {
    type Options = SqliteOptions;
    type Conn = SqliteConn;
    type Txn<'c> = SqliteTxn<'c>
    where
        Self::Conn: 'c;

    fn base(&self) -> &DoerBase<SqliteOptions> {
        &self.base
    }

    fn begin_txn<'c>(&self, _ctx: &Context, conn: &'c SqliteConn) -> Result<SqliteTxn<'c>, BoxError> {
        let options = self.options().ok_or(SqliteTxnError::MissingOptions)?;
        debug!(
            behavior = ?options.behavior,
            read_only = options.read_only,
            "beginning sqlite transaction"
        );
        let raw = Transaction::new_unchecked(&conn.0, options.behavior.into())
            .map_err(SqliteTxnError::from)?;
        Ok(SqliteTxn { raw: Some(raw) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txe_core::doer::TxnFields;

    #[test]
    fn read_only_preset_values() {
        let fields = TxnFields::new(SqliteDoer::read_only_setters("List"));
        assert_eq!(fields.title, "TxnRo`List");
        assert_eq!(fields.timeout, Duration::from_secs(2));
        assert_eq!(fields.max_ping, 2);
        assert_eq!(fields.max_retry, 1);
        let options = fields.options.unwrap();
        assert_eq!(options.behavior, BeginBehavior::Deferred);
        assert!(options.read_only);
    }

    #[test]
    fn read_write_preset_values() {
        let fields = TxnFields::new(SqliteDoer::read_write_setters("Add"));
        assert_eq!(fields.title, "TxnRw`Add");
        assert_eq!(fields.timeout, Duration::from_secs(5));
        assert_eq!(fields.max_ping, 8);
        assert_eq!(fields.max_retry, 2);
        let options = fields.options.unwrap();
        assert_eq!(options.behavior, BeginBehavior::Immediate);
        assert!(!options.read_only);
    }

    #[test]
    fn ping_answers_on_an_open_connection() {
        let conn = SqliteConn::open_in_memory().unwrap();
        conn.ping(&Context::background()).unwrap();
    }

    #[test]
    fn begin_without_options_is_rejected() {
        let conn = SqliteConn::open_in_memory().unwrap();
        let doer = SqliteDoer::default();
        let err = doer
            .begin_txn(&Context::background(), &conn)
            .err()
            .expect("begin should fail without options");
        assert_eq!(err.to_string(), "transaction options not configured");
    }

    #[test]
    fn consumed_handle_reports_nil() {
        let conn = SqliteConn::open_in_memory().unwrap();
        let doer = SqliteDoer::new(SqliteDoer::read_write_setters("Nil"));
        let ctx = Context::background();
        let mut tx = doer.begin_txn(&ctx, &conn).unwrap();
        assert!(!tx.is_nil());
        tx.commit(&ctx).unwrap();
        assert!(tx.is_nil());
        let err = tx.rollback(&ctx).unwrap_err();
        assert_eq!(err.to_string(), "no active transaction, handle already consumed");
    }
}
