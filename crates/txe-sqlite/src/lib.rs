//! SQLite backend adapter for the txe engine.
//!
//! Implements the capability pair the engine consumes (begin + ping) over
//! `rusqlite`, plus read-only/read-write preset configurations. The raw
//! connection stays usable from work units while a transaction is open, so
//! callers capture it alongside the doer:
//!
//! ```no_run
//! use txe_core::Context;
//! use txe_sqlite::{execute_rw, SqliteConn, SqliteDoer};
//!
//! let conn = SqliteConn::open("app.db").unwrap();
//! let doer = SqliteDoer::default();
//! execute_rw(&Context::background(), &conn, &doer, "AddUser", vec![], |_ctx, _doer| {
//!     conn.execute("INSERT INTO users (name) VALUES (?1)", ["ada"])?;
//!     Ok(())
//! })
//! .unwrap();
//! ```

mod doer;
mod exec;

pub use doer::{BeginBehavior, SqliteConn, SqliteDoer, SqliteOptions, SqliteTxn, SqliteTxnError};
pub use exec::{execute_ro, execute_rw};
