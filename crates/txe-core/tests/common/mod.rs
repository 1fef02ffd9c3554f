//! Scripted in-memory backend used by the engine integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use txe_core::doer::{Doer, DoerBase, Setter};
use txe_core::{BoxError, Context, Pinger, TxnHandle};

/// Shared call counters so tests can assert exactly which backend
/// primitives ran and how often.
#[derive(Debug, Default)]
pub struct Counters {
    pub begins: AtomicU32,
    pub commits: AtomicU32,
    pub rollbacks: AtomicU32,
    pub pings: AtomicU32,
}

impl Counters {
    pub fn begins(&self) -> u32 {
        self.begins.load(Ordering::Relaxed)
    }
    pub fn commits(&self) -> u32 {
        self.commits.load(Ordering::Relaxed)
    }
    pub fn rollbacks(&self) -> u32 {
        self.rollbacks.load(Ordering::Relaxed)
    }
    pub fn pings(&self) -> u32 {
        self.pings.load(Ordering::Relaxed)
    }
}

pub struct MockConn {
    pub counters: Arc<Counters>,
    pub fail_ping: bool,
}

impl MockConn {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            fail_ping: false,
        }
    }

    pub fn with_failing_ping() -> Self {
        Self {
            fail_ping: true,
            ..Self::new()
        }
    }
}

impl Pinger for MockConn {
    fn ping(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.counters.pings.fetch_add(1, Ordering::Relaxed);
        if self.fail_ping {
            Err("ping refused".into())
        } else {
            Ok(())
        }
    }
}

pub struct MockTxn {
    counters: Arc<Counters>,
    fail_commit: bool,
    fail_rollback: bool,
}

impl TxnHandle for MockTxn {
    fn commit(&mut self, _ctx: &Context) -> Result<(), BoxError> {
        self.counters.commits.fetch_add(1, Ordering::Relaxed);
        if self.fail_commit {
            Err("commit refused".into())
        } else {
            Ok(())
        }
    }

    fn rollback(&mut self, _ctx: &Context) -> Result<(), BoxError> {
        self.counters.rollbacks.fetch_add(1, Ordering::Relaxed);
        if self.fail_rollback {
            Err("rollback refused".into())
        } else {
            Ok(())
        }
    }

    fn is_nil(&self) -> bool {
        false
    }
}

#[derive(Default)]
pub struct MockDoer {
    pub base: DoerBase<()>,
    pub fail_begin: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
}

impl MockDoer {
    pub fn new(setters: impl IntoIterator<Item = Setter<()>>) -> Self {
        Self {
            base: DoerBase::new(setters),
            ..Self::default()
        }
    }
}

impl Doer for MockDoer {
    type Options = ();
    type Conn = MockConn;
    type Txn<'c> = MockTxn
    where
        Self::Conn: 'c;

    fn base(&self) -> &DoerBase<()> {
        &self.base
    }

    fn begin_txn<'c>(&self, _ctx: &Context, conn: &'c MockConn) -> Result<MockTxn, BoxError> {
        conn.counters.begins.fetch_add(1, Ordering::Relaxed);
        if self.fail_begin {
            return Err("begin refused".into());
        }
        Ok(MockTxn {
            counters: Arc::clone(&conn.counters),
            fail_commit: self.fail_commit,
            fail_rollback: self.fail_rollback,
        })
    }
}
