/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *
 */


//!
//! Per-thread scoped connections.
//!
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};

use crate::driver::{BoxConnection, Connection};
use crate::errors::{PoolError, Result};
use crate::pool::ConnectionPool;

type Slot = Arc<Mutex<BoxConnection>>;

/// A pool front end where each thread holds at most one connection.
///
/// `enter` checks a connection out for the calling thread and parks it in
/// that thread's slot until the returned guard is dropped. Code further down
/// the call stack reaches it through [`ScopedConnection::with_connection`]
/// without threading a handle through every signature.
///
/// Scopes do not nest: entering again on a thread that already holds a
/// connection fails with [`PoolError::ScopeReentered`] and leaves the held
/// connection untouched.
pub struct ScopedConnection<P: ConnectionPool> {
    pool: P,
    slots: DashMap<ThreadId, Slot>,
}

impl<P: ConnectionPool> ScopedConnection<P> {
    pub fn new(pool: P) -> Self {
        ScopedConnection {
            pool,
            slots: DashMap::new(),
        }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Acquire a connection for the current thread.
    pub fn enter(&self) -> Result<ScopeGuard<'_, P>> {
        let id = thread::current().id();
        if self.slots.contains_key(&id) {
            return Err(PoolError::ScopeReentered);
        }
        let conn = self.pool.acquire()?;
        let slot = Arc::new(Mutex::new(conn));
        self.slots.insert(id, slot.clone());
        Ok(ScopeGuard {
            owner: self,
            slot: Some(slot),
            _not_send: PhantomData,
        })
    }

    /// Whether the current thread is inside a scope.
    pub fn is_active(&self) -> bool {
        self.slots.contains_key(&thread::current().id())
    }

    /// Run `f` against the current thread's connection.
    ///
    /// If the scope is exited while `f` runs (its guard dropped inside `f`),
    /// the connection is released once `f` returns or unwinds.
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Connection) -> Result<T>,
    {
        // Clone the slot out so the map shard is not locked while `f` runs.
        let slot = self
            .slots
            .get(&thread::current().id())
            .map(|s| s.value().clone())
            .ok_or(PoolError::NoActiveScope)?;
        let borrowed = BorrowedSlot {
            owner: self,
            slot: Some(slot),
        };
        let mut conn = borrowed.lock();
        let result = f(&mut **conn);
        drop(conn);
        result
    }

    /// Number of threads currently holding a connection.
    pub fn active_scopes(&self) -> usize {
        self.slots.len()
    }

    fn exit(&self) {
        let Some((_, slot)) = self.slots.remove(&thread::current().id()) else {
            return;
        };
        match Arc::try_unwrap(slot) {
            Ok(conn) => self.pool.release(conn.into_inner()),
            // `with_connection` still holds it and releases it when done.
            Err(_) => tracing::debug!("scoped connection in use on exit, release deferred"),
        }
    }

    /// Releases a slot handed back by `with_connection` whose scope has
    /// already been exited.
    fn reclaim(&self, slot: Slot) {
        let entered = self
            .slots
            .get(&thread::current().id())
            .map_or(false, |s| Arc::ptr_eq(s.value(), &slot));
        if entered {
            return;
        }
        if let Ok(conn) = Arc::try_unwrap(slot) {
            tracing::debug!("releasing scoped connection after deferred exit");
            self.pool.release(conn.into_inner());
        }
    }
}

impl<P: ConnectionPool + fmt::Debug> fmt::Debug for ScopedConnection<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("pool", &self.pool)
            .field("active_scopes", &self.active_scopes())
            .finish()
    }
}

/// The slot clone `with_connection` works on.
struct BorrowedSlot<'a, P: ConnectionPool> {
    owner: &'a ScopedConnection<P>,
    slot: Option<Slot>,
}

impl<P: ConnectionPool> BorrowedSlot<'_, P> {
    fn lock(&self) -> MutexGuard<'_, BoxConnection> {
        self.slot.as_ref().expect("slot already reclaimed").lock()
    }
}

impl<P: ConnectionPool> Drop for BorrowedSlot<'_, P> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.owner.reclaim(slot);
        }
    }
}

/// Keeps the calling thread's scope open. Not `Send`: the scope is released
/// from the thread that entered it.
pub struct ScopeGuard<'a, P: ConnectionPool> {
    owner: &'a ScopedConnection<P>,
    slot: Option<Slot>,
    _not_send: PhantomData<*const ()>,
}

impl<P: ConnectionPool> ScopeGuard<'_, P> {
    /// Lock the held connection for direct use.
    pub fn connection(&self) -> MutexGuard<'_, BoxConnection> {
        self.slot.as_ref().expect("scope already exited").lock()
    }
}

impl<P: ConnectionPool> Drop for ScopeGuard<'_, P> {
    fn drop(&mut self) {
        // Our handle must be gone before the slot can be unwrapped.
        self.slot.take();
        self.owner.exit();
    }
}
