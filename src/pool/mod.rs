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


use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::driver::{BoxConnection, Connection};
use crate::errors::Result;

pub mod blocking;
pub mod passthrough;

/// Produces a fresh client connection; called by pools when they need to grow.
pub type ConnectionFactory = Box<dyn Fn() -> Result<BoxConnection> + Send + Sync>;

/// Connection pool state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: usize,
    pub available: usize,
}

pub trait ConnectionPool: Send + Sync {
    /// Get a validated connection from the connection pool
    fn acquire(&self) -> Result<BoxConnection>;

    /// Hand back a connection obtained from `acquire`, exactly once.
    fn release(&self, conn: BoxConnection);

    /// Get the connection pool status
    fn status(&self) -> PoolStatus;

    /// Acquire a connection that is released when the guard goes out of scope.
    fn connect(&self) -> Result<PooledConnection<'_, Self>>
    where
        Self: Sized,
    {
        let conn = self.acquire()?;
        Ok(PooledConnection::new(self, conn))
    }
}

impl<P: ConnectionPool + ?Sized> ConnectionPool for Arc<P> {
    fn acquire(&self) -> Result<BoxConnection> {
        (**self).acquire()
    }

    fn release(&self, conn: BoxConnection) {
        (**self).release(conn)
    }

    fn status(&self) -> PoolStatus {
        (**self).status()
    }
}

impl<P: ConnectionPool + ?Sized> ConnectionPool for &P {
    fn acquire(&self) -> Result<BoxConnection> {
        (**self).acquire()
    }

    fn release(&self, conn: BoxConnection) {
        (**self).release(conn)
    }

    fn status(&self) -> PoolStatus {
        (**self).status()
    }
}

/// A connection checked out of a pool.
///
/// Dropping the guard releases the connection, on unwinding too.
pub struct PooledConnection<'a, P: ConnectionPool + ?Sized> {
    pool: &'a P,
    conn: Option<BoxConnection>,
}

impl<'a, P: ConnectionPool + ?Sized> PooledConnection<'a, P> {
    pub(crate) fn new(pool: &'a P, conn: BoxConnection) -> Self {
        PooledConnection {
            pool,
            conn: Some(conn),
        }
    }

    /// The pool the connection goes back to.
    pub fn pool(&self) -> &'a P {
        self.pool
    }
}

impl<P: ConnectionPool + ?Sized> Deref for PooledConnection<'_, P> {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_deref().expect("connection already released")
    }
}

impl<P: ConnectionPool + ?Sized> DerefMut for PooledConnection<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_deref_mut().expect("connection already released")
    }
}

impl<P: ConnectionPool + ?Sized> Drop for PooledConnection<'_, P> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

impl<P: ConnectionPool + ?Sized> fmt::Debug for PooledConnection<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("driver", &self.conn.as_ref().map(|c| c.driver_type()))
            .finish()
    }
}
