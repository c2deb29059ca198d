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
//! Helpers that inject a pooled connection into a call.
//!
use crate::driver::Connection;
use crate::errors::PoolError;
use crate::pool::ConnectionPool;

/// Acquire from `pool`, run `f` with the connection, release afterwards.
pub fn takes_connection<P, F, T, E>(pool: &P, f: F) -> Result<T, E>
where
    P: ConnectionPool,
    F: FnOnce(&mut dyn Connection) -> Result<T, E>,
    E: From<PoolError>,
{
    let mut conn = pool.connect()?;
    f(&mut *conn)
}

/// Implemented by services that own a pool, so methods can borrow a
/// connection for the duration of a call.
///
/// ```rust,ignore
/// impl Connect for UserRepo {
///     type Pool = BlockingPool;
///     fn connection_pool(&self) -> &BlockingPool { &self.pool }
/// }
///
/// repo.with_connection(|repo, conn| repo.load(conn, 42))?;
/// ```
pub trait Connect {
    type Pool: ConnectionPool;

    fn connection_pool(&self) -> &Self::Pool;

    fn with_connection<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self, &mut dyn Connection) -> Result<T, E>,
        E: From<PoolError>,
    {
        let mut conn = self.connection_pool().connect()?;
        f(self, &mut *conn)
    }
}
