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

use crate::config::PoolConfig;
use crate::driver::{BoxConnection, Connection};
use crate::errors::{PoolError, Result};
use crate::pool::{ConnectionFactory, ConnectionPool, PoolStatus};

type StatusFn = Box<dyn Fn() -> PoolStatus + Send + Sync>;

/// Hands out connections owned by an external pooling subsystem.
///
/// Sizing and health checks belong to that subsystem, so `release` only
/// drops the handle and lets it reclaim the connection.
pub struct PassThroughPool {
    factory: ConnectionFactory,
    status: Option<StatusFn>,
}

impl PassThroughPool {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<BoxConnection> + Send + Sync + 'static,
    {
        PassThroughPool {
            factory: Box::new(factory),
            status: None,
        }
    }

    /// Like `new`, but rejects a limit or a validator: configure those on the
    /// external pool instead. Any explicitly chosen validation mode other than
    /// `Disabled` counts as a validator, `Validation::Auto` included; only the
    /// untouched default passes.
    pub fn with_config<F>(factory: F, cfg: PoolConfig) -> Result<Self>
    where
        F: Fn() -> Result<BoxConnection> + Send + Sync + 'static,
    {
        if cfg.limit() != 0 {
            return Err(PoolError::configuration(
                "Cannot set limit here, configure this in the external connection pool instead",
            ));
        }
        if cfg.is_validation_set() && !cfg.validation().is_disabled() {
            return Err(PoolError::configuration(
                "Cannot set validator here, configure this in the external connection pool instead",
            ));
        }
        Ok(Self::new(factory))
    }

    /// Delegates to an r2d2 pool; connections return to it when released.
    pub fn from_r2d2<M>(pool: r2d2::Pool<M>) -> Self
    where
        M: r2d2::ManageConnection,
        M::Connection: Connection,
    {
        let state_pool = pool.clone();
        PassThroughPool {
            factory: Box::new(move || {
                let conn = pool.get()?;
                Ok(Box::new(conn) as BoxConnection)
            }),
            status: Some(Box::new(move || {
                let state = state_pool.state();
                PoolStatus {
                    size: state.connections as usize,
                    available: state.idle_connections as usize,
                }
            })),
        }
    }
}

impl ConnectionPool for PassThroughPool {
    fn acquire(&self) -> Result<BoxConnection> {
        (self.factory)()
    }

    fn release(&self, conn: BoxConnection) {
        drop(conn);
    }

    fn status(&self) -> PoolStatus {
        match self.status {
            Some(ref status) => status(),
            None => PoolStatus {
                size: 0,
                available: 0,
            },
        }
    }
}

impl fmt::Debug for PassThroughPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassThroughPool")
            .field("status", &self.status())
            .finish()
    }
}
