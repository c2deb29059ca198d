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
//! Common Errors.
//!
use std::error::Error as StdError;
use std::time::Duration;

/// Errors surfaced by pools, validators and driver adapters.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The bounded pool is at its limit and nothing was released in time.
    #[error("Connection pool exhausted: {limit} connections in use, none released within {timeout:?}")]
    Exhausted { limit: usize, timeout: Duration },
    #[error("Could not validate a connection after {attempts} attempts")]
    ValidationExhausted { attempts: usize },
    #[error("Invalid pool configuration: {0}")]
    Configuration(String),
    /// Failure reported by the underlying database client.
    #[error(transparent)]
    Driver(Box<dyn StdError + Send + Sync>),
    #[error("Connection is already closed")]
    Closed,
    #[error("Scoped connection entered twice on the same thread")]
    ScopeReentered,
    #[error("No scoped connection is active on this thread")]
    NoActiveScope,
    #[error("Operation not supported: {0}")]
    Unsupported(String),
    #[error(transparent)]
    R2D2(#[from] r2d2::Error),
}

impl PoolError {
    /// Wraps any client error, keeping it as the source.
    pub fn driver<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        PoolError::Driver(err.into())
    }

    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        PoolError::Configuration(msg.into())
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, PoolError::Exhausted { .. })
    }

    pub fn is_validation_exhausted(&self) -> bool {
        matches!(self, PoolError::ValidationExhausted { .. })
    }
}

#[cfg(feature = "mysql-sync")]
impl From<mysql::Error> for PoolError {
    fn from(err: mysql::Error) -> Self {
        PoolError::driver(err)
    }
}

#[cfg(feature = "postgres-sync")]
impl From<postgres::Error> for PoolError {
    fn from(err: postgres::Error) -> Self {
        PoolError::driver(err)
    }
}

#[cfg(feature = "sqlite-sync")]
impl From<rusqlite::Error> for PoolError {
    fn from(err: rusqlite::Error) -> Self {
        PoolError::driver(err)
    }
}

pub type Result<T> = std::result::Result<T, PoolError>;
