// Copyright (c) 2021 akita contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! This crate offers:
//!
//! *   A thread-safe connection pool in front of any relational database client;
//! *   Pluggable validation and transaction cleanup per database driver.
//!
//! Features:
//!
//! *   Bounded growth: connections are created on demand up to `limit`, after
//!     which `acquire` waits up to `timeout` for a release;
//! *   Validation on checkout with bounded retries, cleanup on release;
//! *   Per-thread scoped connections and commit/rollback scopes.
//!
//! ## Installation
//!
//! Put the desired version of the crate into the `dependencies` section of your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! dbpool = { version = "0.1", features = ["sqlite-sync"] }
//! ```
//!
//! ## Feature.
//!
//! * ```mysql-sync``` - MySQL adapter
//! * ```postgres-sync``` - PostgreSQL adapter
//! * ```sqlite-sync``` - SQLite adapter
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use dbpool::*;
//!
//! let manager = SqliteConnectionManager::file("app.db");
//! let cfg = PoolConfig::default()
//!     .set_limit(4)
//!     .set_timeout(Duration::from_secs(2));
//! let pool = BlockingPool::new(manager.factory(), cfg);
//!
//! {
//!     let mut conn = pool.connect()?;
//!     transaction(&mut *conn, |conn| {
//!         let mut cursor = conn.cursor()?;
//!         cursor.execute("INSERT INTO t_user (name) VALUES (?)", &params!["Jack"])?;
//!         Ok::<_, PoolError>(())
//!     })?;
//! } // connection goes back to the pool here
//! ```
//!
//! Implement [`Connection`] and [`Cursor`] to pool any other client.
//!
mod config;
mod driver;
mod errors;
mod ext;
mod pool;
mod scoped;
mod transaction;
mod validator;
mod value;

#[doc(inline)]
pub use config::{PoolConfig, Validation};
#[doc(inline)]
pub use driver::{BoxConnection, Connection, Cursor, DriverType, TransactionStatus};
#[doc(inline)]
pub use errors::{PoolError, Result};
pub use ext::{takes_connection, Connect};
#[doc(inline)]
pub use pool::blocking::BlockingPool;
#[doc(inline)]
pub use pool::passthrough::PassThroughPool;
pub use pool::{ConnectionFactory, ConnectionPool, PoolStatus, PooledConnection};
pub use scoped::{ScopeGuard, ScopedConnection};
pub use transaction::{transaction, Transaction};
#[doc(inline)]
pub use validator::{
    DefaultValidator, MssqlValidator, MysqlValidator, OracleValidator, PostgresValidator,
    Validator, ValidatorRegistry,
};
pub use value::{Row, Value};

#[cfg(feature = "mysql-sync")]
pub use driver::mysql::{MysqlConnection, MysqlConnectionManager, MysqlCursor};
#[cfg(feature = "postgres-sync")]
pub use driver::postgres::{PostgresConnection, PostgresConnectionManager, PostgresCursor};
#[cfg(feature = "sqlite-sync")]
pub use driver::sqlite::{SqliteConnection, SqliteConnectionManager, SqliteCursor};
