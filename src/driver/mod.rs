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
//! Capability interfaces every pooled database client implements.
//!
use std::collections::VecDeque;

use cfg_if::cfg_if;

use crate::errors::{PoolError, Result};
use crate::value::{Row, Value};

cfg_if! {
    if #[cfg(feature = "mysql-sync")] {
        pub mod mysql;
    }
}

cfg_if! {
    if #[cfg(feature = "postgres-sync")] {
        pub mod postgres;
    }
}

cfg_if! {
    if #[cfg(feature = "sqlite-sync")] {
        pub mod sqlite;
    }
}

/// Connection-kind tag used to pick a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverType {
    MySQL,
    Sqlite,
    Oracle,
    Postgres,
    Mssql,
    Unsupported,
}

impl Default for DriverType {
    fn default() -> Self {
        DriverType::Unsupported
    }
}

/// Server-side transaction state, as libpq reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Connected, no transaction open.
    Idle,
    /// A command is in flight.
    Active,
    InTransaction,
    /// Inside a failed transaction block.
    InError,
    Unknown,
}

/// The cursor side of a database client.
pub trait Cursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()>;

    /// Runs `sql` once per parameter set; `rowcount` afterwards is the sum of
    /// the individual counts.
    fn executemany(&mut self, sql: &str, seq_of_params: &[Vec<Value>]) -> Result<()>;

    fn fetchone(&mut self) -> Result<Option<Row>>;

    /// Fetches up to `size` rows, one when `None`.
    fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>>;

    fn fetchall(&mut self) -> Result<Vec<Row>>;

    fn close(&mut self) -> Result<()>;

    /// Rows produced or affected by the last execute, `-1` when unknown.
    fn rowcount(&self) -> i64;
}

/// A database client connection owned by a pool.
///
/// Only `close`, `commit`, `rollback` and `cursor` are required. The remaining
/// methods expose metadata some validators use to skip a round trip; their
/// defaults are conservative, so a validator depending on them will treat an
/// adapter that does not override them as unhealthy.
pub trait Connection: Send {
    fn close(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>>;

    fn driver_type(&self) -> DriverType {
        DriverType::Unsupported
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn transaction_status(&self) -> TransactionStatus {
        TransactionStatus::Unknown
    }

    fn ping(&mut self) -> Result<()> {
        Err(PoolError::Unsupported("ping".to_string()))
    }
}

/// The form in which pools hand out connections.
pub type BoxConnection = Box<dyn Connection>;

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        (**self).cursor()
    }

    fn driver_type(&self) -> DriverType {
        (**self).driver_type()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn transaction_status(&self) -> TransactionStatus {
        (**self).transaction_status()
    }

    fn ping(&mut self) -> Result<()> {
        (**self).ping()
    }
}

/// Connections checked out of an r2d2 pool go back to it when dropped.
impl<M> Connection for r2d2::PooledConnection<M>
where
    M: r2d2::ManageConnection,
    M::Connection: Connection,
{
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        (**self).cursor()
    }

    fn driver_type(&self) -> DriverType {
        (**self).driver_type()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn transaction_status(&self) -> TransactionStatus {
        (**self).transaction_status()
    }

    fn ping(&mut self) -> Result<()> {
        (**self).ping()
    }
}

/// Client-side buffer behind the driver cursors.
#[allow(unused)]
#[derive(Debug, Default)]
pub(crate) struct ResultBuffer {
    rows: VecDeque<Row>,
    rowcount: i64,
    closed: bool,
}

#[allow(unused)]
impl ResultBuffer {
    pub(crate) fn new() -> Self {
        ResultBuffer {
            rows: VecDeque::new(),
            rowcount: -1,
            closed: false,
        }
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(PoolError::driver("cursor already closed"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn set_rows(&mut self, rows: Vec<Row>) {
        self.rowcount = rows.len() as i64;
        self.rows = rows.into();
    }

    pub(crate) fn set_affected(&mut self, affected: u64) {
        self.rows.clear();
        self.rowcount = affected as i64;
    }

    pub(crate) fn reset(&mut self) {
        self.rows.clear();
        self.rowcount = -1;
    }

    pub(crate) fn fetchone(&mut self) -> Result<Option<Row>> {
        self.check_open()?;
        Ok(self.rows.pop_front())
    }

    pub(crate) fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        self.check_open()?;
        let n = size.unwrap_or(1).min(self.rows.len());
        Ok(self.rows.drain(..n).collect())
    }

    pub(crate) fn fetchall(&mut self) -> Result<Vec<Row>> {
        self.check_open()?;
        Ok(self.rows.drain(..).collect())
    }

    pub(crate) fn close(&mut self) {
        self.rows.clear();
        self.closed = true;
    }

    pub(crate) fn rowcount(&self) -> i64 {
        self.rowcount
    }
}
