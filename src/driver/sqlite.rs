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
//! SQLite adapter over `rusqlite`.
//!
use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, OpenFlags, ToSql};

use crate::driver::{BoxConnection, Connection, Cursor, DriverType, ResultBuffer, TransactionStatus};
use crate::errors::{PoolError, Result};
use crate::value::{Row, Value};

/// A `rusqlite` connection behaving like a DB-API one: data-changing
/// statements open a transaction that lasts until `commit` or `rollback`.
pub struct SqliteConnection {
    conn: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_raw(rusqlite::Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_raw(rusqlite::Connection::open_in_memory()?))
    }

    pub fn from_raw(conn: rusqlite::Connection) -> Self {
        SqliteConnection { conn: Some(conn) }
    }

    fn raw(&mut self) -> Result<&mut rusqlite::Connection> {
        self.conn.as_mut().ok_or(PoolError::Closed)
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("closed", &self.conn.is_none())
            .finish()
    }
}

impl Connection for SqliteConnection {
    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| PoolError::from(e))?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let conn = self.raw()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let conn = self.raw()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let conn = self.raw()?;
        Ok(Box::new(SqliteCursor {
            conn,
            buffer: ResultBuffer::new(),
        }))
    }

    fn driver_type(&self) -> DriverType {
        DriverType::Sqlite
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn transaction_status(&self) -> TransactionStatus {
        match self.conn {
            None => TransactionStatus::Unknown,
            Some(ref conn) if conn.is_autocommit() => TransactionStatus::Idle,
            Some(_) => TransactionStatus::InTransaction,
        }
    }

    fn ping(&mut self) -> Result<()> {
        self.raw()?.execute_batch("")?;
        Ok(())
    }
}

/// Statements that implicitly open a transaction.
fn starts_transaction(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    ["INSERT", "UPDATE", "DELETE", "REPLACE"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sql::Null),
            Value::Bool(v) => ToSqlOutput::Owned(Sql::Integer(*v as i64)),
            Value::Int(v) => ToSqlOutput::Owned(Sql::Integer(*v)),
            Value::UInt(v) => {
                let v = i64::try_from(*v)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(Sql::Integer(v))
            }
            Value::Float(v) => ToSqlOutput::Owned(Sql::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        })
    }
}

pub struct SqliteCursor<'c> {
    conn: &'c rusqlite::Connection,
    buffer: ResultBuffer,
}

impl Cursor for SqliteCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        self.buffer.check_open()?;
        self.buffer.reset();
        let conn = self.conn;
        if conn.is_autocommit() && starts_transaction(sql) {
            conn.execute_batch("BEGIN")?;
        }
        let mut stmt = conn.prepare(sql)?;
        let columns = stmt.column_count();
        if columns == 0 {
            let affected = stmt.execute(params_from_iter(params.iter()))?;
            self.buffer.set_affected(affected as u64);
            return Ok(());
        }
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out: Vec<Row> = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns);
            for idx in 0..columns {
                values.push(from_value_ref(row.get_ref(idx)?));
            }
            out.push(values);
        }
        self.buffer.set_rows(out);
        Ok(())
    }

    fn executemany(&mut self, sql: &str, seq_of_params: &[Vec<Value>]) -> Result<()> {
        let mut total = 0;
        for params in seq_of_params {
            self.execute(sql, params)?;
            total += self.buffer.rowcount().max(0);
        }
        self.buffer.set_affected(total as u64);
        Ok(())
    }

    fn fetchone(&mut self) -> Result<Option<Row>> {
        self.buffer.fetchone()
    }

    fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        self.buffer.fetchmany(size)
    }

    fn fetchall(&mut self) -> Result<Vec<Row>> {
        self.buffer.fetchall()
    }

    fn close(&mut self) -> Result<()> {
        self.buffer.close();
        Ok(())
    }

    fn rowcount(&self) -> i64 {
        self.buffer.rowcount()
    }
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Memory,
}

/// Opens SQLite connections for pools.
#[derive(Debug, Clone)]
pub struct SqliteConnectionManager {
    source: Source,
    flags: OpenFlags,
}

impl SqliteConnectionManager {
    /// Creates a new `SqliteConnectionManager` from file.
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        SqliteConnectionManager {
            source: Source::File(path.as_ref().to_path_buf()),
            flags: OpenFlags::default(),
        }
    }

    /// Every connection is a separate, empty in-memory database.
    pub fn memory() -> Self {
        SqliteConnectionManager {
            source: Source::Memory,
            flags: OpenFlags::default(),
        }
    }

    pub fn with_flags(self, flags: OpenFlags) -> Self {
        SqliteConnectionManager { flags, ..self }
    }

    pub fn open(&self) -> Result<SqliteConnection> {
        let conn = match self.source {
            Source::File(ref path) => rusqlite::Connection::open_with_flags(path, self.flags)?,
            Source::Memory => rusqlite::Connection::open_in_memory_with_flags(self.flags)?,
        };
        Ok(SqliteConnection::from_raw(conn))
    }

    /// A connection factory for [`BlockingPool`](crate::BlockingPool).
    pub fn factory(&self) -> impl Fn() -> Result<BoxConnection> + Send + Sync + 'static {
        let manager = self.clone();
        move || Ok(Box::new(manager.open()?) as BoxConnection)
    }
}

impl r2d2::ManageConnection for SqliteConnectionManager {
    type Connection = SqliteConnection;
    type Error = PoolError;

    fn connect(&self) -> Result<SqliteConnection> {
        self.open()
    }

    fn is_valid(&self, conn: &mut SqliteConnection) -> Result<()> {
        conn.ping()
    }

    fn has_broken(&self, conn: &mut SqliteConnection) -> bool {
        conn.is_closed()
    }
}
