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
//! MySQL adapter over the `mysql` crate.
//!
use std::fmt;

use mysql::prelude::Queryable;
use mysql::{Conn, Opts};

use crate::driver::{BoxConnection, Connection, Cursor, DriverType, ResultBuffer};
use crate::errors::{PoolError, Result};
use crate::value::{Row, Value};

/// A MySQL connection with autocommit turned off, so statements accumulate
/// in a transaction until `commit` or `rollback`.
pub struct MysqlConnection {
    conn: Option<Conn>,
}

impl MysqlConnection {
    pub fn connect<T: Into<Opts>>(opts: T) -> Result<Self> {
        let opts: Opts = opts.into();
        let mut conn = Conn::new(opts)?;
        conn.query_drop("SET autocommit = 0")?;
        Ok(MysqlConnection { conn: Some(conn) })
    }

    fn raw(&mut self) -> Result<&mut Conn> {
        self.conn.as_mut().ok_or(PoolError::Closed)
    }
}

impl fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlConnection")
            .field("connection_id", &self.conn.as_ref().map(|c| c.connection_id()))
            .finish()
    }
}

impl Connection for MysqlConnection {
    fn close(&mut self) -> Result<()> {
        // The session ends when the client is dropped.
        self.conn.take();
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.raw()?.query_drop("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.raw()?.query_drop("ROLLBACK")?;
        Ok(())
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let conn = self.raw()?;
        Ok(Box::new(MysqlCursor {
            conn,
            buffer: ResultBuffer::new(),
        }))
    }

    fn driver_type(&self) -> DriverType {
        DriverType::MySQL
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn ping(&mut self) -> Result<()> {
        self.raw()?.ping()?;
        Ok(())
    }
}

fn to_mysql(value: &Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Bool(v) => mysql::Value::Int(*v as i64),
        Value::Int(v) => mysql::Value::Int(*v),
        Value::UInt(v) => mysql::Value::UInt(*v),
        Value::Float(v) => mysql::Value::Double(*v),
        Value::Text(v) => mysql::Value::Bytes(v.clone().into_bytes()),
        Value::Bytes(v) => mysql::Value::Bytes(v.clone()),
    }
}

fn from_mysql(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql::Value::Int(v) => Value::Int(v),
        mysql::Value::UInt(v) => Value::UInt(v),
        mysql::Value::Float(v) => Value::Float(v.into()),
        mysql::Value::Double(v) => Value::Float(v),
        mysql::Value::Date(y, m, d, 0, 0, 0, 0) => Value::Text(format!("{:04}-{:02}-{:02}", y, m, d)),
        mysql::Value::Date(y, m, d, h, i, s, us) => Value::Text(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            y, m, d, h, i, s, us
        )),
        mysql::Value::Time(neg, days, h, i, s, us) => Value::Text(format!(
            "{}{:02}:{:02}:{:02}.{:06}",
            if neg { "-" } else { "" },
            days * 24 + u32::from(h),
            i,
            s,
            us
        )),
    }
}

fn collect_rows<I>(rows: I) -> Result<Vec<Row>>
where
    I: Iterator<Item = mysql::Result<mysql::Row>>,
{
    // `Row::unwrap` hands over the column values; it only panics on a row
    // whose columns were already taken.
    rows.map(|row| Ok(row?.unwrap().into_iter().map(from_mysql).collect()))
        .collect()
}

pub struct MysqlCursor<'c> {
    conn: &'c mut Conn,
    buffer: ResultBuffer,
}

impl Cursor for MysqlCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        self.buffer.check_open()?;
        self.buffer.reset();
        // Parameterless statements go over the text protocol, which accepts
        // commands the binary protocol cannot prepare.
        let (rows, affected) = if params.is_empty() {
            let mut result = self.conn.query_iter(sql)?;
            let rows = collect_rows(result.by_ref())?;
            (rows, result.affected_rows())
        } else {
            let params: Vec<mysql::Value> = params.iter().map(to_mysql).collect();
            let mut result = self.conn.exec_iter(sql, mysql::Params::Positional(params))?;
            let rows = collect_rows(result.by_ref())?;
            (rows, result.affected_rows())
        };
        if rows.is_empty() {
            self.buffer.set_affected(affected);
        } else {
            self.buffer.set_rows(rows);
        }
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

/// Opens MySQL connections for pools.
#[derive(Clone, Debug)]
pub struct MysqlConnectionManager {
    params: Opts,
}

impl MysqlConnectionManager {
    pub fn new<T: Into<Opts>>(params: T) -> Self {
        MysqlConnectionManager {
            params: params.into(),
        }
    }

    pub fn from_url(url: &str) -> Result<Self> {
        let opts = Opts::from_url(url)
            .map_err(|e| PoolError::configuration(format!("Invalid MySQL URL: {}", e)))?;
        Ok(Self::new(opts))
    }

    pub fn open(&self) -> Result<MysqlConnection> {
        MysqlConnection::connect(self.params.clone())
    }

    /// A connection factory for [`BlockingPool`](crate::BlockingPool).
    pub fn factory(&self) -> impl Fn() -> Result<BoxConnection> + Send + Sync + 'static {
        let manager = self.clone();
        move || Ok(Box::new(manager.open()?) as BoxConnection)
    }
}

impl r2d2::ManageConnection for MysqlConnectionManager {
    type Connection = MysqlConnection;
    type Error = PoolError;

    fn connect(&self) -> Result<MysqlConnection> {
        self.open()
    }

    fn is_valid(&self, conn: &mut MysqlConnection) -> Result<()> {
        conn.ping()
    }

    fn has_broken(&self, conn: &mut MysqlConnection) -> bool {
        conn.is_closed()
    }
}
