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
//! PostgreSQL adapter over the `postgres` crate.
//!
use std::error::Error as StdError;
use std::fmt;

use bytes::BytesMut;
use postgres::types::{IsNull, ToSql, Type};
use postgres::{Client, NoTls};

use crate::driver::{BoxConnection, Connection, Cursor, DriverType, ResultBuffer, TransactionStatus};
use crate::errors::{PoolError, Result};
use crate::value::{Row, Value};

/// A PostgreSQL client that opens a transaction before the first statement
/// and tracks its transaction status locally.
pub struct PostgresConnection {
    client: Option<Client>,
    status: TransactionStatus,
}

impl PostgresConnection {
    pub fn connect(config: &postgres::Config) -> Result<Self> {
        Ok(Self::from_client(config.connect(NoTls)?))
    }

    pub fn from_client(client: Client) -> Self {
        PostgresConnection {
            client: Some(client),
            status: TransactionStatus::Idle,
        }
    }

    fn raw(&mut self) -> Result<&mut Client> {
        self.client.as_mut().ok_or(PoolError::Closed)
    }

    /// Ends the open transaction, if any, with `sql`.
    fn finish(&mut self, sql: &str) -> Result<()> {
        if self.status == TransactionStatus::Idle {
            return Ok(());
        }
        let result = self.raw()?.batch_execute(sql);
        self.status = match result {
            Ok(()) => TransactionStatus::Idle,
            Err(_) => TransactionStatus::Unknown,
        };
        result.map_err(PoolError::from)
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("status", &self.status)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection for PostgresConnection {
    fn close(&mut self) -> Result<()> {
        self.status = TransactionStatus::Unknown;
        if let Some(client) = self.client.take() {
            client.close()?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.finish("ROLLBACK")
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let client = self.client.as_mut().ok_or(PoolError::Closed)?;
        Ok(Box::new(PostgresCursor {
            client,
            status: &mut self.status,
            buffer: ResultBuffer::new(),
        }))
    }

    fn driver_type(&self) -> DriverType {
        DriverType::Postgres
    }

    fn is_closed(&self) -> bool {
        self.client.as_ref().map_or(true, |c| c.is_closed())
    }

    fn transaction_status(&self) -> TransactionStatus {
        if self.is_closed() {
            TransactionStatus::Unknown
        } else {
            self.status
        }
    }

    fn ping(&mut self) -> Result<()> {
        self.raw()?.simple_query("SELECT 1")?;
        Ok(())
    }
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, Box<dyn StdError + Sync + Send>> {
    if *ty == Type::INT2 {
        i16::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::OID {
        u32::try_from(v)?.to_sql(ty, out)
    } else {
        v.to_sql(ty, out)
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => int_to_sql(*v, ty, out),
            Value::UInt(v) => int_to_sql(i64::try_from(*v)?, ty, out),
            Value::Float(v) if *ty == Type::FLOAT4 => (*v as f32).to_sql(ty, out),
            Value::Float(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    postgres::types::to_sql_checked!();
}

fn column_value(row: &postgres::Row, idx: usize, ty: &Type) -> Result<Value> {
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.into()
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.into()
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.into()
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.into()
    } else if *ty == Type::OID {
        row.try_get::<_, Option<u32>>(idx)?.into()
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?.into()
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?.into()
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx)?.into()
    } else {
        row.try_get::<_, Option<String>>(idx)
            .map_err(|_| PoolError::Unsupported(format!("column type {}", ty.name())))?
            .into()
    };
    Ok(value)
}

pub struct PostgresCursor<'c> {
    client: &'c mut Client,
    status: &'c mut TransactionStatus,
    buffer: ResultBuffer,
}

impl PostgresCursor<'_> {
    fn run(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        let stmt = self.client.prepare(sql)?;
        let args: Vec<&(dyn ToSql + Sync)> = params.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        if stmt.columns().is_empty() {
            let affected = self.client.execute(&stmt, &args)?;
            self.buffer.set_affected(affected);
            return Ok(());
        }
        let rows = self.client.query(&stmt, &args)?;
        let mut out: Vec<Row> = Vec::with_capacity(rows.len());
        for row in &rows {
            let values = row
                .columns()
                .iter()
                .enumerate()
                .map(|(idx, col)| column_value(row, idx, col.type_()))
                .collect::<Result<Row>>()?;
            out.push(values);
        }
        self.buffer.set_rows(out);
        Ok(())
    }
}

impl Cursor for PostgresCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        self.buffer.check_open()?;
        self.buffer.reset();
        if *self.status == TransactionStatus::Idle {
            self.client.batch_execute("BEGIN")?;
            *self.status = TransactionStatus::InTransaction;
        }
        let result = self.run(sql, params);
        if result.is_err() {
            *self.status = if self.client.is_closed() {
                TransactionStatus::Unknown
            } else {
                TransactionStatus::InError
            };
        }
        result
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

/// Opens PostgreSQL connections for pools.
#[derive(Clone, Debug)]
pub struct PostgresConnectionManager {
    config: postgres::Config,
}

impl PostgresConnectionManager {
    pub fn new(config: postgres::Config) -> Self {
        PostgresConnectionManager { config }
    }

    pub fn from_url(url: &str) -> Result<Self> {
        let config = url
            .parse::<postgres::Config>()
            .map_err(|e| PoolError::configuration(format!("Invalid PostgreSQL URL: {}", e)))?;
        Ok(Self::new(config))
    }

    pub fn open(&self) -> Result<PostgresConnection> {
        PostgresConnection::connect(&self.config)
    }

    /// A connection factory for [`BlockingPool`](crate::BlockingPool).
    pub fn factory(&self) -> impl Fn() -> Result<BoxConnection> + Send + Sync + 'static {
        let manager = self.clone();
        move || Ok(Box::new(manager.open()?) as BoxConnection)
    }
}

impl r2d2::ManageConnection for PostgresConnectionManager {
    type Connection = PostgresConnection;
    type Error = PoolError;

    fn connect(&self) -> Result<PostgresConnection> {
        self.open()
    }

    fn is_valid(&self, conn: &mut PostgresConnection) -> Result<()> {
        conn.ping()
    }

    fn has_broken(&self, conn: &mut PostgresConnection) -> bool {
        conn.is_closed()
    }
}
