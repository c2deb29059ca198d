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


use dbpool::{BoxConnection, Connection, Cursor, PoolError, Result, Row, Value};

/// A connection that answers every statement with one constant row.
pub struct NoopConnection;

impl Connection for NoopConnection {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Ok(())
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        Ok(Box::new(NoopCursor { row: None }))
    }
}

pub struct NoopCursor {
    row: Option<Row>,
}

impl Cursor for NoopCursor {
    fn execute(&mut self, _sql: &str, _params: &[Value]) -> Result<()> {
        self.row = Some(vec![Value::Int(1)]);
        Ok(())
    }

    fn executemany(&mut self, sql: &str, seq_of_params: &[Vec<Value>]) -> Result<()> {
        for params in seq_of_params {
            self.execute(sql, params)?;
        }
        Ok(())
    }

    fn fetchone(&mut self) -> Result<Option<Row>> {
        Ok(self.row.take())
    }

    fn fetchmany(&mut self, _size: Option<usize>) -> Result<Vec<Row>> {
        Ok(self.row.take().into_iter().collect())
    }

    fn fetchall(&mut self) -> Result<Vec<Row>> {
        Ok(self.row.take().into_iter().collect())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn rowcount(&self) -> i64 {
        self.row.is_some() as i64
    }
}

pub fn noop_factory() -> impl Fn() -> std::result::Result<BoxConnection, PoolError> + Send + Sync + 'static {
    || Ok(Box::new(NoopConnection) as BoxConnection)
}
