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
//! Scripted in-memory driver shared by the integration tests.
//!
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dbpool::{BoxConnection, Connection, Cursor, DriverType, PoolError, Result, Row, TransactionStatus, Value, Validator};

/// Counters shared by every connection a factory produced.
#[derive(Debug, Default)]
pub struct Stats {
    pub created: AtomicUsize,
    pub closed: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub queries: AtomicUsize,
}

impl Stats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

pub struct MockConnection {
    pub id: usize,
    pub stats: Arc<Stats>,
    pub healthy: bool,
    pub fail_rollback: bool,
    pub closed: bool,
    pub driver: DriverType,
    pub status: TransactionStatus,
}

impl MockConnection {
    pub fn new(id: usize, stats: Arc<Stats>) -> Self {
        MockConnection {
            id,
            stats,
            healthy: true,
            fail_rollback: false,
            closed: false,
            driver: DriverType::Unsupported,
            status: TransactionStatus::Idle,
        }
    }
}

impl Connection for MockConnection {
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.stats.commits.fetch_add(1, Ordering::SeqCst);
        self.status = TransactionStatus::Idle;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.stats.rollbacks.fetch_add(1, Ordering::SeqCst);
        if self.fail_rollback {
            return Err(PoolError::driver("rollback refused"));
        }
        self.status = TransactionStatus::Idle;
        Ok(())
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        if self.closed {
            return Err(PoolError::Closed);
        }
        Ok(Box::new(MockCursor {
            conn: self,
            rows: Vec::new(),
        }))
    }

    fn driver_type(&self) -> DriverType {
        self.driver
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn transaction_status(&self) -> TransactionStatus {
        self.status
    }
}

/// Every statement yields one row holding the connection id.
pub struct MockCursor<'c> {
    conn: &'c mut MockConnection,
    rows: Vec<Row>,
}

impl Cursor for MockCursor<'_> {
    fn execute(&mut self, _sql: &str, _params: &[Value]) -> Result<()> {
        self.conn.stats.queries.fetch_add(1, Ordering::SeqCst);
        if !self.conn.healthy {
            return Err(PoolError::driver("server has gone away"));
        }
        self.conn.status = TransactionStatus::InTransaction;
        self.rows = vec![vec![Value::Int(self.conn.id as i64)]];
        Ok(())
    }

    fn executemany(&mut self, sql: &str, seq_of_params: &[Vec<Value>]) -> Result<()> {
        for params in seq_of_params {
            self.execute(sql, params)?;
        }
        Ok(())
    }

    fn fetchone(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop())
    }

    fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        let n = size.unwrap_or(1).min(self.rows.len());
        Ok(self.rows.drain(..n).collect())
    }

    fn fetchall(&mut self) -> Result<Vec<Row>> {
        Ok(std::mem::take(&mut self.rows))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn rowcount(&self) -> i64 {
        self.rows.len() as i64
    }
}

/// Produces `MockConnection`s; the first `unhealthy_first` are broken.
#[derive(Clone)]
pub struct MockFactory {
    pub stats: Arc<Stats>,
    pub unhealthy_first: usize,
    pub driver: DriverType,
    pub refuse: Arc<AtomicBool>,
}

impl MockFactory {
    pub fn new() -> Self {
        MockFactory {
            stats: Arc::new(Stats::default()),
            unhealthy_first: 0,
            driver: DriverType::Unsupported,
            refuse: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn unhealthy_first(mut self, n: usize) -> Self {
        self.unhealthy_first = n;
        self
    }

    pub fn driver(mut self, driver: DriverType) -> Self {
        self.driver = driver;
        self
    }

    pub fn open(&self) -> Result<MockConnection> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(PoolError::driver("connection refused"));
        }
        let id = self.stats.created.fetch_add(1, Ordering::SeqCst);
        let mut conn = MockConnection::new(id, self.stats.clone());
        conn.healthy = id >= self.unhealthy_first;
        conn.driver = self.driver;
        Ok(conn)
    }

    pub fn build(&self) -> impl Fn() -> Result<BoxConnection> + Send + Sync + 'static {
        let factory = self.clone();
        move || Ok(Box::new(factory.open()?) as BoxConnection)
    }
}

/// Reads the id the mock cursor reports.
pub fn connection_id(conn: &mut dyn Connection) -> i64 {
    let mut cursor = conn.cursor().expect("cursor");
    cursor.execute("SELECT id", &[]).expect("execute");
    let row = cursor.fetchone().expect("fetch").expect("row");
    row[0].as_i64().expect("id")
}

/// Validator with fixed answers that counts its calls.
#[derive(Default)]
pub struct ScriptedValidator {
    pub reject_release: bool,
    pub validations: AtomicUsize,
    pub releases: AtomicUsize,
}

impl Validator for ScriptedValidator {
    fn validate(&self, _conn: &mut dyn Connection) -> bool {
        self.validations.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn before_release(&self, _conn: &mut dyn Connection) -> bool {
        self.releases.fetch_add(1, Ordering::SeqCst);
        !self.reject_release
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
