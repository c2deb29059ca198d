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
//! Tests.
//!
use std::sync::Arc;

use dbpool::*;

mod common;
use common::*;

#[derive(Debug)]
enum AppError {
    Pool(PoolError),
    Rejected(&'static str),
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        AppError::Pool(err)
    }
}

fn mock() -> (MockConnection, Arc<Stats>) {
    let stats = Arc::new(Stats::default());
    (MockConnection::new(7, stats.clone()), stats)
}

#[test]
fn commits_once_when_the_body_succeeds() {
    let (mut conn, stats) = mock();

    let id = transaction(&mut conn, |conn| Ok::<_, PoolError>(connection_id(conn))).unwrap();

    assert_eq!(id, 7);
    assert_eq!(stats.commits(), 1);
    assert_eq!(stats.rollbacks(), 0);
}

#[test]
fn rolls_back_once_and_returns_the_body_error() {
    let (mut conn, stats) = mock();

    let result: std::result::Result<(), AppError> = transaction(&mut conn, |conn| {
        connection_id(conn);
        Err(AppError::Rejected("duplicate user"))
    });

    assert!(matches!(result, Err(AppError::Rejected("duplicate user"))));
    assert_eq!(stats.commits(), 0);
    assert_eq!(stats.rollbacks(), 1);
}

#[test]
fn failed_rollback_keeps_the_body_error() {
    let (mut conn, stats) = mock();
    conn.fail_rollback = true;

    let result: std::result::Result<(), AppError> =
        transaction(&mut conn, |_| Err(AppError::Rejected("boom")));

    assert!(matches!(result, Err(AppError::Rejected("boom"))));
    assert_eq!(stats.rollbacks(), 1);
}

#[test]
fn driver_errors_inside_the_body_roll_back() {
    let (mut conn, stats) = mock();
    conn.healthy = false;

    let result = transaction(&mut conn, |conn| {
        let mut cursor = conn.cursor()?;
        cursor.execute("UPDATE t SET a = 1", &[])?;
        Ok::<_, AppError>(())
    });

    assert!(matches!(result, Err(AppError::Pool(PoolError::Driver(_)))));
    assert_eq!(stats.rollbacks(), 1);
}

#[test]
fn unfinished_transaction_rolls_back_on_drop() {
    let (mut conn, stats) = mock();
    {
        let mut tx = Transaction::begin(&mut conn);
        let mut cursor = tx.cursor().unwrap();
        cursor.execute("DELETE FROM t", &[]).unwrap();
    }
    assert_eq!(stats.rollbacks(), 1);
    assert_eq!(stats.commits(), 0);
}

#[test]
fn explicit_commit_skips_the_drop_rollback() {
    let (mut conn, stats) = mock();

    let tx = Transaction::begin(&mut conn);
    tx.commit().unwrap();

    assert_eq!(stats.commits(), 1);
    assert_eq!(stats.rollbacks(), 0);
    assert_eq!(conn.status, TransactionStatus::Idle);
}

#[test]
fn takes_connection_releases_on_both_paths() {
    let factory = MockFactory::new();
    let pool = BlockingPool::new(factory.build(), PoolConfig::default().set_limit(1));

    let id = takes_connection(&pool, |conn| Ok::<_, PoolError>(connection_id(conn))).unwrap();
    assert_eq!(id, 0);
    assert_eq!(pool.status(), PoolStatus { size: 1, available: 1 });

    let result: std::result::Result<(), AppError> =
        takes_connection(&pool, |_| Err(AppError::Rejected("nope")));
    assert!(matches!(result, Err(AppError::Rejected("nope"))));
    assert_eq!(pool.status(), PoolStatus { size: 1, available: 1 });
}

#[test]
fn takes_connection_surfaces_acquire_errors() {
    let factory = MockFactory::new();
    factory.refuse.store(true, std::sync::atomic::Ordering::SeqCst);
    let pool = PassThroughPool::new(factory.build());

    let mut called = false;
    let result = takes_connection(&pool, |_| {
        called = true;
        Ok::<_, AppError>(())
    });

    assert!(matches!(result, Err(AppError::Pool(PoolError::Driver(_)))));
    assert!(!called);
}

struct UserRepo {
    pool: BlockingPool,
    table: &'static str,
}

impl Connect for UserRepo {
    type Pool = BlockingPool;

    fn connection_pool(&self) -> &BlockingPool {
        &self.pool
    }
}

impl UserRepo {
    fn load(&self, conn: &mut dyn Connection) -> Result<i64> {
        let mut cursor = conn.cursor()?;
        cursor.execute(&format!("SELECT id FROM {}", self.table), &[])?;
        let row = cursor.fetchone()?.ok_or(PoolError::Closed)?;
        Ok(row[0].as_i64().unwrap_or_default())
    }
}

#[test]
fn connect_injects_a_connection_per_call() {
    let factory = MockFactory::new();
    let repo = UserRepo {
        pool: BlockingPool::new(factory.build(), PoolConfig::default()),
        table: "t_user",
    };

    let id = repo.with_connection(|repo, conn| repo.load(conn)).unwrap();
    assert_eq!(id, 0);
    let id = repo.with_connection(|repo, conn| repo.load(conn)).unwrap();
    assert_eq!(id, 0);
    assert_eq!(factory.stats.created(), 1);
}

#[test]
fn transaction_over_a_pooled_connection() {
    let factory = MockFactory::new();
    let pool = BlockingPool::new(factory.build(), PoolConfig::default());

    takes_connection(&pool, |conn| {
        transaction(conn, |conn| {
            let mut cursor = conn.cursor()?;
            cursor.execute("INSERT INTO t VALUES (?)", &params![1, "a"])?;
            Ok::<_, PoolError>(())
        })
    })
    .unwrap();

    assert_eq!(factory.stats.commits(), 1);
}
