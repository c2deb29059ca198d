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
use std::time::Duration;

use dbpool::*;

mod common;
use common::*;

fn mock() -> (MockConnection, Arc<Stats>) {
    let stats = Arc::new(Stats::default());
    (MockConnection::new(1, stats.clone()), stats)
}

#[test]
fn default_validator_probes_with_a_query() {
    let (mut conn, stats) = mock();
    assert!(DefaultValidator.validate(&mut conn));
    assert_eq!(stats.queries.load(std::sync::atomic::Ordering::SeqCst), 1);

    conn.healthy = false;
    assert!(!DefaultValidator.validate(&mut conn));
}

#[test]
fn default_release_rolls_back_then_validates() {
    let (mut conn, stats) = mock();
    assert!(DefaultValidator.before_release(&mut conn));
    assert_eq!(stats.rollbacks(), 1);

    conn.fail_rollback = true;
    assert!(!DefaultValidator.before_release(&mut conn));

    conn.fail_rollback = false;
    conn.healthy = false;
    assert!(!DefaultValidator.before_release(&mut conn));
}

#[test]
fn closed_connections_fail_validation() {
    let (mut conn, _) = mock();
    conn.close().unwrap();
    assert!(!DefaultValidator.validate(&mut conn));
    assert!(!OracleValidator.validate(&mut conn));
    assert!(!MssqlValidator.validate(&mut conn));
}

#[test]
fn postgres_release_depends_on_transaction_status() {
    let (mut conn, stats) = mock();

    conn.status = TransactionStatus::Idle;
    assert!(PostgresValidator.before_release(&mut conn));
    assert_eq!(stats.rollbacks(), 0);

    for status in [
        TransactionStatus::Active,
        TransactionStatus::InTransaction,
        TransactionStatus::InError,
    ] {
        conn.status = status;
        assert!(PostgresValidator.before_release(&mut conn));
        assert_eq!(conn.status, TransactionStatus::Idle);
    }
    assert_eq!(stats.rollbacks(), 3);

    conn.status = TransactionStatus::Unknown;
    assert!(!PostgresValidator.before_release(&mut conn));

    conn.status = TransactionStatus::InTransaction;
    conn.fail_rollback = true;
    assert!(!PostgresValidator.before_release(&mut conn));

    conn.close().unwrap();
    assert!(!PostgresValidator.before_release(&mut conn));
}

#[test]
fn mysql_validator_needs_ping() {
    // The mock does not implement ping.
    let (mut conn, _) = mock();
    assert!(!MysqlValidator.validate(&mut conn));
}

#[test]
fn builtins_are_registered_per_driver() {
    let registry = ValidatorRegistry::with_builtins();
    assert_eq!(registry.lookup(DriverType::Postgres).name(), "postgres");
    assert_eq!(registry.lookup(DriverType::MySQL).name(), "mysql");
    assert_eq!(registry.lookup(DriverType::Mssql).name(), "mssql");
    assert_eq!(registry.lookup(DriverType::Oracle).name(), "oracle");
    assert_eq!(registry.lookup(DriverType::Sqlite).name(), "default");
    assert!(!registry.contains(DriverType::Sqlite));
}

#[test]
fn registry_resolves_by_connection_driver() {
    let registry = ValidatorRegistry::new();
    let (mut conn, _) = mock();
    assert_eq!(registry.resolve(&conn).name(), "default");

    registry.register(DriverType::Sqlite, ScriptedValidator::default());
    conn.driver = DriverType::Sqlite;
    assert!(registry.contains(DriverType::Sqlite));
    assert_eq!(registry.resolve(&conn).name(), "scripted");

    registry.register(DriverType::Sqlite, OracleValidator);
    assert_eq!(registry.resolve(&conn).name(), "oracle");
}

#[test]
fn global_registry_is_shared() {
    let a = ValidatorRegistry::global();
    let b = ValidatorRegistry::global();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.contains(DriverType::Postgres));
}

#[test]
fn config_defaults() {
    let cfg = PoolConfig::default();
    assert_eq!(cfg.limit(), 0);
    assert_eq!(cfg.timeout(), Duration::from_secs(5));
    assert!(matches!(cfg.validation(), Validation::Auto));
    assert!(!cfg.is_validation_set());
    assert_eq!(cfg.max_validation_retries(), 3);
    assert_eq!(cfg.set_limit(10).max_validation_retries(), 13);
}

#[test]
fn config_from_json() {
    let cfg: PoolConfig =
        serde_json::from_str(r#"{"limit": 8, "timeout": {"secs": 2, "nanos": 0}}"#).unwrap();
    assert_eq!(cfg.limit(), 8);
    assert_eq!(cfg.timeout(), Duration::from_secs(2));
    assert!(matches!(cfg.validation(), Validation::Auto));
    assert!(Arc::ptr_eq(cfg.registry(), &ValidatorRegistry::global()));

    let partial: PoolConfig = serde_json::from_str(r#"{"limit": 1}"#).unwrap();
    assert_eq!(partial.timeout(), Duration::from_secs(5));

    let json = serde_json::to_string(&cfg.set_validator(DefaultValidator)).unwrap();
    assert_eq!(json, r#"{"limit":8,"timeout":{"secs":2,"nanos":0}}"#);
}
