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
//! Connection validators and the registry that picks one per driver.
//!
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::driver::{Connection, DriverType, TransactionStatus};
use crate::errors::Result;

/// Decides whether a connection is alive and whether it may be pooled again.
///
/// Implementations never propagate driver errors: any failure while probing
/// a connection is reported as `false`.
pub trait Validator: Send + Sync {
    /// Called on every acquisition before the connection is handed out.
    fn validate(&self, conn: &mut dyn Connection) -> bool;

    /// Called when a connection is released. Returning `false` makes the
    /// pool close and forget it.
    fn before_release(&self, conn: &mut dyn Connection) -> bool {
        if conn.rollback().is_err() {
            return false;
        }
        self.validate(conn)
    }

    fn name(&self) -> &'static str {
        "validator"
    }
}

impl fmt::Debug for dyn Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name()).finish()
    }
}

/// Runs `sql`, optionally fetches a row, and closes the cursor.
fn probe(conn: &mut dyn Connection, sql: &str, fetch: bool) -> Result<()> {
    let mut cursor = conn.cursor()?;
    cursor.execute(sql, &[])?;
    if fetch {
        cursor.fetchone()?;
        cursor.close()?;
    }
    Ok(())
}

/// Probes with `SELECT 1`; used for every driver without a dedicated entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultValidator;

impl Validator for DefaultValidator {
    fn validate(&self, conn: &mut dyn Connection) -> bool {
        probe(conn, "SELECT 1", true).is_ok()
    }

    fn name(&self) -> &'static str {
        "default"
    }
}

/// Reads the tracked transaction status instead of issuing a query on release.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresValidator;

impl Validator for PostgresValidator {
    fn validate(&self, conn: &mut dyn Connection) -> bool {
        probe(conn, "SELECT 1", false).is_ok()
    }

    fn before_release(&self, conn: &mut dyn Connection) -> bool {
        if conn.is_closed() {
            return false;
        }
        match conn.transaction_status() {
            TransactionStatus::Unknown => false,
            TransactionStatus::Idle => true,
            _ => conn.rollback().is_ok(),
        }
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlValidator;

impl Validator for MysqlValidator {
    fn validate(&self, conn: &mut dyn Connection) -> bool {
        conn.ping().is_ok()
    }

    fn name(&self) -> &'static str {
        "mysql"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlValidator;

impl Validator for MssqlValidator {
    fn validate(&self, conn: &mut dyn Connection) -> bool {
        probe(conn, "SELECT 1 AS [1]", true).is_ok()
    }

    fn name(&self) -> &'static str {
        "mssql"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OracleValidator;

impl Validator for OracleValidator {
    fn validate(&self, conn: &mut dyn Connection) -> bool {
        probe(conn, "SELECT 1 FROM DUAL", true).is_ok()
    }

    fn name(&self) -> &'static str {
        "oracle"
    }
}

static GLOBAL_REGISTRY: Lazy<Arc<ValidatorRegistry>> =
    Lazy::new(|| Arc::new(ValidatorRegistry::with_builtins()));

/// Maps a driver tag to the validator used for its connections.
pub struct ValidatorRegistry {
    validators: DashMap<DriverType, Arc<dyn Validator>>,
    fallback: Arc<dyn Validator>,
}

impl ValidatorRegistry {
    /// An empty registry; every lookup yields the fallback.
    pub fn new() -> Self {
        ValidatorRegistry {
            validators: DashMap::new(),
            fallback: Arc::new(DefaultValidator),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(DriverType::Postgres, PostgresValidator);
        registry.register(DriverType::MySQL, MysqlValidator);
        registry.register(DriverType::Mssql, MssqlValidator);
        registry.register(DriverType::Oracle, OracleValidator);
        registry
    }

    /// The process-wide registry pools use unless configured otherwise.
    pub fn global() -> Arc<ValidatorRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Registers (or replaces) the validator for `driver`.
    pub fn register<V: Validator + 'static>(&self, driver: DriverType, validator: V) {
        self.register_arc(driver, Arc::new(validator));
    }

    pub fn register_arc(&self, driver: DriverType, validator: Arc<dyn Validator>) {
        self.validators.insert(driver, validator);
    }

    pub fn lookup(&self, driver: DriverType) -> Arc<dyn Validator> {
        self.validators
            .get(&driver)
            .map(|v| v.value().clone())
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn resolve(&self, conn: &dyn Connection) -> Arc<dyn Validator> {
        self.lookup(conn.driver_type())
    }

    pub fn contains(&self, driver: DriverType) -> bool {
        self.validators.contains_key(&driver)
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let drivers: Vec<DriverType> = self.validators.iter().map(|e| *e.key()).collect();
        f.debug_struct("ValidatorRegistry")
            .field("drivers", &drivers)
            .finish()
    }
}
