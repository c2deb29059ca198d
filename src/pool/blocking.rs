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


use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::config::{PoolConfig, Validation};
use crate::driver::{BoxConnection, Connection};
use crate::errors::{PoolError, Result};
use crate::pool::{ConnectionFactory, ConnectionPool, PoolStatus};
use crate::validator::{Validator, ValidatorRegistry};

/// Growth accounting, only touched under `BlockingPool::state`.
#[derive(Debug, Default)]
struct Counters {
    connections_created: usize,
    reached_limit: bool,
}

/// The validator a pool applies, bound lazily in `Auto` mode.
struct ValidatorSlot {
    mode: Validation,
    registry: Arc<ValidatorRegistry>,
    bound: OnceCell<Arc<dyn Validator>>,
}

impl ValidatorSlot {
    fn new(mode: Validation, registry: Arc<ValidatorRegistry>) -> Self {
        ValidatorSlot {
            mode,
            registry,
            bound: OnceCell::new(),
        }
    }

    fn is_disabled(&self) -> bool {
        self.mode.is_disabled()
    }

    /// The validator for an acquisition. The first connection seen in `Auto`
    /// mode decides the validator for the lifetime of the pool.
    fn for_acquire(&self, conn: &dyn Connection) -> Option<Arc<dyn Validator>> {
        match &self.mode {
            Validation::Disabled => None,
            Validation::Custom(v) => Some(v.clone()),
            Validation::Auto => Some(
                self.bound
                    .get_or_init(|| {
                        let validator = self.registry.resolve(conn);
                        tracing::debug!(
                            driver = ?conn.driver_type(),
                            validator = validator.name(),
                            "bound connection validator"
                        );
                        validator
                    })
                    .clone(),
            ),
        }
    }

    /// The validator for a release; nothing before `Auto` mode has bound one.
    fn for_release(&self) -> Option<Arc<dyn Validator>> {
        match &self.mode {
            Validation::Disabled => None,
            Validation::Custom(v) => Some(v.clone()),
            Validation::Auto => self.bound.get().cloned(),
        }
    }

    fn current(&self) -> Option<Arc<dyn Validator>> {
        self.for_release()
    }
}

/// A queue-backed pool that grows on demand up to `limit` connections.
///
/// While below the limit an empty idle set means a new connection is created
/// instead of waiting. Once the limit is reached, `acquire` blocks for up to
/// `timeout` on the idle set. The idle set is a crossbeam channel: idle
/// connections come back out in FIFO order, but blocked waiters are woken in
/// no particular order.
pub struct BlockingPool {
    factory: ConnectionFactory,
    limit: usize,
    timeout: Duration,
    max_validation_retries: usize,
    validators: ValidatorSlot,
    idle_tx: Sender<BoxConnection>,
    idle_rx: Receiver<BoxConnection>,
    state: Mutex<Counters>,
    // Mirror of `Counters::reached_limit`, written under `state`.
    reached_limit: AtomicBool,
}

impl BlockingPool {
    pub fn new<F>(factory: F, cfg: PoolConfig) -> Self
    where
        F: Fn() -> Result<BoxConnection> + Send + Sync + 'static,
    {
        let (idle_tx, idle_rx) = unbounded();
        BlockingPool {
            factory: Box::new(factory),
            limit: cfg.limit(),
            timeout: cfg.timeout(),
            max_validation_retries: cfg.max_validation_retries(),
            validators: ValidatorSlot::new(cfg.validation().clone(), cfg.registry().clone()),
            idle_tx,
            idle_rx,
            state: Mutex::new(Counters::default()),
            reached_limit: AtomicBool::new(false),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_validation_retries(&self) -> usize {
        self.max_validation_retries
    }

    /// Live connections attributed to this pool, idle or checked out.
    ///
    /// Discarding a connection lowers the count for unbounded pools too, so it
    /// always reads as live connections; `reached_limit` stays false there.
    pub fn connections_created(&self) -> usize {
        self.state.lock().connections_created
    }

    pub fn reached_limit(&self) -> bool {
        self.reached_limit.load(Ordering::Acquire)
    }

    pub fn idle_connections(&self) -> usize {
        self.idle_rx.len()
    }

    /// The validator currently in use, if one is configured or already bound.
    pub fn validator(&self) -> Option<Arc<dyn Validator>> {
        self.validators.current()
    }

    /// Dequeue an idle connection or create one, without validation.
    fn raw_acquire(&self) -> Result<BoxConnection> {
        if !self.reached_limit() {
            if let Ok(conn) = self.idle_rx.try_recv() {
                tracing::trace!("reusing idle connection");
                return Ok(conn);
            }
            if let Some(conn) = self.try_create()? {
                return Ok(conn);
            }
            // Another thread took the last slot; wait like everyone else.
        }

        match self.idle_rx.recv_timeout(self.timeout) {
            Ok(conn) => {
                tracing::trace!("received released connection");
                Ok(conn)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                match self.try_create()? {
                    Some(conn) => Ok(conn),
                    None => {
                        tracing::warn!(
                            limit = self.limit,
                            timeout = ?self.timeout,
                            "connection pool exhausted"
                        );
                        Err(PoolError::Exhausted {
                            limit: self.limit,
                            timeout: self.timeout,
                        })
                    }
                }
            }
        }
    }

    /// Creates a connection unless the limit has been reached. Check and
    /// increment happen under one lock so the limit is never overshot.
    fn try_create(&self) -> Result<Option<BoxConnection>> {
        let mut state = self.state.lock();
        if state.reached_limit {
            return Ok(None);
        }
        let conn = (self.factory)()?;
        state.connections_created += 1;
        self.update_reached(&mut state);
        tracing::debug!(
            connections_created = state.connections_created,
            limit = self.limit,
            "created new connection"
        );
        Ok(Some(conn))
    }

    fn update_reached(&self, state: &mut Counters) {
        state.reached_limit = self.limit > 0 && state.connections_created >= self.limit;
        self.reached_limit.store(state.reached_limit, Ordering::Release);
    }

    /// Closes a connection and stops counting it.
    fn discard(&self, mut conn: BoxConnection) {
        if let Err(e) = conn.close() {
            tracing::warn!(error = %e, "failed to close discarded connection");
        }
        let mut state = self.state.lock();
        state.connections_created = state.connections_created.saturating_sub(1);
        self.update_reached(&mut state);
        tracing::debug!(
            connections_created = state.connections_created,
            "discarded connection"
        );
    }
}

impl ConnectionPool for BlockingPool {
    fn acquire(&self) -> Result<BoxConnection> {
        if self.validators.is_disabled() {
            return self.raw_acquire();
        }
        for attempt in 1..=self.max_validation_retries {
            let mut conn = self.raw_acquire()?;
            let valid = match self.validators.for_acquire(&*conn) {
                Some(validator) => validator.validate(&mut *conn),
                None => true,
            };
            if valid {
                return Ok(conn);
            }
            tracing::warn!(
                attempt,
                max = self.max_validation_retries,
                "connection failed validation"
            );
            self.discard(conn);
        }
        Err(PoolError::ValidationExhausted {
            attempts: self.max_validation_retries,
        })
    }

    fn release(&self, mut conn: BoxConnection) {
        let reuse = match self.validators.for_release() {
            Some(validator) => validator.before_release(&mut *conn),
            None => true,
        };
        if !reuse {
            self.discard(conn);
            return;
        }
        if let Err(e) = self.idle_tx.send(conn) {
            self.discard(e.into_inner());
        }
    }

    fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.connections_created(),
            available: self.idle_connections(),
        }
    }
}

impl Drop for BlockingPool {
    fn drop(&mut self) {
        while let Ok(mut conn) = self.idle_rx.try_recv() {
            if let Err(e) = conn.close() {
                tracing::warn!(error = %e, "failed to close idle connection");
            }
        }
    }
}

impl fmt::Debug for BlockingPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingPool")
            .field("limit", &self.limit)
            .field("timeout", &self.timeout)
            .field("connections_created", &self.connections_created())
            .field("reached_limit", &self.reached_limit())
            .field("idle", &self.idle_connections())
            .finish()
    }
}
