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


use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::validator::{Validator, ValidatorRegistry};

/// How a pool validates the connections it hands out.
#[derive(Clone, Debug)]
pub enum Validation {
    /// Pick a validator from the registry the first time a connection is seen.
    Auto,
    Custom(Arc<dyn Validator>),
    /// Trust every connection as-is; no retries, always reuse on release.
    Disabled,
}

impl Default for Validation {
    fn default() -> Self {
        Validation::Auto
    }
}

impl Validation {
    pub fn is_disabled(&self) -> bool {
        matches!(self, Validation::Disabled)
    }
}

static AUTO: Validation = Validation::Auto;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    limit: usize,
    timeout: Duration,
    // `None` until a setter picks a mode; reads as `Auto`.
    #[serde(skip)]
    validation: Option<Validation>,
    #[serde(skip, default = "ValidatorRegistry::global")]
    registry: Arc<ValidatorRegistry>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            limit: 0,
            timeout: Duration::from_secs(5),
            validation: None,
            registry: ValidatorRegistry::global(),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of live connections, `0` for unbounded.
    pub fn set_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// How long `acquire` waits for a release once the limit is reached.
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn set_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validation = Some(Validation::Custom(Arc::new(validator)));
        self
    }

    pub fn disable_validation(mut self) -> Self {
        self.validation = Some(Validation::Disabled);
        self
    }

    pub fn validation(&self) -> &Validation {
        self.validation.as_ref().unwrap_or(&AUTO)
    }

    /// Whether a validation mode was chosen explicitly, `Auto` included.
    pub fn is_validation_set(&self) -> bool {
        self.validation.is_some()
    }

    /// Registry consulted by [`Validation::Auto`].
    pub fn set_registry(mut self, registry: Arc<ValidatorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    pub fn max_validation_retries(&self) -> usize {
        self.limit + 3
    }
}
