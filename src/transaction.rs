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


use crate::driver::{Connection, Cursor};
use crate::errors::{PoolError, Result};

/// Commit/rollback scope over a connection that is already checked out.
///
/// Neither `commit` nor `rollback` called before drop means rollback.
pub struct Transaction<'c> {
    conn: &'c mut dyn Connection,
    finished: bool,
}

impl<'c> Transaction<'c> {
    pub fn begin(conn: &'c mut dyn Connection) -> Self {
        Transaction {
            conn,
            finished: false,
        }
    }

    pub fn connection(&mut self) -> &mut dyn Connection {
        &mut *self.conn
    }

    pub fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        self.conn.cursor()
    }

    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.conn.commit()
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn.rollback()
    }
}

impl Drop for Transaction<'_> {
    /// Will rollback transaction.
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.rollback() {
                tracing::error!(error = %e, "rollback on drop failed");
            }
        }
    }
}

/// Runs `f` in a transaction: commits when it returns `Ok`, rolls back and
/// hands the error on when it returns `Err`. A failing rollback is logged;
/// the caller still sees the original error.
pub fn transaction<F, T, E>(conn: &mut dyn Connection, f: F) -> std::result::Result<T, E>
where
    F: FnOnce(&mut dyn Connection) -> std::result::Result<T, E>,
    E: From<PoolError>,
{
    let mut tx = Transaction::begin(conn);
    match f(tx.connection()) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = tx.rollback() {
                tracing::error!(error = %e, "rollback after failed transaction body failed");
            }
            Err(err)
        }
    }
}
