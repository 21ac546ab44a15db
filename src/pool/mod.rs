//! A bounded pool of database connections.
//!
//! `idle + active` never exceeds `max_connections`. Acquire waiters are
//! served in FIFO order; idle reuse is LIFO (hot-last) to maximize
//! connection recency. An optional warm-up keeps `min_idle` connections
//! open and pings them on an interval, evicting the ones that fail.

mod connection;
mod inner;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use futures_core::future::BoxFuture;

use crate::connection::Connection;
use crate::error::Error;

pub use connection::PooledConnection;
use inner::PoolInner;

pub struct Pool<C: Connection>(pub(crate) Arc<PoolInner<C>>);

impl<C: Connection> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Pool(Arc::clone(&self.0))
    }
}

impl<C: Connection> Pool<C> {
    pub fn new(options: C::Options, max_connections: usize) -> Self {
        Pool(PoolInner::new(options, max_connections))
    }

    /// Takes a connection out of the pool, opening a new one if under
    /// capacity, or parking until one is released.
    pub async fn acquire(&self) -> Result<PooledConnection<C>, Error> {
        self.0.acquire().await
    }

    /// Returns a connection to the pool. Equivalent to dropping the guard,
    /// but deterministic.
    pub async fn release(&self, conn: PooledConnection<C>) {
        conn.release().await
    }

    /// Acquires a connection, runs `work` with it, and releases it on both
    /// the normal and the error exit.
    pub async fn with_connection<F, R>(&self, work: F) -> Result<R, Error>
    where
        F: for<'c> FnOnce(&'c mut C) -> BoxFuture<'c, Result<R, Error>>,
    {
        let mut conn = self.acquire().await?;
        let result = work(&mut conn).await;
        conn.release().await;

        result
    }

    /// Pre-opens up to `min_idle` connections and starts a periodic
    /// keep-alive task that pings each idle connection, closing the ones
    /// that fail and reopening up to `min_idle`.
    pub async fn warm_up(&self, min_idle: usize, ping_interval: Duration) -> Result<(), Error> {
        self.0.warm_up(min_idle, ping_interval).await
    }

    /// Closes the pool: pending waiters fail with `connection_closed`, idle
    /// connections are closed, and the keep-alive task is cancelled.
    pub async fn close_all(&self) {
        self.0.close_all().await
    }

    pub fn idle_count(&self) -> usize {
        self.0.idle_count()
    }

    pub fn active_count(&self) -> usize {
        self.0.active_count()
    }

    pub fn waiter_count(&self) -> usize {
        self.0.waiter_count()
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}
