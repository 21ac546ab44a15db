use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::connection::Connection;
use crate::pool::inner::PoolInner;

/// A connection checked out of a [`Pool`][crate::pool::Pool].
///
/// The connection is externally owned until it goes back: dropping the
/// guard returns it asynchronously; [`PooledConnection::release`] returns it
/// deterministically.
pub struct PooledConnection<C: Connection> {
    conn: Option<C>,
    pool: Arc<PoolInner<C>>,
}

impl<C: Connection> PooledConnection<C> {
    pub(crate) fn new(conn: C, pool: &Arc<PoolInner<C>>) -> Self {
        Self {
            conn: Some(conn),
            pool: Arc::clone(pool),
        }
    }

    pub async fn release(mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn).await;
        }
    }

    /// Detaches the connection from the pool; the pool's slot is freed and
    /// the connection becomes caller-owned.
    pub fn detach(mut self) -> C {
        let conn = self.conn.take().expect("connection already released");
        self.pool.release_detached_slot();
        conn
    }
}

impl<C: Connection> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection already released")
    }
}

impl<C: Connection> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection already released")
    }
}

impl<C: Connection> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release_detached(conn);
        }
    }
}
