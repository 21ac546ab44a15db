use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_core::future::BoxFuture;

use crate::connection::Connection;
use crate::error::Error;
use crate::pool::Pool;
use crate::row::{ResultSet, Row};
use crate::value::Value;

/// Counts connects per pool so parallel tests do not interfere.
#[derive(Debug, Clone, Default)]
struct MockOptions {
    connects: Arc<AtomicUsize>,
}

/// An in-memory stand-in for a database connection.
#[derive(Debug)]
struct MockConnection {
    open: bool,
}

impl Connection for MockConnection {
    type Options = MockOptions;

    fn connect(options: &Self::Options) -> BoxFuture<'_, Result<Self, Error>> {
        Box::pin(async move {
            options.connects.fetch_add(1, Ordering::SeqCst);
            Ok(MockConnection { open: true })
        })
    }

    fn query<'e>(
        &'e mut self,
        _sql: &'e str,
        _binds: &'e [Value],
    ) -> BoxFuture<'e, Result<Vec<Row>, Error>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn execute<'e>(
        &'e mut self,
        _sql: &'e str,
        _binds: &'e [Value],
    ) -> BoxFuture<'e, Result<u64, Error>> {
        Box::pin(async { Ok(0) })
    }

    fn query_multi<'e>(
        &'e mut self,
        _sql: &'e str,
        _binds: &'e [Value],
    ) -> BoxFuture<'e, Result<Vec<ResultSet>, Error>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn begin(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async { Ok(()) })
    }

    fn commit(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async { Ok(()) })
    }

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async { Ok(()) })
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(self) -> BoxFuture<'static, Result<(), Error>> {
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test]
async fn active_count_never_exceeds_the_cap() {
    let pool: Pool<MockConnection> = Pool::new(MockOptions::default(), 4);
    let peak = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let pool = pool.clone();
        let peak = Arc::clone(&peak);

        tasks.push(tokio::spawn(async move {
            pool.with_connection(|_conn| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(())
                })
            })
            .await
            .unwrap();

            peak.fetch_max(pool.active_count(), Ordering::SeqCst);
            assert!(pool.active_count() <= 4);
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 4);
    assert_eq!(pool.active_count(), 0);
}

#[tokio::test]
async fn waiters_are_served_in_fifo_order() {
    let pool: Pool<MockConnection> = Pool::new(MockOptions::default(), 1);

    let held = pool.acquire().await.unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    for tag in ["first", "second"] {
        let task_pool = pool.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let conn = task_pool.acquire().await.unwrap();
            tx.send(tag).unwrap();
            conn.release().await;
        });

        // park this waiter before spawning the next
        while pool.waiter_count() < 1 {
            tokio::task::yield_now().await;
        }
        if tag == "first" {
            continue;
        }
    }

    while pool.waiter_count() < 2 {
        tokio::task::yield_now().await;
    }

    held.release().await;

    assert_eq!(rx.recv().await, Some("first"));
    assert_eq!(rx.recv().await, Some("second"));
}

#[tokio::test]
async fn idle_reuse_is_lifo_and_bounded() {
    let options = MockOptions::default();
    let connects = Arc::clone(&options.connects);
    let pool: Pool<MockConnection> = Pool::new(options, 2);

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    a.release().await;
    b.release().await;

    assert_eq!(pool.idle_count(), 2);

    // both checkouts are served from the idle stack, no new connects
    let c = pool.acquire().await.unwrap();
    let d = pool.acquire().await.unwrap();
    c.release().await;
    d.release().await;

    assert_eq!(connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn close_all_fails_parked_waiters() {
    let pool: Pool<MockConnection> = Pool::new(MockOptions::default(), 1);

    let held = pool.acquire().await.unwrap();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
    };

    while pool.waiter_count() < 1 {
        tokio::task::yield_now().await;
    }

    pool.close_all().await;

    assert!(matches!(
        waiter.await.unwrap(),
        Err(Error::ConnectionClosed)
    ));
    assert!(matches!(
        pool.acquire().await.map(|_| ()),
        Err(Error::ConnectionClosed)
    ));

    held.release().await;
}

#[tokio::test]
async fn with_connection_releases_on_error() {
    let pool: Pool<MockConnection> = Pool::new(MockOptions::default(), 1);

    let result: Result<(), Error> = pool
        .with_connection(|_conn| {
            Box::pin(async move { Err(Error::Protocol("boom".into())) })
        })
        .await;

    assert!(result.is_err());
    assert_eq!(pool.active_count(), 0);
    assert_eq!(pool.idle_count(), 1);

    // the pool still serves connections afterwards
    let conn = pool.acquire().await.unwrap();
    conn.release().await;
}

#[tokio::test]
async fn dead_idle_connections_are_evicted_on_acquire() {
    let pool: Pool<MockConnection> = Pool::new(MockOptions::default(), 2);

    let mut conn = pool.acquire().await.unwrap();
    conn.open = false;
    conn.release().await;

    // a broken connection is not pushed back to idle
    assert_eq!(pool.idle_count(), 0);

    let conn = pool.acquire().await.unwrap();
    assert!(conn.is_open());
    conn.release().await;
}

#[tokio::test]
async fn warm_up_preopens_min_idle() {
    let pool: Pool<MockConnection> = Pool::new(MockOptions::default(), 4);

    pool.warm_up(3, Duration::from_secs(3600)).await.unwrap();

    assert_eq!(pool.idle_count(), 3);

    pool.close_all().await;
}
