use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::connection::Connection;
use crate::error::Error;
use crate::pool::PooledConnection;

pub(crate) struct PoolInner<C: Connection> {
    options: C::Options,
    max_connections: usize,
    state: Mutex<PoolState<C>>,
}

struct PoolState<C> {
    // LIFO: the most recently released connection is reused first
    idle: Vec<C>,
    active: usize,
    // FIFO: the waiter parked first wakes first
    waiters: VecDeque<oneshot::Sender<Result<C, Error>>>,
    closed: bool,
    min_idle: usize,
    keepalive: Option<JoinHandle<()>>,
}

enum AcquireDecision<C> {
    Err(Error),
    Ready(C),
    Connect,
    Wait(oneshot::Receiver<Result<C, Error>>),
}

// Kept as a plain (non-async) function so the `MutexGuard` borrowed here
// never has to be threaded through an `.await` point by the caller.
fn decide_acquire<C: Connection>(state: &mut PoolState<C>, max_connections: usize) -> AcquireDecision<C> {
    if state.closed {
        return AcquireDecision::Err(Error::ConnectionClosed);
    }

    // evict connections that died while idle
    while let Some(conn) = state.idle.pop() {
        if conn.is_open() {
            state.active += 1;
            return AcquireDecision::Ready(conn);
        }
    }

    if state.active + state.idle.len() < max_connections {
        state.active += 1;
        return AcquireDecision::Connect;
    }

    // at capacity; park until a release hands us a connection
    let (tx, rx) = oneshot::channel();
    state.waiters.push_back(tx);
    AcquireDecision::Wait(rx)
}

enum ReleaseAction<C> {
    Close(C),
    Reopen(oneshot::Sender<Result<C, Error>>),
    Done,
}

// Kept as a plain (non-async) function so the `MutexGuard` borrowed here
// never has to be threaded through an `.await` point by the caller.
fn decide_release<C: Connection>(state: &mut PoolState<C>, mut conn: C) -> ReleaseAction<C> {
    state.active = state.active.saturating_sub(1);

    if state.closed {
        return ReleaseAction::Close(conn);
    }

    while let Some(waiter) = state.waiters.pop_front() {
        // the released connection is dead; open a fresh one for the
        // waiter instead
        if !conn.is_open() {
            state.active += 1;
            return ReleaseAction::Reopen(waiter);
        }

        state.active += 1;
        match waiter.send(Ok(conn)) {
            Ok(()) => return ReleaseAction::Done,

            // the waiter gave up; take the connection back and try the
            // next one
            Err(Ok(back)) => {
                state.active -= 1;
                conn = back;
            }

            Err(Err(_)) => unreachable!(),
        }
    }

    if conn.is_open() {
        state.idle.push(conn);
        ReleaseAction::Done
    } else {
        ReleaseAction::Close(conn)
    }
}

impl<C: Connection> PoolInner<C> {
    pub(crate) fn new(options: C::Options, max_connections: usize) -> Arc<Self> {
        Arc::new(Self {
            options,
            max_connections,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                active: 0,
                waiters: VecDeque::new(),
                closed: false,
                min_idle: 0,
                keepalive: None,
            }),
        })
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.state.lock().unwrap().idle.len()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.state.lock().unwrap().active
    }

    pub(crate) fn waiter_count(&self) -> usize {
        self.state.lock().unwrap().waiters.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub(crate) async fn acquire(self: &Arc<Self>) -> Result<PooledConnection<C>, Error> {
        let decision = {
            let mut state = self.state.lock().unwrap();
            decide_acquire(&mut state, self.max_connections)
        };

        match decision {
            AcquireDecision::Err(err) => Err(err),

            AcquireDecision::Ready(conn) => Ok(PooledConnection::new(conn, self)),

            AcquireDecision::Connect => match C::connect(&self.options).await {
                Ok(conn) => Ok(PooledConnection::new(conn, self)),

                Err(err) => {
                    self.state.lock().unwrap().active -= 1;
                    Err(err)
                }
            },

            // at capacity; park until a release hands us a connection
            AcquireDecision::Wait(rx) => match rx.await {
                Ok(Ok(conn)) => Ok(PooledConnection::new(conn, self)),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(Error::ConnectionClosed),
            },
        }
    }

    pub(crate) async fn release(self: &Arc<Self>, conn: C) {
        let action = {
            let mut state = self.state.lock().unwrap();
            decide_release(&mut state, conn)
        };

        match action {
            ReleaseAction::Close(conn) => {
                let _ = conn.close().await;
            }
            ReleaseAction::Reopen(waiter) => {
                self.reopen_for(waiter).await;
            }
            ReleaseAction::Done => {}
        }
    }

    async fn reopen_for(self: &Arc<Self>, waiter: oneshot::Sender<Result<C, Error>>) {
        match C::connect(&self.options).await {
            Ok(fresh) => {
                if let Err(Ok(fresh)) = waiter.send(Ok(fresh)) {
                    // the waiter vanished between parking and the connect
                    Box::pin(self.release(fresh)).await;
                }
            }

            Err(err) => {
                self.state.lock().unwrap().active -= 1;
                let _ = waiter.send(Err(err));
            }
        }
    }

    /// Frees the slot without returning a connection; used by
    /// `PooledConnection::detach`.
    pub(crate) fn release_detached_slot(&self) {
        let mut state = self.state.lock().unwrap();
        state.active = state.active.saturating_sub(1);
    }

    /// Used by the guard's `Drop` when the caller never released
    /// explicitly and we cannot run async code.
    pub(crate) fn release_detached(self: &Arc<Self>, conn: C) {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let pool = Arc::clone(self);
            handle.spawn(async move { pool.release(conn).await });
        } else {
            // no runtime: account for the connection and let it drop
            self.state.lock().unwrap().active -= 1;
        }
    }

    pub(crate) async fn warm_up(
        self: &Arc<Self>,
        min_idle: usize,
        ping_interval: Duration,
    ) -> Result<(), Error> {
        {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                return Err(Error::ConnectionClosed);
            }
            state.min_idle = min_idle;
        }

        self.top_up().await?;

        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(keepalive(weak, ping_interval));

        let mut state = self.state.lock().unwrap();
        if let Some(old) = state.keepalive.replace(handle) {
            old.abort();
        }

        Ok(())
    }

    /// Opens connections until `idle + active` reaches `min_idle` (or the
    /// pool cap, whichever is lower).
    async fn top_up(self: &Arc<Self>) -> Result<(), Error> {
        loop {
            {
                let state = self.state.lock().unwrap();
                let open = state.idle.len() + state.active;
                if state.closed || open >= state.min_idle.min(self.max_connections) {
                    return Ok(());
                }
            }

            let conn = C::connect(&self.options).await?;

            let leftover = {
                let mut state = self.state.lock().unwrap();
                if state.closed {
                    Some(conn)
                } else {
                    state.idle.push(conn);
                    None
                }
            };

            if let Some(conn) = leftover {
                let _ = conn.close().await;
                return Ok(());
            }
        }
    }

    async fn ping_idle(self: &Arc<Self>) {
        let mut idle = {
            let mut state = self.state.lock().unwrap();
            std::mem::take(&mut state.idle)
        };

        let mut alive = Vec::with_capacity(idle.len());
        for mut conn in idle.drain(..) {
            match conn.ping().await {
                Ok(()) => alive.push(conn),
                Err(err) => {
                    log::info!("closing idle connection that failed keep-alive: {}", err);
                    let _ = conn.close().await;
                }
            }
        }

        let closed = {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                true
            } else {
                // serve any waiters that parked while the idle set was
                // checked out
                while let Some(conn) = alive.pop() {
                    match state.waiters.pop_front() {
                        Some(waiter) => {
                            state.active += 1;
                            if let Err(Ok(back)) = waiter.send(Ok(conn)) {
                                state.active -= 1;
                                alive.push(back);
                            }
                        }

                        None => {
                            alive.push(conn);
                            break;
                        }
                    }
                }

                state.idle.extend(alive.drain(..));
                false
            }
        };

        if closed {
            for conn in alive {
                let _ = conn.close().await;
            }
        }
    }

    pub(crate) async fn close_all(self: &Arc<Self>) {
        let (idle, waiters, keepalive) = {
            let mut state = self.state.lock().unwrap();
            state.closed = true;

            (
                std::mem::take(&mut state.idle),
                std::mem::take(&mut state.waiters),
                state.keepalive.take(),
            )
        };

        if let Some(handle) = keepalive {
            handle.abort();
        }

        for waiter in waiters {
            let _ = waiter.send(Err(Error::ConnectionClosed));
        }

        for conn in idle {
            let _ = conn.close().await;
        }
    }
}

async fn keepalive<C: Connection>(pool: Weak<PoolInner<C>>, ping_interval: Duration) {
    let mut interval = tokio::time::interval(ping_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // the first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        let pool = match pool.upgrade() {
            Some(pool) => pool,
            None => return,
        };

        if pool.is_closed() {
            return;
        }

        pool.ping_idle().await;
        let _ = pool.top_up().await;
    }
}
