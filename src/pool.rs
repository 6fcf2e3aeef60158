use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::command::Command;
use crate::config::{Config, ConnectionInfo};
use crate::connection::Connection;
use crate::frame::Frame;
use crate::{Error, Result};

struct IdleConnection {
    conn: Connection,
    since: Instant,
}

struct PoolInner {
    config: Config,
    info: ConnectionInfo,
    // One permit per channel that may be open at once, idle or leased.
    permits: Arc<Semaphore>,
    idle: Mutex<VecDeque<IdleConnection>>,
    waiting: AtomicUsize,
    acquired: AtomicU64,
    released: AtomicU64,
    closed: AtomicBool,
}

impl PoolInner {
    fn idle(&self) -> MutexGuard<'_, VecDeque<IdleConnection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reap_idle(&self, max_idle: Duration) -> usize {
        let mut idle = self.idle();
        let before = idle.len();
        idle.retain(|entry| entry.since.elapsed() < max_idle);
        before - idle.len()
    }
}

/// Counters describing the pool at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Leases handed out since the pool was created.
    pub acquired: u64,
    /// Leases given back since the pool was created.
    pub released: u64,
    /// Leases currently outstanding.
    pub leased: usize,
    pub idle: usize,
    /// Callers queued for a channel.
    pub waiting: usize,
}

/// A bounded set of reusable channels to one store.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Builds the pool. No channel is opened until the first acquire.
    pub fn new(config: Config) -> Result<Pool> {
        let info = config.connection_info()?;
        let inner = PoolInner {
            permits: Arc::new(Semaphore::new(config.max_pool_size)),
            idle: Mutex::new(VecDeque::with_capacity(config.max_pool_size)),
            waiting: AtomicUsize::new(0),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            info,
            config,
        };

        Ok(Pool {
            inner: Arc::new(inner),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Spawns the background sweep closing channels that sat idle for a whole interval.
    ///
    /// The task holds a weak reference and stops once the pool is dropped or closed.
    pub fn spawn_cleaner(&self) {
        let period = self.inner.config.cleaner_interval();
        if period.is_zero() {
            return;
        }

        let pool: Weak<PoolInner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(pool) = pool.upgrade() else { break };
                if pool.closed.load(Ordering::Acquire) {
                    break;
                }

                let reaped = pool.reap_idle(period);
                if reaped > 0 {
                    debug!(reaped, "closed idle connections");
                }
            }
        });
    }

    /// Leases one channel, reusing an idle one when available.
    ///
    /// When every channel is leased the caller waits for a release, unless `max_pool_waiting`
    /// callers are already waiting, in which case it fails right away.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        if self.is_closed() {
            return Err(closed());
        }

        let permit = match self.inner.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(closed()),
            Err(TryAcquireError::NoPermits) => self.wait_for_permit().await?,
        };

        let conn = match self.pop_idle() {
            Some(conn) => conn,
            None => Connection::connect(&self.inner.info, self.inner.config.max_frame_size)
                .await
                .map_err(|err| match err {
                    Error::ConnectionUnavailable(_) => err,
                    err => Error::ConnectionUnavailable(err.to_string()),
                })?,
        };

        self.inner.acquired.fetch_add(1, Ordering::AcqRel);
        debug!(connection_id = %conn.id, "leased connection");

        Ok(PooledConnection {
            pool: self.inner.clone(),
            conn: Some(conn),
            valid: true,
            in_flight: false,
            _permit: permit,
        })
    }

    async fn wait_for_permit(&self) -> Result<OwnedSemaphorePermit> {
        let waiting = self.inner.waiting.fetch_add(1, Ordering::AcqRel);
        let _waiting = WaitingGuard(&self.inner.waiting);

        if waiting >= self.inner.config.max_pool_waiting {
            return Err(Error::ConnectionUnavailable(format!(
                "pool exhausted; {} callers already waiting",
                waiting
            )));
        }

        self.inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| closed())
    }

    fn pop_idle(&self) -> Option<Connection> {
        self.inner.idle().pop_front().map(|entry| entry.conn)
    }

    pub fn status(&self) -> PoolStatus {
        let available = self.inner.permits.available_permits();
        PoolStatus {
            acquired: self.inner.acquired.load(Ordering::Acquire),
            released: self.inner.released.load(Ordering::Acquire),
            leased: self.inner.config.max_pool_size.saturating_sub(available),
            idle: self.inner.idle().len(),
            waiting: self.inner.waiting.load(Ordering::Acquire),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Closes idle channels and fails every later acquire. Outstanding leases close their
    /// channel when released.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.permits.close();
        self.inner.idle().clear();
    }
}

fn closed() -> Error {
    Error::ConnectionUnavailable("pool is closed".to_string())
}

struct WaitingGuard<'a>(&'a AtomicUsize);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Exclusive hold on one pooled channel, given back when dropped.
///
/// The channel returns to the idle set only if it is still in sync with the store: it saw no
/// transport failure and no exchange was abandoned halfway. Otherwise it is closed.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
    valid: bool,
    in_flight: bool,
    // Dropped after `drop` runs, so the channel is idle again before a waiter wakes up.
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    pub fn id(&self) -> Option<Uuid> {
        self.conn.as_ref().map(|conn| conn.id)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Marks the channel as unusable. It is closed instead of reused on release.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Sends one command and waits for its reply.
    pub async fn round_trip(&mut self, command: &Command) -> Result<Frame> {
        if !self.valid {
            return Err(Error::ConnectionClosed);
        }
        let conn = self.conn.as_mut().ok_or(Error::ConnectionClosed)?;

        self.in_flight = true;
        let result = conn.round_trip(command).await;
        self.in_flight = false;

        if let Err(err) = &result {
            if err.breaks_connection() {
                self.valid = false;
            }
        }

        result
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        self.pool.released.fetch_add(1, Ordering::AcqRel);

        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => return,
        };

        if self.in_flight {
            warn!(connection_id = %conn.id, "lease dropped mid-exchange; closing connection");
            return;
        }

        if self.valid && !self.pool.closed.load(Ordering::Acquire) {
            debug!(connection_id = %conn.id, "released connection");
            self.pool.idle().push_back(IdleConnection {
                conn,
                since: Instant::now(),
            });
        } else {
            debug!(connection_id = %conn.id, "closing connection");
        }
    }
}
