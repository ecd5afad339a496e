//! Bounded pool of reusable headless Chromium workers.
//!
//! Workers are long-lived browser processes; callers hold one at a time
//! through a [`Lease`] and open short-lived isolated [`BrowserSession`]s on
//! it. Leases and sessions release on drop, so a worker returns to the free
//! set on every exit path, including panic and cancellation.

mod error;
mod session;

pub use error::{PoolError, Result};
pub use session::BrowserSession;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use brandscope_core::AppMetrics;

/// Fixed window size for every worker.
const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 720;

/// User agent presented by every session.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

struct Worker {
    id: usize,
    browser: Browser,
    events: JoinHandle<()>,
}

impl Worker {
    async fn launch(id: usize) -> anyhow::Result<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .build()
            .map_err(|e| anyhow::anyhow!(e))?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // Drive the CDP event loop for this worker's lifetime.
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(worker = id, "Browser worker launched");
        Ok(Self { id, browser, events })
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(worker = self.id, error = %e, "Browser close failed");
        }
        self.events.abort();
    }
}

struct PoolInner {
    semaphore: Arc<Semaphore>,
    free: Mutex<Vec<Worker>>,
    total: usize,
    closed: AtomicBool,
    metrics: Arc<AppMetrics>,
}

impl PoolInner {
    fn publish_gauges(&self) {
        let available = self.free.lock().expect("pool mutex poisoned").len();
        let total = if self.closed.load(Ordering::Acquire) {
            0
        } else {
            self.total
        };
        let in_use = total.saturating_sub(available);
        self.metrics
            .set_pool_gauges(total as u64, in_use as u64, available as u64);
    }
}

/// Point-in-time pool accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub total: usize,
    pub in_use: usize,
    pub available: usize,
    pub initialized: bool,
}

/// Bounded set of reusable browser workers. Cheap to clone; all clones share
/// the same workers.
#[derive(Clone)]
pub struct BrowserPool {
    inner: Arc<PoolInner>,
}

impl BrowserPool {
    /// Launch `size` headless workers. If any launch fails, the workers
    /// already up are torn down and the whole init fails.
    pub async fn launch(size: usize, metrics: Arc<AppMetrics>) -> Result<Self> {
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            match Worker::launch(id).await {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    warn!(worker = id, error = %e, "Worker launch failed, tearing pool down");
                    for worker in workers {
                        worker.shutdown().await;
                    }
                    return Err(PoolError::Init(e.to_string()));
                }
            }
        }

        let inner = Arc::new(PoolInner {
            semaphore: Arc::new(Semaphore::new(size)),
            free: Mutex::new(workers),
            total: size,
            closed: AtomicBool::new(false),
            metrics,
        });
        inner.publish_gauges();
        info!(size, "Browser pool ready");
        Ok(Self { inner })
    }

    /// Wait up to `timeout` for a free worker. Waiters are served FIFO
    /// (tokio's semaphore is fair).
    pub async fn acquire(&self, timeout: Duration) -> Result<Lease> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }

        let permit = tokio::time::timeout(
            timeout,
            self.inner.semaphore.clone().acquire_owned(),
        )
        .await
        .map_err(|_| PoolError::AcquireTimeout)?
        .map_err(|_| PoolError::Closed)?;

        let worker = self
            .inner
            .free
            .lock()
            .expect("pool mutex poisoned")
            .pop()
            .expect("a free worker must exist while holding a permit");

        self.inner.publish_gauges();
        Ok(Lease {
            worker: Some(worker),
            _permit: permit,
            inner: self.inner.clone(),
        })
    }

    pub fn stats(&self) -> PoolStats {
        if self.inner.closed.load(Ordering::Acquire) {
            return PoolStats {
                total: 0,
                in_use: 0,
                available: 0,
                initialized: false,
            };
        }
        let available = self.inner.free.lock().expect("pool mutex poisoned").len();
        PoolStats {
            total: self.inner.total,
            in_use: self.inner.total - available,
            available,
            initialized: true,
        }
    }

    /// Tear every worker down. Idempotent. Acquires blocked at close time
    /// fail with [`PoolError::Closed`]; leases still out shut their worker
    /// down on release instead of returning it.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.semaphore.close();

        let workers = {
            let mut free = self.inner.free.lock().expect("pool mutex poisoned");
            std::mem::take(&mut *free)
        };
        for worker in workers {
            worker.shutdown().await;
        }
        self.inner.publish_gauges();
        info!("Browser pool closed");
    }
}

/// Exclusive claim on one pool worker. Dropping the lease returns the worker
/// to the free set (or shuts it down if the pool closed in the meantime).
pub struct Lease {
    worker: Option<Worker>,
    _permit: OwnedSemaphorePermit,
    inner: Arc<PoolInner>,
}

impl Lease {
    /// Open a fresh isolated session (its own page, fixed user agent and
    /// viewport) on the leased worker.
    pub async fn session(&self) -> Result<BrowserSession> {
        let worker = self.worker.as_ref().expect("lease holds a worker");
        BrowserSession::open(&worker.browser).await
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        if self.inner.closed.load(Ordering::Acquire) {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    worker.shutdown().await;
                });
            }
            return;
        }

        {
            let mut free = self.inner.free.lock().expect("pool mutex poisoned");
            free.push(worker);
            // A free set larger than the pool means a worker was returned
            // twice; accounting is corrupt and continuing would hand the same
            // browser to two callers.
            assert!(
                free.len() <= self.inner.total,
                "browser pool accounting violated: {} workers free of {}",
                free.len(),
                self.inner.total
            );
        }
        self.inner.publish_gauges();
    }
}
