//! Core proxy pool implementation.
//!
//! Selection is round-robin over the proxies alive *at call time*: the cursor
//! only ever grows and is reduced modulo the size of a freshly filtered alive
//! list. When liveness changes between two calls the effective rotation
//! shifts, so fairness is best-effort rather than a strict global ring.

use crate::config::PoolConfig;
use crate::error::{RelayError, Result};
use crate::fetch::{ProxyFetcher, ReqwestFetcher};
use crate::proxy::ProxyRecord;
use crate::registry::Registry;

use bytes::Bytes;
use futures::future;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use url::Url;

/// Outcome counts of one health sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub alive: usize,
    pub dead: usize,
}

/// A pool of forward proxies used to relay search requests.
pub struct ProxyPool {
    /// All proxies in the pool.
    registry: Arc<Registry>,
    /// Configuration for the pool.
    pub config: PoolConfig,
    /// Outbound HTTP through a chosen proxy.
    fetcher: Arc<dyn ProxyFetcher>,
    /// Used for round-robin proxy selection.
    cursor: AtomicUsize,
}

impl ProxyPool {
    /// Create a pool that talks to upstreams with reqwest.
    pub fn new(registry: Registry, config: PoolConfig) -> Arc<Self> {
        Self::with_fetcher(registry, config, Arc::new(ReqwestFetcher::new()))
    }

    /// Create a pool with a custom outbound fetcher.
    pub fn with_fetcher(
        registry: Registry,
        config: PoolConfig,
        fetcher: Arc<dyn ProxyFetcher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: Arc::new(registry),
            config,
            fetcher,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Shared handle to the underlying registry, for read-only display.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Get the next alive proxy in rotation.
    pub fn next_proxy(&self) -> Result<ProxyRecord> {
        let mut alive = self.registry.alive_subset();
        if alive.is_empty() {
            return Err(RelayError::NoAliveProxies);
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % alive.len();
        Ok(alive.swap_remove(index))
    }

    /// Report a failed request through a proxy. It leaves rotation until a
    /// later probe succeeds.
    pub fn report_failure(&self, address: &str) {
        if self.registry.mark_dead(address) {
            warn!("Proxy {} marked dead after a failed request", address);
        }
    }

    /// Probe every proxy, dead ones included, and record the results.
    ///
    /// Probes run concurrently and each result is written as soon as it lands,
    /// so a hanging proxy only holds up the sweep until its own timeout.
    pub async fn run_health_sweep(&self) -> SweepSummary {
        let proxies = self.registry.all();
        info!("Starting health sweep for {} proxies", proxies.len());

        let probes = proxies.iter().map(|proxy| async move {
            let address = proxy.address.as_str();
            let (alive, latency_ms) = match self.probe(address).await {
                Ok(latency_ms) => (true, latency_ms),
                Err(e) => {
                    debug!("Probe failed: {}", e);
                    (false, 0)
                }
            };

            if let Some(was_alive) = self.registry.update_probe(address, alive, latency_ms) {
                if was_alive != alive {
                    info!(
                        "Proxy {} status changed: {} -> {}",
                        address,
                        liveness(was_alive),
                        liveness(alive)
                    );
                }
            }
            alive
        });

        let results = future::join_all(probes).await;
        let alive = results.iter().filter(|&&ok| ok).count();
        let summary = SweepSummary {
            alive,
            dead: results.len() - alive,
        };

        info!(
            "Health sweep completed: {} alive, {} dead",
            summary.alive, summary.dead
        );
        summary
    }

    /// Request the probe URL through `address` and return the milliseconds
    /// until the response headers arrived.
    async fn probe(&self, address: &str) -> Result<u64> {
        let timeout = self.config.probe_timeout;
        let start = Instant::now();

        match time::timeout(
            timeout,
            self.fetcher.probe(&self.config.probe_url, address, timeout),
        )
        .await
        {
            Ok(Ok(_)) => Ok(start.elapsed().as_millis() as u64),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RelayError::ProbeTimeout {
                address: address.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Start the background sweep: once now, then every `sweep_interval`.
    pub fn spawn_health_task(self: &Arc<Self>) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval(pool.config.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                pool.run_health_sweep().await;

                let (total, alive) = pool.get_stats();
                info!("Proxy pool status update: {}/{} alive proxies", alive, total);
            }
        })
    }

    /// Relay a search query through the next alive proxy.
    ///
    /// A failure demotes that proxy and is returned as is; trying another
    /// proxy is left to the caller.
    pub async fn search(&self, query: &str) -> Result<Bytes> {
        let target = Url::parse_with_params(&self.config.search_url, &[("q", query)])
            .map_err(|e| RelayError::Config(format!("invalid search url: {}", e)))?;
        let proxy = self.next_proxy()?;
        let timeout = self.config.search_timeout;

        debug!("Relaying search via {}", proxy.address);

        let outcome = time::timeout(
            timeout,
            self.fetcher.fetch(target.as_str(), &proxy.address, timeout),
        )
        .await
        .unwrap_or_else(|_| {
            Err(RelayError::request_failed(
                &proxy.address,
                format!("timed out after {}ms", timeout.as_millis()),
            ))
        });

        match outcome {
            Ok(body) => Ok(body),
            Err(e) => {
                warn!("Proxy failed: {}: {}", proxy.address, e);
                self.report_failure(&proxy.address);
                Err(match e {
                    failed @ RelayError::ProxyRequestFailed { .. } => failed,
                    other => RelayError::request_failed(&proxy.address, other),
                })
            }
        }
    }

    /// Ordered `(address, alive, last_latency_ms)` listing for display.
    pub fn list_status(&self) -> Vec<ProxyRecord> {
        self.registry.all()
    }

    /// Get statistics about the proxy pool as `(total, alive)`.
    pub fn get_stats(&self) -> (usize, usize) {
        self.registry.stats()
    }
}

fn liveness(alive: bool) -> &'static str {
    if alive {
        "alive"
    } else {
        "dead"
    }
}
