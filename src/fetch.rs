//! Outbound HTTP through a single forward proxy.

use crate::error::{RelayError, Result};

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Outbound GET requests for `target` through the proxy at `proxy`.
///
/// Any completed HTTP response counts as success, whatever its status code.
#[async_trait]
pub trait ProxyFetcher: Send + Sync {
    /// Fetch the whole response body.
    async fn fetch(&self, target: &str, proxy: &str, timeout: Duration) -> Result<Bytes>;

    /// Complete once the response headers arrive; the body is dropped unread.
    async fn probe(&self, target: &str, proxy: &str, timeout: Duration) -> Result<()>;
}

/// `ProxyFetcher` backed by a reqwest client built per call.
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher;

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self
    }

    async fn send(&self, target: &str, proxy: &str, timeout: Duration) -> Result<reqwest::Response> {
        let reqwest_proxy =
            reqwest::Proxy::all(proxy).map_err(|e| RelayError::request_failed(proxy, e))?;

        let client = reqwest::Client::builder()
            .proxy(reqwest_proxy)
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::request_failed(proxy, e))?;

        client
            .get(target)
            .send()
            .await
            .map_err(|e| RelayError::request_failed(proxy, e))
    }
}

#[async_trait]
impl ProxyFetcher for ReqwestFetcher {
    async fn fetch(&self, target: &str, proxy: &str, timeout: Duration) -> Result<Bytes> {
        self.send(target, proxy, timeout)
            .await?
            .bytes()
            .await
            .map_err(|e| RelayError::request_failed(proxy, e))
    }

    async fn probe(&self, target: &str, proxy: &str, timeout: Duration) -> Result<()> {
        self.send(target, proxy, timeout).await.map(drop)
    }
}


#[cfg(test)]
pub(crate) mod scripted {
    //! Deterministic `ProxyFetcher` for pool and server tests.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Copy)]
    pub(crate) enum Outcome {
        /// Succeed after the given number of milliseconds.
        Respond(u64),
        Fail,
        /// Never complete.
        Hang,
        /// Headers at once, body after the given number of milliseconds.
        SlowBody(u64),
    }

    pub(crate) struct ScriptedFetcher {
        outcomes: Mutex<HashMap<String, Outcome>>,
        body: Bytes,
        pub requests: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedFetcher {
        pub fn new(outcomes: &[(&str, Outcome)]) -> Self {
            Self {
                outcomes: Mutex::new(
                    outcomes
                        .iter()
                        .map(|(address, outcome)| (address.to_string(), *outcome))
                        .collect(),
                ),
                body: Bytes::from_static(b"<html>results</html>"),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn set(&self, address: &str, outcome: Outcome) {
            self.outcomes.lock().insert(address.to_string(), outcome);
        }
    }

    impl ScriptedFetcher {
        fn record(&self, target: &str, proxy: &str) -> Outcome {
            self.requests
                .lock()
                .push((target.to_string(), proxy.to_string()));
            self.outcomes
                .lock()
                .get(proxy)
                .copied()
                .unwrap_or(Outcome::Fail)
        }
    }

    #[async_trait]
    impl ProxyFetcher for ScriptedFetcher {
        async fn fetch(&self, target: &str, proxy: &str, _timeout: Duration) -> Result<Bytes> {
            match self.record(target, proxy) {
                Outcome::Respond(0) => Ok(self.body.clone()),
                Outcome::Respond(ms) | Outcome::SlowBody(ms) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(self.body.clone())
                }
                Outcome::Fail => Err(RelayError::request_failed(proxy, "connection refused")),
                Outcome::Hang => std::future::pending().await,
            }
        }

        async fn probe(&self, target: &str, proxy: &str, _timeout: Duration) -> Result<()> {
            match self.record(target, proxy) {
                Outcome::Respond(0) | Outcome::SlowBody(_) => Ok(()),
                Outcome::Respond(ms) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(())
                }
                Outcome::Fail => Err(RelayError::request_failed(proxy, "connection refused")),
                Outcome::Hang => std::future::pending().await,
            }
        }
    }
}
