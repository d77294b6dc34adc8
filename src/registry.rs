//! Ordered registry of upstream proxies and their probe state.

use crate::error::{RelayError, Result};
use crate::proxy::{ProbeState, ProxyRecord};
use crate::utils;

use log::info;
use parking_lot::RwLock;
use std::path::Path;

struct Entry {
    address: String,
    state: RwLock<ProbeState>,
}

/// Fixed set of proxies loaded once at startup.
///
/// Every record carries its own lock, so a reader never sees `alive` and
/// `last_latency_ms` from two different updates, and no lock spans more than
/// one record. Mutation is crate-private: only the pool writes state.
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// Build a registry from a newline-delimited list.
    ///
    /// Every proxy starts alive with a latency of 0.
    pub fn load(source: &str) -> Result<Self> {
        let entries: Vec<Entry> = utils::parse_proxy_list(source)
            .into_iter()
            .map(|address| Entry {
                address,
                state: RwLock::new(ProbeState::default()),
            })
            .collect();

        if entries.is_empty() {
            return Err(RelayError::Config("proxy list is empty".into()));
        }

        Ok(Self { entries })
    }

    /// Read the list from a file and build a registry from it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("cannot read proxy list {}: {}", path.display(), e))
        })?;
        let registry = Self::load(&content)?;
        info!("Loaded {} proxies from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Number of proxies; fixed for the lifetime of the registry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a loaded registry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every record in load order.
    pub fn all(&self) -> Vec<ProxyRecord> {
        self.entries
            .iter()
            .map(|e| ProxyRecord::from_state(&e.address, *e.state.read()))
            .collect()
    }

    /// Snapshot of the alive records, in load order. May be empty.
    pub fn alive_subset(&self) -> Vec<ProxyRecord> {
        self.entries
            .iter()
            .filter_map(|e| {
                let state = *e.state.read();
                state
                    .alive
                    .then(|| ProxyRecord::from_state(&e.address, state))
            })
            .collect()
    }

    /// Returns `(total, alive)`.
    pub fn stats(&self) -> (usize, usize) {
        let alive = self.entries.iter().filter(|e| e.state.read().alive).count();
        (self.entries.len(), alive)
    }

    /// Take a proxy out of rotation. Unknown addresses are ignored.
    ///
    /// The last latency is left as it was.
    pub(crate) fn mark_dead(&self, address: &str) -> bool {
        match self.find(address) {
            Some(entry) => {
                let mut state = entry.state.write();
                let was_alive = state.alive;
                state.alive = false;
                was_alive
            }
            None => false,
        }
    }

    /// Record a probe outcome. Returns the previous liveness, `None` when the
    /// address is unknown.
    pub(crate) fn update_probe(&self, address: &str, alive: bool, latency_ms: u64) -> Option<bool> {
        let entry = self.find(address)?;
        let mut state = entry.state.write();
        let previous = state.alive;
        *state = ProbeState {
            alive,
            last_latency_ms: latency_ms,
        };
        Some(previous)
    }

    fn find(&self, address: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.address == address)
    }
}
