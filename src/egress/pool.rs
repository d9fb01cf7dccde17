//! Proxy pool with rotation and blacklisting.
//!
//! # Responsibilities
//! - Pick the egress proxy for the next upstream attempt
//! - Remember proxies that misbehaved and skip them
//!
//! # Design Decisions
//! - The blacklist only grows until every proxy is on it; then it is wiped
//!   so the pool never ends up empty (self-healing)
//! - Rotation uses a shared atomic cursor, the same way round-robin
//!   balancing does; without rotation a random live proxy is picked

use dashmap::DashSet;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::egress::entry::ProxyEntry;

/// Set of egress proxies.
#[derive(Debug, Default)]
pub struct ProxyManager {
    entries: Vec<ProxyEntry>,
    blacklist: DashSet<String>,
    cursor: AtomicUsize,
    rotation: bool,
}

impl ProxyManager {
    /// Build a pool from configured addresses. Unparseable entries are skipped.
    pub fn new<S: AsRef<str>>(proxies: &[S], rotation: bool) -> Self {
        let entries = proxies
            .iter()
            .filter_map(|raw| match ProxyEntry::parse(raw.as_ref()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalid proxy");
                    None
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(count = entries.len(), rotation, "Proxy pool initialized");

        Self {
            entries,
            blacklist: DashSet::new(),
            cursor: AtomicUsize::new(0),
            rotation,
        }
    }

    /// Next proxy URL to use, or `None` when the pool is empty.
    pub fn select(&self) -> Option<String> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }

        if self.entries.iter().all(|e| self.blacklist.contains(&e.address)) {
            tracing::warn!(count = len, "All proxies blacklisted, resetting blacklist");
            self.blacklist.clear();
        }

        if self.rotation {
            // The cursor moves past every entry inspected, skipped ones included
            let mut picked = None;
            let advanced = self
                .cursor
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |start| {
                    picked = (0..len)
                        .map(|i| (start + i) % len)
                        .find(|&idx| !self.blacklist.contains(&self.entries[idx].address));
                    picked.map(|idx| (idx + 1) % len)
                });
            if let (Ok(_), Some(idx)) = (advanced, picked) {
                return Some(self.entries[idx].address.clone());
            }
        }

        // Random pick, also the fallback if a concurrent mark emptied the rotation
        let live: Vec<&ProxyEntry> = self
            .entries
            .iter()
            .filter(|e| !self.blacklist.contains(&e.address))
            .collect();
        live.choose(&mut rand::thread_rng())
            .copied()
            .or_else(|| self.entries.choose(&mut rand::thread_rng()))
            .map(|e| e.address.clone())
    }

    /// Blacklist a proxy. Idempotent; unknown addresses are still recorded.
    pub fn mark_failed(&self, address: &str) {
        if self.blacklist.insert(address.to_string()) {
            let shown = ProxyEntry { address: address.to_string() };
            tracing::warn!(proxy = %shown, "Proxy blacklisted");
        }
    }

    /// Whether `address` is currently blacklisted.
    pub fn is_blacklisted(&self, address: &str) -> bool {
        self.blacklist.contains(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Proxies not currently blacklisted.
    pub fn available(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !self.blacklist.contains(&e.address))
            .count()
    }
}
