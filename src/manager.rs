//! Cache Manager
//!
//! Cross-namespace coordination: turns domain events into the narrowest set
//! of key removals, and aggregates statistics over every namespace.
//!
//! # Event routing
//!
//! | Event | Removed |
//! |---|---|
//! | data of `kind` changed, whole history | every `{kind}:` key in the kind's namespace |
//! | data of `kind` changed on a date | [`keys::date_prefixes`] in the kind's namespace |
//! | data of `kind` changed in a month | [`keys::month_prefixes`] in the kind's namespace |
//! | a user's profile changed | [`keys::user_prefix`] in `user-profile` |
//! | everything | every key in every namespace |
//!
//! Every data event also empties `dashboard`: its entries are pre-aggregated
//! across kinds and cannot be patched selectively.
//!
//! Fan-out is sequential and not atomic across namespaces.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::cache::{efficiency_percent, CacheStats};
use crate::error::Result;
use crate::keys::{self, DataKind};
use crate::namespace::{Namespace, NamespaceRegistry};

// == Domain Events ==
/// Which dates of a data kind were touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateScope {
    /// Unknown or unbounded; drop everything of the kind
    All,
    Date(NaiveDate),
    Month { year: i32, month: u32 },
}

/// A change to domain data that cached results may depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    DataChanged { kind: DataKind, scope: DateScope },
    UserProfileChanged { user_id: String },
    Everything,
}

impl DomainEvent {
    pub fn on_date(kind: DataKind, date: NaiveDate) -> Self {
        DomainEvent::DataChanged {
            kind,
            scope: DateScope::Date(date),
        }
    }

    pub fn in_month(kind: DataKind, year: i32, month: u32) -> Self {
        DomainEvent::DataChanged {
            kind,
            scope: DateScope::Month { year, month },
        }
    }

    pub fn any_date(kind: DataKind) -> Self {
        DomainEvent::DataChanged {
            kind,
            scope: DateScope::All,
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        DomainEvent::UserProfileChanged {
            user_id: user_id.into(),
        }
    }
}

/// Entries removed per namespace by one invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub removed: BTreeMap<Namespace, usize>,
}

impl InvalidationReport {
    pub fn total(&self) -> usize {
        self.removed.values().sum()
    }

    fn add(&mut self, namespace: Namespace, count: usize) {
        *self.removed.entry(namespace).or_default() += count;
    }
}

/// Statistics summed over every namespace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub saved_requests: u64,
    pub evictions: u64,
    pub size: usize,
    /// Blended over all requests, not an average of per-namespace figures
    pub efficiency_percent: u8,
    pub namespaces: BTreeMap<Namespace, CacheStats>,
}

// == Cache Manager ==
/// Stateless coordinator over a [`NamespaceRegistry`].
#[derive(Debug, Clone)]
pub struct CacheManager {
    registry: Arc<NamespaceRegistry>,
}

impl CacheManager {
    pub fn new(registry: Arc<NamespaceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<NamespaceRegistry> {
        &self.registry
    }

    // == Invalidate ==
    /// Removes every cached entry `event` may have made stale.
    pub async fn invalidate(&self, event: &DomainEvent) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        match event {
            DomainEvent::DataChanged { kind, scope } => {
                let namespace = Namespace::for_kind(*kind);
                let prefixes = match scope {
                    DateScope::All => vec![keys::kind_prefix(*kind)],
                    DateScope::Date(date) => keys::date_prefixes(*kind, *date),
                    DateScope::Month { year, month } => keys::month_prefixes(*kind, *year, *month),
                };
                report.add(namespace, self.remove_prefixes(namespace, &prefixes).await);
                let dashboard = self
                    .remove_prefixes(Namespace::Dashboard, &[String::new()])
                    .await;
                report.add(Namespace::Dashboard, dashboard);
            }
            DomainEvent::UserProfileChanged { user_id } => {
                let removed = self
                    .remove_prefixes(Namespace::UserProfile, &[keys::user_prefix(user_id)])
                    .await;
                report.add(Namespace::UserProfile, removed);
            }
            DomainEvent::Everything => {
                for namespace in Namespace::ALL {
                    let removed = self.remove_prefixes(namespace, &[String::new()]).await;
                    report.add(namespace, removed);
                }
            }
        }

        info!(event = ?event, removed = report.total(), "Cache invalidated");
        report
    }

    // == Invalidate Namespace ==
    /// Clears one namespace, stats included. Returns the entries dropped.
    pub async fn invalidate_namespace(&self, namespace: Namespace) -> usize {
        let cache = self.registry.get(namespace);
        let mut store = cache.store().write().await;
        let removed = store.len();
        store.clear();
        info!(namespace = %namespace, removed, "Namespace cleared");
        removed
    }

    /// Removes keys matching an ad-hoc regular expression in one namespace.
    pub async fn invalidate_pattern(&self, namespace: Namespace, pattern: &str) -> Result<usize> {
        let removed = self.registry.get(namespace).invalidate_pattern(pattern).await?;
        info!(namespace = %namespace, pattern, removed, "Pattern invalidated");
        Ok(removed)
    }

    // == Global Stats ==
    pub async fn global_stats(&self) -> GlobalStats {
        let mut global = GlobalStats::default();

        for cache in self.registry.iter() {
            let stats = cache.stats().await;
            global.hits += stats.hits;
            global.misses += stats.misses;
            global.total_requests += stats.total_requests;
            global.saved_requests += stats.saved_requests;
            global.evictions += stats.evictions;
            global.size += stats.size;
            global.namespaces.insert(cache.namespace(), stats);
        }

        global.efficiency_percent = efficiency_percent(global.hits, global.total_requests);
        global
    }

    // == Cleanup ==
    /// Sweeps expired entries from every namespace.
    pub async fn cleanup(&self) -> usize {
        let mut removed = 0;
        for cache in self.registry.iter() {
            removed += cache.cleanup().await;
        }
        removed
    }

    // == Destroy All ==
    /// Cancels every cleanup timer and drops in-memory entries. Persisted
    /// entries are left for the next process.
    pub async fn destroy_all(&self) {
        for cache in self.registry.iter() {
            cache.destroy().await;
        }
        info!("All namespaces destroyed");
    }

    async fn remove_prefixes(&self, namespace: Namespace, prefixes: &[String]) -> usize {
        let cache = self.registry.get(namespace);
        let mut store = cache.store().write().await;
        prefixes
            .iter()
            .map(|prefix| store.invalidate_prefix(prefix))
            .sum()
    }
}
