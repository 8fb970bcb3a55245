//! Weakly-owned per-type cache of derived operation names.
//!
//! The outer map is keyed by descriptor identity and holds only a
//! [`Weak`] reference to the owner, so caching a name never pins a type
//! descriptor that is otherwise reclaimable. Dead entries are swept whenever
//! a new owner is inserted; there is no other eviction, since each inner map
//! is naturally bounded by the number of distinct members per type.
//!
//! Concurrent misses for the same key may race to compute, but the derivation
//! is pure and idempotent, so last-write-wins on the inner map converges on
//! an equal result.

use crate::invocation::TypeDescriptor;
use crate::naming;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock, Weak};

type Deriver = dyn Fn(&TypeDescriptor, &str) -> String + Send + Sync;

struct OwnerEntry {
    owner: Weak<TypeDescriptor>,
    names: Arc<RwLock<HashMap<String, String>>>,
    simple: Arc<OnceLock<String>>,
}

/// Two-level name cache: owner type (weak) -> member name -> derived name.
pub struct NameCache {
    owners: Mutex<HashMap<usize, OwnerEntry>>,
    derive: Box<Deriver>,
}

impl NameCache {
    /// Creates a cache backed by [`naming::derive_name`].
    pub fn new() -> Self {
        Self::with_deriver(naming::derive_name)
    }

    /// Creates a cache with a custom deriver. The deriver must be pure:
    /// concurrent misses may invoke it more than once for the same key.
    pub fn with_deriver<F>(derive: F) -> Self
    where
        F: Fn(&TypeDescriptor, &str) -> String + Send + Sync + 'static,
    {
        Self {
            owners: Mutex::new(HashMap::new()),
            derive: Box::new(derive),
        }
    }

    /// Returns the derived operation name for `(owner, member)`, computing
    /// and caching it on a miss.
    pub fn name_for(&self, owner: &Arc<TypeDescriptor>, member: &str) -> String {
        let names = self.entry_for(owner).0;
        {
            let map = names.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(found) = map.get(member) {
                return found.clone();
            }
        }
        let derived = (self.derive)(owner.as_ref(), member);
        let mut map = names.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(member.to_string(), derived.clone());
        derived
    }

    /// Returns the cached simple name of `owner`, computing it on first use.
    pub fn simple_name_for(&self, owner: &Arc<TypeDescriptor>) -> String {
        let simple = self.entry_for(owner).1;
        simple
            .get_or_init(|| naming::simple_name(owner.as_ref()))
            .clone()
    }

    /// Number of owner entries currently in the outer map, including entries
    /// whose owner has died but has not been swept yet.
    pub fn tracked_owners(&self) -> usize {
        self.owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of owner entries whose descriptor is still alive.
    pub fn live_owners(&self) -> usize {
        self.owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.owner.strong_count() > 0)
            .count()
    }

    /// Looks up or inserts the entry for `owner`, keyed by the descriptor
    /// allocation. A slot whose weak owner died (or whose address was reused
    /// by a different descriptor) is replaced; inserting a fresh owner also
    /// sweeps all dead entries.
    fn entry_for(
        &self,
        owner: &Arc<TypeDescriptor>,
    ) -> (
        Arc<RwLock<HashMap<String, String>>>,
        Arc<OnceLock<String>>,
    ) {
        let key = Arc::as_ptr(owner) as usize;
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = owners.get(&key) {
            if let Some(live) = entry.owner.upgrade() {
                if Arc::ptr_eq(&live, owner) {
                    return (Arc::clone(&entry.names), Arc::clone(&entry.simple));
                }
            }
        }
        owners.retain(|_, entry| entry.owner.strong_count() > 0);
        let entry = OwnerEntry {
            owner: Arc::downgrade(owner),
            names: Arc::new(RwLock::new(HashMap::new())),
            simple: Arc::new(OnceLock::new()),
        };
        let handles = (Arc::clone(&entry.names), Arc::clone(&entry.simple));
        owners.insert(key, entry);
        handles
    }
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn order_service() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::named("app::orders", "OrderService"))
    }

    #[test]
    fn miss_computes_and_caches() {
        let cache = NameCache::new();
        let owner = order_service();
        assert_eq!(cache.name_for(&owner, "place"), "OrderService.place");
        assert_eq!(cache.name_for(&owner, "place"), "OrderService.place");
        assert_eq!(cache.tracked_owners(), 1);
    }

    #[test]
    fn second_call_does_not_rederive() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let cache = NameCache::with_deriver(move |owner: &TypeDescriptor, member: &str| {
            counted.fetch_add(1, Ordering::SeqCst);
            naming::derive_name(owner, member)
        });
        let owner = order_service();
        let first = cache.name_for(&owner, "place");
        let second = cache.name_for(&owner, "place");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_members_get_distinct_names() {
        let cache = NameCache::new();
        let owner = order_service();
        assert_eq!(cache.name_for(&owner, "place"), "OrderService.place");
        assert_eq!(cache.name_for(&owner, "cancel"), "OrderService.cancel");
        assert_eq!(cache.tracked_owners(), 1);
    }

    #[test]
    fn simple_name_is_cached_per_owner() {
        let cache = NameCache::new();
        let owner = order_service();
        assert_eq!(cache.simple_name_for(&owner), "OrderService");
        assert_eq!(cache.simple_name_for(&owner), "OrderService");
    }

    #[test]
    fn cache_does_not_pin_the_owner() {
        let cache = NameCache::new();
        let owner = order_service();
        let liveness = Arc::downgrade(&owner);
        cache.name_for(&owner, "place");
        drop(owner);
        assert!(liveness.upgrade().is_none());
        assert_eq!(cache.live_owners(), 0);
    }

    #[test]
    fn dead_entries_are_swept_on_insert() {
        let cache = NameCache::new();
        let transient = order_service();
        cache.name_for(&transient, "place");
        drop(transient);
        assert_eq!(cache.tracked_owners(), 1);

        let fresh = Arc::new(TypeDescriptor::named("app::billing", "InvoiceService"));
        cache.name_for(&fresh, "issue");
        assert_eq!(cache.tracked_owners(), 1);
        assert_eq!(cache.live_owners(), 1);
    }

    #[test]
    fn concurrent_lookups_converge() {
        let cache = Arc::new(NameCache::new());
        let owner = order_service();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let owner = Arc::clone(&owner);
            handles.push(std::thread::spawn(move || {
                let mut names = Vec::new();
                for _ in 0..1_000 {
                    names.push(cache.name_for(&owner, "place"));
                }
                names
            }));
        }
        for handle in handles {
            for name in handle.join().unwrap() {
                assert_eq!(name, "OrderService.place");
            }
        }
        assert_eq!(cache.tracked_owners(), 1);
    }
}
