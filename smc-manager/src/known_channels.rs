//! `KnownChannels` (§3, §9): the per-party, process-lifetime set of
//! multisig addresses a party has ever participated in, guarding against
//! replaying an identical channel proposal. Multiple concurrent channels
//! on the recipient side run as independent cooperative tasks sharing
//! this one set (§5), so the check-then-insert must be atomic.

use std::collections::HashSet;
use std::sync::Mutex;

use smc_core::Address;

/// Replay-safe deduplication, injected into a party's constructor
/// (§9: never use process-global state in production).
pub trait KnownChannels: Send + Sync {
    /// Atomically checks whether `addr` is already known and, if not,
    /// inserts it. Returns `true` if this call performed the insertion
    /// (the channel is new), `false` if `addr` was already present.
    fn check_and_insert(&self, addr: &Address) -> bool;

    fn contains(&self, addr: &Address) -> bool;
}

/// The default, in-memory implementation. An implementation MAY persist
/// this to disk (`smc-storage`); that persistence must be crash-atomic
/// to preserve replay-safety (§6).
#[derive(Default)]
pub struct InMemoryKnownChannels {
    addresses: Mutex<HashSet<Address>>,
}

impl InMemoryKnownChannels {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KnownChannels for InMemoryKnownChannels {
    fn check_and_insert(&self, addr: &Address) -> bool {
        let mut set = self.addresses.lock().expect("known_channels mutex poisoned");
        set.insert(*addr)
    }

    fn contains(&self, addr: &Address) -> bool {
        let set = self.addresses.lock().expect("known_channels mutex poisoned");
        set.contains(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_insert_of_same_address_is_rejected() {
        let known = InMemoryKnownChannels::new();
        let addr = Address::from_digest([1u8; 32]);
        assert!(known.check_and_insert(&addr));
        assert!(!known.check_and_insert(&addr));
        assert!(known.contains(&addr));
    }
}
