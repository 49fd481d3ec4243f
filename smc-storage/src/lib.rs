//! A crash-atomic, disk-backed `KnownChannels` set (§9: an implementation
//! MAY persist replay state to disk; this must remain crash-atomic).

use log::error;
use sled::Db;

use smc_core::Address;
use smc_manager::KnownChannels;

/// Persists known multisig addresses in a single sled tree. `sled`
/// guarantees that `compare_and_swap`-style inserts are atomic with
/// respect to process crashes, so a channel can never be half-recorded.
pub struct SledKnownChannels {
    db: Db,
}

impl SledKnownChannels {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, sled::Error> {
        Ok(SledKnownChannels {
            db: sled::open(path)?,
        })
    }
}

impl KnownChannels for SledKnownChannels {
    fn check_and_insert(&self, addr: &Address) -> bool {
        let key = addr.as_bytes();
        match self.db.compare_and_swap(key, None as Option<&[u8]>, Some(&[1u8])) {
            Ok(Ok(())) => {
                if let Err(e) = self.db.flush() {
                    error!("smc-storage: flush after insert failed: {}", e);
                }
                true
            }
            Ok(Err(_)) => false,
            Err(e) => {
                error!("smc-storage: compare_and_swap failed: {}", e);
                false
            }
        }
    }

    fn contains(&self, addr: &Address) -> bool {
        matches!(self.db.get(addr.as_bytes()), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_insert_of_same_address_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let known = SledKnownChannels::open(dir.path()).unwrap();
        let addr = Address::from_digest([4u8; 32]);
        assert!(known.check_and_insert(&addr));
        assert!(!known.check_and_insert(&addr));
        assert!(known.contains(&addr));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let addr = Address::from_digest([5u8; 32]);
        {
            let known = SledKnownChannels::open(dir.path()).unwrap();
            assert!(known.check_and_insert(&addr));
        }
        let reopened = SledKnownChannels::open(dir.path()).unwrap();
        assert!(reopened.contains(&addr));
        assert!(!reopened.check_and_insert(&addr));
    }
}
