//! # Challenge Store
//!
//! Ephemeral, single-use nonce tracker keyed by identity (email).
//!
//! ## Lifecycle
//! 1. The option builder `put`s a freshly minted nonce when a ceremony starts
//! 2. Whichever verification call reaches `take` first consumes it
//! 3. The entry is gone after the first `take`; success or failure, a
//!    challenge is never reusable
//!
//! ## Concurrency
//! A single `std::sync::Mutex` guards the whole map. The store is small
//! (one live entry per in-flight ceremony) and the critical sections are a
//! map lookup, so one global lock is enough to guarantee that two racing
//! `take` calls for the same identity cannot both succeed: exactly one gets
//! the nonce, the other observes `NoPendingChallenge`.
//!
//! Expiry is checked lazily inside `take`; there is no sweeper task. An
//! abandoned ceremony simply leaves an entry behind until the next `put`
//! for that identity overwrites it or a late `take` discards it as expired.

use crate::webauthn::error::{CeremonyError, CeremonyResult};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default maximum age of a pending challenge: 5 minutes.
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(300);

struct PendingChallenge {
    nonce: Vec<u8>,
    issued_at: Instant,
}

/// In-process challenge storage.
///
/// For single-instance deployments this mutex-guarded map is sufficient.
/// Horizontally scaled deployments would need a shared store with TTL
/// (e.g. Redis) behind the same put/take contract, since a completion must
/// be able to consume a challenge issued by another instance.
pub struct ChallengeStore {
    ttl: Duration,
    pending: Mutex<HashMap<String, PendingChallenge>>,
}

impl ChallengeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Store a nonce for an identity, overwriting any live challenge.
    ///
    /// At most one challenge is outstanding per identity: a second
    /// registration or login attempt silently invalidates the first.
    pub fn put(&self, identity: &str, nonce: Vec<u8>) {
        let mut pending = self.pending.lock().expect("challenge store poisoned");
        pending.insert(
            identity.to_owned(),
            PendingChallenge {
                nonce,
                issued_at: Instant::now(),
            },
        );
    }

    /// Atomically remove and return the pending nonce for an identity.
    ///
    /// The entry is removed unconditionally: an expired entry is discarded
    /// and surfaced as `ChallengeExpired`, never left behind as a reusable
    /// tombstone.
    pub fn take(&self, identity: &str) -> CeremonyResult<Vec<u8>> {
        let mut pending = self.pending.lock().expect("challenge store poisoned");
        let entry = pending
            .remove(identity)
            .ok_or(CeremonyError::NoPendingChallenge)?;

        if entry.issued_at.elapsed() > self.ttl {
            return Err(CeremonyError::ChallengeExpired);
        }

        Ok(entry.nonce)
    }
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHALLENGE_TTL)
    }
}
