use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default lease length.
pub const DEFAULT_LOCK_DURATION_SECONDS: i64 = 600;

/// Shortest lease a holder can keep renewed.
///
/// Lease arithmetic is in whole seconds, so a heartbeat only refreshes to the
/// start of the current second. A one second lease therefore lapses at the
/// next second boundary however often it is renewed.
pub const MIN_RENEWABLE_LOCK_DURATION_SECONDS: i64 = 2;

/// A time-bounded grant for `key`, fenced by `owner_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockLease {
    pub key: String,
    pub owner_token: String,
    pub created_on: i64,
    pub last_heartbeat_on: i64,
    pub lock_duration_seconds: i64,
    /// Diagnostic only.
    pub machine_name: String,
}

impl LockLease {
    /// A fresh lease for `key` with a new random owner token.
    pub fn new(key: impl Into<String>, lock_duration_seconds: i64, now: i64) -> Self {
        Self {
            key: key.into(),
            owner_token: Uuid::new_v4().to_string(),
            created_on: now,
            last_heartbeat_on: now,
            lock_duration_seconds,
            machine_name: machine_name(),
        }
    }

    pub fn seconds_remaining(&self, now: i64) -> i64 {
        self.lock_duration_seconds - (now - self.last_heartbeat_on)
    }

    pub fn is_valid(&self, now: i64) -> bool {
        self.seconds_remaining(now) > 0
    }

    /// First instant at which the lease is no longer valid.
    pub fn expires_at(&self) -> i64 {
        self.last_heartbeat_on + self.lock_duration_seconds
    }

    /// The same lease with its heartbeat refreshed to `now`.
    pub fn renewed(&self, now: i64) -> Self {
        Self {
            last_heartbeat_on: now,
            ..self.clone()
        }
    }

    /// True when `other` is the same grant: same key and owner token.
    pub fn same_grant(&self, other: &LockLease) -> bool {
        self.key == other.key && self.owner_token == other.owner_token
    }

    /// Cadence at which a holder should renew: a third of the lease, always
    /// strictly shorter than the lease itself.
    pub fn heartbeat_interval(&self) -> Duration {
        let millis = self.lock_duration_seconds.max(0).saturating_mul(1_000) / 3;
        Duration::from_millis(millis.max(1) as u64)
    }

    /// True when the lease is long enough to be kept alive by heartbeats.
    pub fn is_renewable(&self) -> bool {
        self.lock_duration_seconds >= MIN_RENEWABLE_LOCK_DURATION_SECONDS
    }
}

/// True when a new lease may be granted over `existing`.
pub fn can_acquire(existing: Option<&LockLease>, now: i64) -> bool {
    existing.is_none_or(|lease| !lease.is_valid(now))
}

/// Host name recorded on leases for diagnostics.
pub fn machine_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_remaining() {
        let lease = LockLease::new("jobs:reindex", 5, 1_000);

        assert_eq!(lease.seconds_remaining(1_000), 5);
        assert_eq!(lease.seconds_remaining(1_004), 1);
        assert!(lease.is_valid(1_004));
        assert!(!lease.is_valid(1_005));
        assert_eq!(lease.expires_at(), 1_005);
    }

    #[test]
    fn test_renewed_keeps_identity() {
        let lease = LockLease::new("jobs:reindex", 5, 1_000);
        let renewed = lease.renewed(1_004);

        assert!(lease.same_grant(&renewed));
        assert_eq!(renewed.created_on, 1_000);
        assert_eq!(renewed.seconds_remaining(1_008), 1);
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = LockLease::new("k", 5, 0);
        let b = LockLease::new("k", 5, 0);
        assert!(!a.same_grant(&b));
    }

    #[test]
    fn test_can_acquire() {
        let lease = LockLease::new("k", 5, 1_000);

        assert!(can_acquire(None, 1_000));
        assert!(!can_acquire(Some(&lease), 1_002));
        assert!(can_acquire(Some(&lease), 1_006));
    }

    #[test]
    fn test_heartbeat_interval() {
        assert_eq!(
            LockLease::new("k", DEFAULT_LOCK_DURATION_SECONDS, 0).heartbeat_interval(),
            Duration::from_secs(200)
        );
        assert_eq!(
            LockLease::new("k", 2, 0).heartbeat_interval(),
            Duration::from_millis(666)
        );
        assert_eq!(
            LockLease::new("k", 1, 0).heartbeat_interval(),
            Duration::from_millis(333)
        );
    }

    #[test]
    fn test_heartbeat_interval_is_shorter_than_lease() {
        for seconds in 1..=10 {
            let lease = LockLease::new("k", seconds, 0);
            assert!(lease.heartbeat_interval() < Duration::from_secs(seconds as u64));
        }
    }

    #[test]
    fn test_is_renewable() {
        assert!(!LockLease::new("k", 1, 0).is_renewable());
        assert!(LockLease::new("k", MIN_RENEWABLE_LOCK_DURATION_SECONDS, 0).is_renewable());
    }
}
