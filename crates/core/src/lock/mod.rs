//! Lease-based mutual exclusion keyed by an arbitrary string.
//!
//! A lease moves `Unacquired -> Held -> (Released | Expired)`. Expiry is a
//! property of the clock, not of the stored row: a lease whose time ran out
//! is not held by anyone even while its row still exists.

mod traits;
mod types;

pub use traits::LockProvider;
pub use types::{
    can_acquire, machine_name, LockLease, DEFAULT_LOCK_DURATION_SECONDS,
    MIN_RENEWABLE_LOCK_DURATION_SECONDS,
};
