//! Lock providers and the heartbeat-driven lease guard.
//!
//! [`InProcessLockProvider`] coordinates tasks within one process. The
//! DynamoDB provider in `storage::dynamodb` offers the same contract across
//! processes. [`LockGuard`] works with either.

mod guard;
mod inprocess;

pub(crate) use guard::check_renewable;
pub use guard::LockGuard;
pub use inprocess::InProcessLockProvider;
