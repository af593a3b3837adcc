//! AccountStore - keyed in-memory store for customer account state
//!
//! Maps customer id to the customer's [`velocity_core::AccountState`]
//! snapshot. Entries carry an idle TTL: `set` stamps a fresh expiry,
//! `get` treats an expired entry as a miss, and a periodic
//! `purge_expired` sweep reclaims the memory. A TTL of zero disables
//! expiration entirely.

mod config;
mod store;

pub use config::StoreConfig;
pub use store::AccountStore;
