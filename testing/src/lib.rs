//! # Matchday Testing
//!
//! In-memory test doubles for the Matchday workspace:
//!
//! - [`FixedClock`] - deterministic, manually advanced time
//! - [`InMemoryGateStore`] - ticket directory + scan ledger with the same
//!   uniqueness contract as the Postgres store
//! - [`InMemoryMatchFeed`] - broadcast-channel match feed with duplicate
//!   delivery on demand
//!
//! ## Example
//!
//! ```ignore
//! use matchday_testing::{test_clock, InMemoryGateStore};
//!
//! #[tokio::test]
//! async fn accepts_then_refuses() {
//!     let store = InMemoryGateStore::new();
//!     store.insert_order(paid_order());
//!     let validator = validator_over(&store);
//!
//!     assert!(validator.validate(&code, operator).await?.is_accepted());
//!     assert!(!validator.validate(&code, operator).await?.is_accepted());
//! }
//! ```

pub mod feed;
pub mod mocks;
pub mod store;

// Re-export commonly used items
pub use feed::InMemoryMatchFeed;
pub use mocks::{FixedClock, test_clock};
pub use store::InMemoryGateStore;
