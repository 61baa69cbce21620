//! Remote board synchronization
//!
//! [`reconcile`] pushes selected records to the board (create / update /
//! copy-fallback); [`order`] replays a ranked ordering onto a list using the
//! move-to-top primitive. Both run sequentially over the gateway so partial
//! failure leaves a well-defined prefix applied.

pub mod order;
pub mod reconcile;

pub use order::{OrderReport, OrderSynchronizer};
pub use reconcile::{RemoteSyncReconciler, SyncReport};
