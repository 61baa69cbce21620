//! Use-case prioritization board
//!
//! Library surface for the `prio-board` binary: the in-memory record store,
//! the card gateway seam with its Trello implementation, snapshot
//! persistence, and the push/ordering synchronizers. Domain types and the
//! scoring model live in `prio-common`.

pub mod gateway;
pub mod persist;
pub mod store;
pub mod sync;
pub mod trello;
