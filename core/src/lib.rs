//! Stream supervision engine for surf-vcr.
//!
//! The crate owns everything with real invariants: the [`registry`] of
//! enabled streams, the per-stream capture [`runner`] loop and the
//! [`shutdown`] coordination that drains runners before the process exits.

pub mod api;
pub mod config;
pub mod error;
pub mod registry;
pub mod runner;
pub mod shutdown;
