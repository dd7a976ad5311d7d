//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the core depends on; their implementations
//! live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IMediaTracker`] - Watch-history tracking service (Trakt)

pub mod media_tracker;

pub use media_tracker::IMediaTracker;
