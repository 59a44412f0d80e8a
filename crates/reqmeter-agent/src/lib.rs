//! reqmeter agent library entry.
//!
//! Wires the core metric model to a periodic dispatcher and an HTTP sink,
//! and provides the axum adapter used by the binary and by integration
//! tests.

pub mod config;
pub mod dispatch;
pub mod middleware;
pub mod ops;
pub mod payload;
pub mod reporter;
pub mod router;
pub mod sink;

pub use reporter::Reporter;
