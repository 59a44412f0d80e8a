//! reqmeter core: the in-process metric model.
//!
//! Request-handling code feeds typed `RequestRecord`s into a `Collector`,
//! which fans them out to a fixed set of metrics. Each metric keeps a live
//! accumulator plus a ledger of unacknowledged snapshots, so an export can be
//! repeated after a failed delivery without losing anything until `clear`.
//!
//! The crate carries no runtime or network dependencies; delivery lives in
//! `reqmeter-agent`.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Metric updates run
//! on request threads and must never take the host process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod collector;
pub mod error;
pub mod metric;
pub mod request;

pub use collector::Collector;
pub use error::{ErrorKind, ReqMeterError, Result};
pub use metric::{ExportMap, LedgerPolicy, Metric, MetricKind};
pub use request::{RequestRecord, UNKNOWN_ENDPOINT};
