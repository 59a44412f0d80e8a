//! Periodic export and delivery of collected metrics.

pub mod dispatcher;

pub use dispatcher::{CycleOutcome, DispatchSettings, DispatchState, Dispatcher};
