//! Top-level facade crate for reqmeter.
//!
//! Re-exports the core metric model and the agent so users can depend on a single crate.

pub mod core {
    pub use reqmeter_core::*;
}

pub mod agent {
    pub use reqmeter_agent::*;
}
