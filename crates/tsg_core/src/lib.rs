//! TSG Core - Backend logic for TS Graph
//!
//! This crate contains the transport-stream analysis worker machinery with
//! zero UI dependencies. It can be used by the GUI application or a CLI tool.
//!
//! The heart of the crate is [`workers`]: background workers that drive an
//! opaque timestamp-extraction engine over an MPEG transport stream in
//! bounded windows, report percent progress, support cooperative
//! cancellation, and accumulate named chart series.

pub mod chart;
pub mod config;
pub mod engine;
pub mod logging;
pub mod models;
pub mod workers;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
