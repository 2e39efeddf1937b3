//! Elimination tournament runner for photo collections
//!
//! This crate provides infrastructure for:
//! - Running judged elimination rounds over a set of photos
//! - Persisting every completed round and resuming from the latest one
//! - Reporting standings and browsing the judgment history
//!
//! # Usage
//!
//! ```bash
//! # Three ELO rounds over ./photos judged by a vision model
//! cargo run -p tournament -- run '{"algorithm":"elo","rounds":3}'
//!
//! # Offline run with the random judge, continuing a stored tournament
//! cargo run -p tournament -- run --config cup.toml --judge random --resume
//!
//! # Standings and judgments of a stored tournament
//! cargo run -p tournament -- report --tournament spring-cup
//! cargo run -p tournament -- judgments --tournament spring-cup --round 2
//! ```

mod controller;
mod discovery;
mod error;
mod report;
mod store;

pub use controller::*;
pub use discovery::*;
pub use error::*;
pub use report::*;
pub use store::*;
