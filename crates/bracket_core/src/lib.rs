//! Core of the photo tournament
//!
//! This crate holds everything a tournament needs that does not touch the
//! network or the filesystem:
//! - Items and their standing (score, round, eliminated)
//! - Elo rating updates
//! - The three elimination strategies (pairwise, n-wise, Elo-rated)
//! - The judge contract and its random-fallback adapter
//! - Configuration and per-round snapshots
//!
//! Judges live in their own crates under `crates/judges/`; the round loop
//! and persistence live in the `tournament` crate.

pub mod config;
pub mod elimination;
pub mod item;
pub mod judge;
pub mod rating;
pub mod snapshot;
pub mod verdict;

pub use config::*;
pub use elimination::*;
pub use item::*;
pub use judge::*;
pub use rating::*;
pub use snapshot::*;
pub use verdict::*;
