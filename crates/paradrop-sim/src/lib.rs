//! Airdrop tracking for PARADROP.
//!
//! Follows paratroopers from release to touchdown, groups each burst's
//! survivors into a formation, and keeps concurrent bursts apart.
//! The simulator is reached only through the traits in [`host`].

pub mod airdrop;
pub mod host;
pub mod landing;
pub mod registry;
pub mod sandbox;
pub mod scheduler;
pub mod tracker;

pub use paradrop_core as core;
pub use airdrop::{Airdrop, BurstStatus, BurstSummary};
pub use registry::Airdrops;
pub use tracker::{AirborneParatrooper, LandingOutcome, TrackerStep};
