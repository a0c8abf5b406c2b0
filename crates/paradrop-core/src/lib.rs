//! Core types and definitions for PARADROP.
//!
//! This crate defines the vocabulary shared across the other crates:
//! identity handles, vector helpers, host events, outbound airdrop events,
//! configuration and constants. It has no dependency on any simulator.

pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod types;
pub mod vector;

pub use glam::{DVec2, DVec3};

#[cfg(test)]
mod tests;
