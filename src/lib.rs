//! beaconfield - territorial control over beacons, links and triangular fields
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Geometric System
//! - [`geometry`] - Points, segments, triangle tests and polygon union
//! - [`field`] - Control fields (owned triangles) and their identity
//!
//! ## Control Graph
//! - [`beacon`] - Beacon nodes and the coordinate-keyed registry
//! - [`link`] - Links between beacons and link outcomes
//! - [`faction`] - Interned faction identifiers
//!
//! ## Engine
//! - [`engine`] - Link graph, field creation, ownership cascade, replay
//! - [`score`] - Per-faction scores and union area
//! - [`events`] - Structural deltas and the observer seam
//!
//! ## State Management
//! - [`persistence`] - Record store (SQLite and in-memory)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Geometric System
// ============================================================================
pub mod field;
pub mod geometry;

// ============================================================================
// Control Graph
// ============================================================================
pub mod beacon;
pub mod faction;
pub mod link;

// ============================================================================
// Engine
// ============================================================================
pub mod engine;
pub mod events;
pub mod score;

// ============================================================================
// State Management
// ============================================================================
pub mod persistence;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use engine::Engine;
pub use error::{EngineError, Result};
