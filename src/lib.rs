//! Hazardwatch - Duplicate-Detection State & Classification Engine
//!
//! Tracks hazard reports through a multi-stage similarity pipeline (geo,
//! lexical, semantic, then fusion), derives each report's pipeline phase,
//! classifies duplicate likelihood against configurable thresholds, narrows
//! report lists through cascading site and cluster filters, and drives the
//! per-item auto-confirm countdown used during manual review.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod filtering;
pub mod model;
pub mod review;
pub mod sorting;
pub mod stage;
pub mod stats;

pub use error::{HazardError, Result};
