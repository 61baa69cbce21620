//! # Prioritizer Common Library
//!
//! Shared code for the use-case prioritizer crates including:
//! - Data model (records, weight configs, scoring schemes, snapshots)
//! - Scoring engine (rank score, chart metrics, color gradient)
//! - Metadata codec (structured fields embedded in card descriptions)
//! - Event types (AppEvent enum + EventBus)
//! - Configuration loading
//! - Shared-secret authentication gate

pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod scoring;

pub use error::{Error, Result};
