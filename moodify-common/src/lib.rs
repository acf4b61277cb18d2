//! # Moodify Common Library
//!
//! Shared code for the Moodify emotion engine including:
//! - Emotion vocabulary and per-modality observation records
//! - Fused result types with provenance tags
//! - Configuration loading, validation and persistence
//! - Common error types

pub mod config;
pub mod emotion;
pub mod error;

pub use emotion::{EmotionLabel, FusedResult, FusionSource, Observation};
pub use error::{Error, Result};
