//! moodify-engine library interface
//!
//! Decision core of the Moodify emotion pipeline:
//! - `fusion`: combines a face and a voice observation into one labelled result
//! - `stabilizer`: rewrites raw voice classifications using acoustic heuristics
//!   and a short memory of previous decisions
//! - `voice`: minimum-duration gate in front of the stabilizer
//! - `registry`: one stabilizer per independent voice stream
//! - `recommend`: music search parameters for a decided emotion
//! - `service`: request-level operations tying the pieces together

pub mod error;
pub mod fusion;
pub mod recommend;
pub mod registry;
pub mod service;
pub mod stabilizer;
pub mod voice;

pub use crate::error::{EngineError, EngineResult};
pub use crate::fusion::{fuse_emotions, ExactTie, FusionEngine, PriorityOrder, TiePolicy};
pub use crate::registry::StabilizerRegistry;
pub use crate::service::{MoodRequest, MoodResponse, MoodService, MoodSource};
pub use crate::stabilizer::{AcousticFeatures, Stabilizer, StabilizerState};
pub use crate::voice::{VoiceAnalyzer, VoiceClip};
