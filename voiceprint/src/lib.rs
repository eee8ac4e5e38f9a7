//! Speaker attribution for call audio.
//!
//! # Architecture
//!
//! Two consumers share one embedding capability:
//!
//! 1. [`SpeakerEmbedder::extract`]: speech span -> embedding vector
//! 2. [`SpeakerClusterer::assign`]: embedding -> session-scoped speaker id
//!    (online clustering, no prior speaker count)
//! 3. [`VoiceVerifier::verify_embedding`]: embedding -> matching names from
//!    the persistent safe-list
//!
//! Similarity is always [`cosine_similarity`].
//!
//! # Feature Extraction
//!
//! The [`fbank`] module provides Kaldi-style log mel filterbank extraction,
//! used by the built-in [`FbankEmbedder`].

mod cluster;
mod cosine;
mod embedder;
mod error;
pub mod fbank;
mod model;
mod verifier;

pub use cluster::{Assignment, ClusterConfig, SpeakerClusterer, SpeakerProfile};
pub use cosine::cosine_similarity;
pub use embedder::FbankEmbedder;
pub use error::VoiceprintError;
pub use fbank::{compute_fbank, l2_normalize, FbankConfig};
pub use model::SpeakerEmbedder;
pub use verifier::{EnrollOutcome, SafeMatch, VoiceVerifier};
