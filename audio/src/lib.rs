//! Audio front end for the call-risk pipeline.
//!
//! This crate turns raw PCM chunks into speech spans:
//!
//! - [`pcm`]: 16-bit little-endian PCM decoding and format arithmetic
//! - [`resample`]: FFT-based sample rate conversion
//! - [`AudioBuffer`]: per-session bounded window of decoded samples
//! - [`SpeechSegmenter`]: frame-based voice activity detection
//!
//! # Example
//!
//! ```rust
//! use sentinel_audio::{AudioBuffer, SpeechSegmenter, VadConfig};
//!
//! let buffer = AudioBuffer::new(16000, 10.0);
//! buffer.append(&vec![0.0; 16000]);
//! assert_eq!(buffer.len(), 16000);
//!
//! let segmenter = SpeechSegmenter::new(VadConfig::default());
//! let spans = segmenter.detect(&buffer.window(1.0), 16000);
//! assert!(spans.is_empty());
//! ```

mod buffer;
mod error;
pub mod pcm;
mod resample;
mod vad;

pub use buffer::{AudioBuffer, Snapshot};
pub use error::AudioError;
pub use pcm::{decode_pcm16, encode_pcm16, Format};
pub use resample::resample;
pub use vad::{EnergyScorer, FrameScorer, Scan, SpeechSegment, SpeechSegmenter, VadConfig};
