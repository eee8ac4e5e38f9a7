use serde::{Deserialize, Serialize};

use crate::{cosine_similarity, VoiceprintError};

/// Configures online speaker clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// A span joins an existing speaker when its best similarity is strictly
    /// above this value (default: 0.25).
    pub similarity_threshold: f32,

    /// Weight kept by the old centroid on each update (default: 0.8).
    pub centroid_weight: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.25,
            centroid_weight: 0.8,
        }
    }
}

/// A speaker seen in the current session.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerProfile {
    pub id: u32,
    pub centroid: Vec<f32>,
    pub segments: usize,
    pub last_seen_secs: f64,
}

/// Outcome of [`SpeakerClusterer::assign`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub speaker: u32,
    /// Similarity to the matched centroid, or the best similarity found when
    /// a new speaker was created (0.0 for the first speaker).
    pub similarity: f32,
    pub is_new: bool,
}

/// Online diarization over one session.
///
/// Each span embedding is compared with every speaker centroid. The best
/// match above the threshold takes the span and its centroid moves toward
/// the new embedding by exponential moving average; otherwise a new speaker
/// id is allocated. Ties go to the lowest id. Ids start at 1 and are only
/// meaningful within one session.
#[derive(Debug, Clone, Default)]
pub struct SpeakerClusterer {
    config: ClusterConfig,
    profiles: Vec<SpeakerProfile>,
}

impl SpeakerClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            profiles: Vec::new(),
        }
    }

    /// Assigns `embedding`, observed at `at_secs` session time, to a speaker.
    pub fn assign(&mut self, embedding: &[f32], at_secs: f64) -> Result<Assignment, VoiceprintError> {
        if let Some(first) = self.profiles.first() {
            if first.centroid.len() != embedding.len() {
                return Err(VoiceprintError::DimensionMismatch {
                    expected: first.centroid.len(),
                    got: embedding.len(),
                });
            }
        }

        // Profiles are kept in id order, so a strict comparison keeps the
        // lowest id on ties.
        let mut best: Option<(usize, f32)> = None;
        for (i, profile) in self.profiles.iter().enumerate() {
            let sim = cosine_similarity(&profile.centroid, embedding);
            if best.is_none_or(|(_, b)| sim > b) {
                best = Some((i, sim));
            }
        }

        match best {
            Some((i, sim)) if sim > self.config.similarity_threshold => {
                let keep = self.config.centroid_weight;
                let profile = &mut self.profiles[i];
                for (c, &e) in profile.centroid.iter_mut().zip(embedding) {
                    *c = keep * *c + (1.0 - keep) * e;
                }
                profile.segments += 1;
                profile.last_seen_secs = at_secs;
                Ok(Assignment {
                    speaker: profile.id,
                    similarity: sim,
                    is_new: false,
                })
            }
            other => {
                let id = self.profiles.len() as u32 + 1;
                self.profiles.push(SpeakerProfile {
                    id,
                    centroid: embedding.to_vec(),
                    segments: 1,
                    last_seen_secs: at_secs,
                });
                Ok(Assignment {
                    speaker: id,
                    similarity: other.map_or(0.0, |(_, s)| s),
                    is_new: true,
                })
            }
        }
    }

    /// Speakers registered so far, in id order.
    pub fn profiles(&self) -> &[SpeakerProfile] {
        &self.profiles
    }

    pub fn speaker_count(&self) -> usize {
        self.profiles.len()
    }

    /// Forgets every speaker. The next assignment starts again at id 1.
    pub fn reset(&mut self) {
        self.profiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_speaker_is_one() {
        let mut c = SpeakerClusterer::default();
        let a = c.assign(&[1.0, 0.0, 0.0], 0.5).unwrap();
        assert_eq!(a.speaker, 1);
        assert!(a.is_new);
        assert_eq!(a.similarity, 0.0);
        assert_eq!(c.profiles()[0].centroid, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_same_centroid_is_idempotent() {
        let mut c = SpeakerClusterer::default();
        c.assign(&[0.6, 0.8, 0.0], 0.0).unwrap();
        for _ in 0..3 {
            let a = c.assign(&[0.6, 0.8, 0.0], 1.0).unwrap();
            assert_eq!(a.speaker, 1);
            assert!((a.similarity - 1.0).abs() < 1e-6);
            assert!(!a.is_new);
        }
        assert_eq!(c.speaker_count(), 1);
        assert_eq!(c.profiles()[0].segments, 4);
    }

    #[test]
    fn test_dissimilar_creates_new_speaker() {
        let mut c = SpeakerClusterer::default();
        c.assign(&[1.0, 0.0], 0.0).unwrap();
        let a = c.assign(&[0.0, 1.0], 1.0).unwrap();
        assert_eq!(a.speaker, 2);
        assert!(a.is_new);
        assert!(a.similarity.abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut c = SpeakerClusterer::new(ClusterConfig {
            similarity_threshold: 0.5,
            ..Default::default()
        });
        c.assign(&[1.0, 0.0, 0.0, 0.0], 0.0).unwrap();
        // Exactly 0.5 apart.
        let a = c.assign(&[1.0, 1.0, 1.0, 1.0], 1.0).unwrap();
        assert_eq!(a.speaker, 2);
    }

    #[test]
    fn test_centroid_moving_average() {
        let mut c = SpeakerClusterer::default();
        c.assign(&[1.0, 0.0], 0.0).unwrap();
        c.assign(&[0.8, 0.6], 2.5).unwrap();
        let p = &c.profiles()[0];
        assert!((p.centroid[0] - 0.96).abs() < 1e-6);
        assert!((p.centroid[1] - 0.12).abs() < 1e-6);
        assert_eq!(p.last_seen_secs, 2.5);
    }

    #[test]
    fn test_tie_prefers_lowest_id() {
        let mut c = SpeakerClusterer::default();
        c.assign(&[1.0, 0.0], 0.0).unwrap();
        c.assign(&[0.0, 1.0], 0.0).unwrap();
        // Equidistant from both centroids.
        let a = c.assign(&[1.0, 1.0], 1.0).unwrap();
        assert_eq!(a.speaker, 1);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut c = SpeakerClusterer::default();
        c.assign(&[1.0, 0.0], 0.0).unwrap();
        let err = c.assign(&[1.0, 0.0, 0.0], 1.0).unwrap_err();
        assert!(matches!(err, VoiceprintError::DimensionMismatch { expected: 2, got: 3 }));
        assert_eq!(c.speaker_count(), 1);
    }

    #[test]
    fn test_reset_restarts_ids() {
        let mut c = SpeakerClusterer::default();
        c.assign(&[1.0, 0.0], 0.0).unwrap();
        c.assign(&[0.0, 1.0], 0.0).unwrap();
        c.reset();
        assert_eq!(c.speaker_count(), 0);
        assert_eq!(c.assign(&[0.0, 1.0], 0.0).unwrap().speaker, 1);
    }
}
