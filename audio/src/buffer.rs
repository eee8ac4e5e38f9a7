//! Bounded sliding window of decoded audio.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// A thread-safe, time-bounded audio window.
///
/// `AudioBuffer` keeps at most `max_duration × sample_rate` samples. When an
/// append would exceed that bound, the oldest samples are evicted first.
/// Writers never block on readers beyond one short critical section, and
/// readers always receive an owned copy.
///
/// Every sample carries an absolute index: the number of samples appended
/// before it since the buffer was created. [`AudioBuffer::since`] uses that
/// index so a consumer can resume exactly where it left off, even after
/// eviction.
///
/// # Example
///
/// ```
/// use sentinel_audio::AudioBuffer;
///
/// // One second of 16kHz audio.
/// let buf = AudioBuffer::new(16000, 1.0);
/// buf.append(&vec![0.1; 20000]);
///
/// assert_eq!(buf.len(), 16000);
/// assert_eq!(buf.total_written(), 20000);
/// assert_eq!(buf.oldest_index(), 4000);
/// ```
pub struct AudioBuffer {
    sample_rate: u32,
    capacity: usize,
    state: Mutex<BufferState>,
}

struct BufferState {
    samples: VecDeque<f32>,
    // Absolute count of samples ever appended.
    total: u64,
}

/// A copy of buffered samples together with the absolute index of the first one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub start: u64,
    pub samples: Vec<f32>,
}

impl Snapshot {
    /// Absolute index one past the last sample.
    pub fn end(&self) -> u64 {
        self.start + self.samples.len() as u64
    }
}

impl AudioBuffer {
    /// Creates a buffer holding up to `max_duration_secs` of audio.
    ///
    /// The capacity is never smaller than one sample.
    pub fn new(sample_rate: u32, max_duration_secs: f64) -> Self {
        let capacity = ((max_duration_secs.max(0.0) * sample_rate as f64).round() as usize).max(1);
        Self {
            sample_rate,
            capacity,
            state: Mutex::new(BufferState {
                samples: VecDeque::with_capacity(capacity),
                total: 0,
            }),
        }
    }

    /// Appends a chunk, evicting the oldest samples past the window.
    ///
    /// An empty chunk is a no-op. A chunk longer than the whole window keeps
    /// only its newest samples.
    pub fn append(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        state.total += samples.len() as u64;

        if samples.len() >= self.capacity {
            tracing::debug!(
                chunk = samples.len(),
                capacity = self.capacity,
                "chunk exceeds buffer capacity, keeping its newest samples"
            );
            state.samples.clear();
            state
                .samples
                .extend(&samples[samples.len() - self.capacity..]);
            return;
        }

        let overflow = (state.samples.len() + samples.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            state.samples.drain(..overflow);
        }
        state.samples.extend(samples);
    }

    /// Returns the most recent `duration_secs` of audio, or the whole buffer
    /// if it holds less.
    pub fn window(&self, duration_secs: f64) -> Vec<f32> {
        let want = (duration_secs.max(0.0) * self.sample_rate as f64).round() as usize;
        let state = self.state.lock();
        let n = want.min(state.samples.len());
        state.samples.range(state.samples.len() - n..).copied().collect()
    }

    /// Returns every buffered sample whose absolute index is at least `index`.
    ///
    /// If `index` has already been evicted, the snapshot starts at the oldest
    /// sample still held.
    pub fn since(&self, index: u64) -> Snapshot {
        let state = self.state.lock();
        let oldest = state.total - state.samples.len() as u64;
        let start = index.clamp(oldest, state.total);
        let skip = (start - oldest) as usize;
        Snapshot {
            start,
            samples: state.samples.range(skip..).copied().collect(),
        }
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.state.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().samples.is_empty()
    }

    /// Maximum number of samples the buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Absolute count of samples ever appended.
    pub fn total_written(&self) -> u64 {
        self.state.lock().total
    }

    /// Absolute index of the oldest sample still buffered.
    pub fn oldest_index(&self) -> u64 {
        let state = self.state.lock();
        state.total - state.samples.len() as u64
    }

    /// Drops all buffered samples. Absolute indices keep counting.
    pub fn clear(&self) {
        self.state.lock().samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn ramp(start: usize, n: usize) -> Vec<f32> {
        (start..start + n).map(|i| i as f32).collect()
    }

    #[test]
    fn test_capacity_from_duration() {
        let buf = AudioBuffer::new(16000, 10.0);
        assert_eq!(buf.capacity(), 160000);
        assert!(buf.is_empty());

        let tiny = AudioBuffer::new(16000, 0.0);
        assert_eq!(tiny.capacity(), 1);
    }

    #[test]
    fn test_empty_append_is_noop() {
        let buf = AudioBuffer::new(100, 1.0);
        buf.append(&[]);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.total_written(), 0);
    }

    #[test]
    fn test_bound_holds_after_every_append() {
        let buf = AudioBuffer::new(100, 1.0);
        let sizes = [1usize, 37, 99, 100, 101, 250, 3, 0, 64];
        let mut written = 0;
        for n in sizes {
            buf.append(&ramp(written, n));
            written += n;
            assert!(buf.len() <= buf.capacity(), "len {} after chunk {}", buf.len(), n);
        }
        assert_eq!(buf.total_written(), written as u64);
    }

    #[test]
    fn test_evicts_oldest() {
        let buf = AudioBuffer::new(10, 1.0);
        buf.append(&ramp(0, 8));
        buf.append(&ramp(8, 5));
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.oldest_index(), 3);
        assert_eq!(buf.window(100.0), ramp(3, 10));
    }

    #[test]
    fn test_oversized_chunk_keeps_tail() {
        let buf = AudioBuffer::new(10, 1.0);
        buf.append(&ramp(0, 25));
        assert_eq!(buf.window(1.0), ramp(15, 10));
        assert_eq!(buf.oldest_index(), 15);
    }

    #[test]
    fn test_window_does_not_mutate() {
        let buf = AudioBuffer::new(10, 2.0);
        buf.append(&ramp(0, 15));
        assert_eq!(buf.window(0.5), ramp(10, 5));
        assert_eq!(buf.window(0.5), ramp(10, 5));
        assert_eq!(buf.window(0.0), Vec::<f32>::new());
        assert_eq!(buf.len(), 15);
    }

    #[test]
    fn test_since_resumes_after_eviction() {
        let buf = AudioBuffer::new(10, 1.0);
        buf.append(&ramp(0, 6));
        let snap = buf.since(2);
        assert_eq!(snap.start, 2);
        assert_eq!(snap.samples, ramp(2, 4));
        assert_eq!(snap.end(), 6);

        buf.append(&ramp(6, 10));
        // Index 2 was evicted; resume from the oldest sample.
        let snap = buf.since(2);
        assert_eq!(snap.start, 6);
        assert_eq!(snap.samples, ramp(6, 10));

        // Past the end yields an empty snapshot.
        let snap = buf.since(100);
        assert_eq!(snap.start, 16);
        assert!(snap.samples.is_empty());
    }

    #[test]
    fn test_concurrent_append_and_read() {
        let buf = Arc::new(AudioBuffer::new(1000, 1.0));
        let writer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for i in 0..200 {
                    buf.append(&ramp(i * 50, 50));
                }
            })
        };
        let reader = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for _ in 0..200 {
                    assert!(buf.window(1.0).len() <= 1000);
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(buf.len(), 1000);
        assert_eq!(buf.total_written(), 10000);
    }
}
