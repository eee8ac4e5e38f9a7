//! Kaldi-style log mel filterbank features.

use std::f64::consts::PI;

/// Configures mel filterbank feature extraction.
///
/// Defaults follow the common speaker-embedding front end: Povey window,
/// 25ms frames, 10ms shift, 80 mel bins over 20-7600 Hz at 16kHz.
#[derive(Debug, Clone)]
pub struct FbankConfig {
    /// Input sample rate in Hz (default: 16000).
    pub sample_rate: u32,
    /// Number of mel filterbank channels (default: 80).
    pub num_mels: usize,
    /// Frame length in samples (default: 400 = 25ms @ 16kHz).
    pub frame_length: usize,
    /// Frame shift in samples (default: 160 = 10ms @ 16kHz).
    pub frame_shift: usize,
    /// Pre-emphasis coefficient (default: 0.97).
    pub pre_emphasis: f64,
    /// Floor applied before the log (default: 1e-10).
    pub energy_floor: f64,
    /// Low cutoff frequency for mel bins (default: 20 Hz).
    pub low_freq: f64,
    /// High cutoff frequency; zero or negative is an offset from Nyquist
    /// (default: -400).
    pub high_freq: f64,
    /// Remove the DC offset of each frame (default: true).
    pub remove_dc: bool,
}

impl Default for FbankConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            num_mels: 80,
            frame_length: 400,
            frame_shift: 160,
            pre_emphasis: 0.97,
            energy_floor: 1e-10,
            low_freq: 20.0,
            high_freq: -400.0,
            remove_dc: true,
        }
    }
}

/// Extracts log mel filterbank energies from normalized samples.
///
/// Returns `[num_frames][num_mels]`, or `None` when the input is shorter
/// than one frame or the configuration is degenerate.
pub fn compute_fbank(samples: &[f32], cfg: &FbankConfig) -> Option<Vec<Vec<f32>>> {
    if cfg.frame_shift == 0 || cfg.frame_length < 2 || cfg.num_mels == 0 {
        return None;
    }
    if samples.len() < cfg.frame_length {
        return None;
    }

    let num_frames = (samples.len() - cfg.frame_length) / cfg.frame_shift + 1;
    let fft_size = cfg.frame_length.next_power_of_two();
    let half_fft = fft_size / 2 + 1;
    let window = povey_window(cfg.frame_length);

    let nyquist = cfg.sample_rate as f64 / 2.0;
    let high_freq = if cfg.high_freq <= 0.0 { nyquist + cfg.high_freq } else { cfg.high_freq };
    let filterbank = mel_filterbank(cfg.num_mels, fft_size, cfg.sample_rate, cfg.low_freq, high_freq);

    let mut frame = vec![0.0f64; cfg.frame_length];
    let mut spectrum = vec![(0.0f64, 0.0f64); fft_size];
    let mut power = vec![0.0f64; half_fft];
    let mut features = Vec::with_capacity(num_frames);

    for f in 0..num_frames {
        let offset = f * cfg.frame_shift;
        for (dst, &src) in frame.iter_mut().zip(&samples[offset..offset + cfg.frame_length]) {
            *dst = src as f64;
        }

        if cfg.remove_dc {
            let mean = frame.iter().sum::<f64>() / frame.len() as f64;
            frame.iter_mut().for_each(|v| *v -= mean);
        }

        if cfg.pre_emphasis > 0.0 {
            for i in (1..frame.len()).rev() {
                frame[i] -= cfg.pre_emphasis * frame[i - 1];
            }
            frame[0] *= 1.0 - cfg.pre_emphasis;
        }

        spectrum.fill((0.0, 0.0));
        for (i, (&v, &w)) in frame.iter().zip(&window).enumerate() {
            spectrum[i].0 = v * w;
        }
        fft(&mut spectrum);

        for (p, &(re, im)) in power.iter_mut().zip(&spectrum) {
            *p = re * re + im * im;
        }

        let bins = filterbank
            .iter()
            .map(|filter| {
                let energy: f64 = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
                energy.max(cfg.energy_floor).ln() as f32
            })
            .collect();
        features.push(bins);
    }

    Some(features)
}

/// L2-normalizes a vector in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        v.iter_mut().for_each(|x| *x *= scale);
    }
}

/// Hamming window raised to 0.85.
fn povey_window(n: usize) -> Vec<f64> {
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| (0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos()).powf(0.85))
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular filters over FFT bins, `[num_mels][fft_size / 2 + 1]`.
fn mel_filterbank(num_mels: usize, fft_size: usize, sample_rate: u32, low_hz: f64, high_hz: f64) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let mel_low = hz_to_mel(low_hz);
    let step = (hz_to_mel(high_hz) - mel_low) / (num_mels + 1) as f64;

    let edges: Vec<usize> = (0..num_mels + 2)
        .map(|i| {
            let hz = mel_to_hz(mel_low + i as f64 * step);
            let bin = (hz * fft_size as f64 / sample_rate as f64).floor();
            (bin.max(0.0) as usize).min(half_fft - 1)
        })
        .collect();

    edges
        .windows(3)
        .map(|e| {
            let (left, center, right) = (e[0], e[1], e[2]);
            let mut filter = vec![0.0f64; half_fft];
            if center > left {
                for k in left..=center {
                    filter[k] = (k - left) as f64 / (center - left) as f64;
                }
            }
            if right > center {
                for k in center..=right {
                    filter[k] = (right - k) as f64 / (right - center) as f64;
                }
            }
            filter
        })
        .collect()
}

/// In-place radix-2 FFT over `(re, im)` pairs. Length must be a power of two.
fn fft(x: &mut [(f64, f64)]) {
    let n = x.len();
    if n <= 1 {
        return;
    }

    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            x.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f64;
        for start in (0..n).step_by(len) {
            for k in 0..len / 2 {
                let (wr, wi) = ((angle * k as f64).cos(), (angle * k as f64).sin());
                let (br, bi) = x[start + k + len / 2];
                let t = (wr * br - wi * bi, wr * bi + wi * br);
                let u = x[start + k];
                x[start + k] = (u.0 + t.0, u.1 + t.1);
                x[start + k + len / 2] = (u.0 - t.0, u.1 - t.1);
            }
        }
        len <<= 1;
    }
}
