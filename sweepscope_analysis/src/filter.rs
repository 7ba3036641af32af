//! Digital filtering: zero-phase Butterworth IIR and a Gaussian-kernel lowpass.
//!
//! Both filters are zero-phase (forward-backward application) so that event
//! timing measured downstream is not biased by filter group delay. The
//! Butterworth cascade uses RBJ-cookbook biquad sections with the Butterworth
//! Q ladder; bandpass is a highpass/lowpass cascade.
//!
//! Out-of-domain parameters (non-positive cutoff or rate, cutoff at or above
//! Nyquist, inverted band) return the input unchanged: filtering above
//! Nyquist is meaningless, not erroneous, and the caller's UI normally
//! constrains the ranges anyway.

use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default Butterworth order.
pub const DEFAULT_FILTER_ORDER: usize = 4;

/// Butterworth response type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FilterKind {
    Lowpass { cutoff: f64 },
    Highpass { cutoff: f64 },
    /// Realized as a highpass-at-`low` / lowpass-at-`high` cascade.
    Bandpass { low: f64, high: f64 },
}

/// One normalized second-order section (a0 divided out).
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// RBJ cookbook lowpass section.
    fn lowpass(cutoff: f64, sample_rate: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 - cos_w0) * 0.5 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) * 0.5 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// RBJ cookbook highpass section.
    fn highpass(cutoff: f64, sample_rate: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 + cos_w0) * 0.5 / a0,
            b1: -(1.0 + cos_w0) / a0,
            b2: (1.0 + cos_w0) * 0.5 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// One-pole lowpass for odd filter orders.
    fn first_order_lowpass(cutoff: f64, sample_rate: f64) -> Self {
        let rc = 1.0 / (2.0 * PI * cutoff);
        let dt = 1.0 / sample_rate;
        let alpha = dt / (rc + dt);
        Self {
            b0: alpha,
            b1: 0.0,
            b2: 0.0,
            a1: -(1.0 - alpha),
            a2: 0.0,
        }
    }

    /// One-pole highpass for odd filter orders.
    fn first_order_highpass(cutoff: f64, sample_rate: f64) -> Self {
        let rc = 1.0 / (2.0 * PI * cutoff);
        let dt = 1.0 / sample_rate;
        let alpha = rc / (rc + dt);
        Self {
            b0: alpha,
            b1: -alpha,
            b2: 0.0,
            a1: -alpha,
            a2: 0.0,
        }
    }
}

/// Q values of the second-order sections of an order-`order` Butterworth
/// filter (pole-pair angles `pi*(2k+1)/(2*order)`).
fn butterworth_q_ladder(order: usize) -> Vec<f64> {
    (0..order / 2)
        .map(|k| {
            let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
            1.0 / (2.0 * theta.sin())
        })
        .collect()
}

fn butterworth_sections(kind: FilterKind, sample_rate: f64, order: usize) -> Vec<Biquad> {
    let mut sections = Vec::new();
    match kind {
        FilterKind::Lowpass { cutoff } => {
            for q in butterworth_q_ladder(order) {
                sections.push(Biquad::lowpass(cutoff, sample_rate, q));
            }
            if order % 2 == 1 {
                sections.push(Biquad::first_order_lowpass(cutoff, sample_rate));
            }
        }
        FilterKind::Highpass { cutoff } => {
            for q in butterworth_q_ladder(order) {
                sections.push(Biquad::highpass(cutoff, sample_rate, q));
            }
            if order % 2 == 1 {
                sections.push(Biquad::first_order_highpass(cutoff, sample_rate));
            }
        }
        FilterKind::Bandpass { low, high } => {
            sections.extend(butterworth_sections(
                FilterKind::Highpass { cutoff: low },
                sample_rate,
                order,
            ));
            sections.extend(butterworth_sections(
                FilterKind::Lowpass { cutoff: high },
                sample_rate,
                order,
            ));
        }
    }
    sections
}

fn kind_in_domain(kind: FilterKind, nyquist: f64) -> bool {
    match kind {
        FilterKind::Lowpass { cutoff } | FilterKind::Highpass { cutoff } => {
            cutoff > 0.0 && cutoff < nyquist
        }
        FilterKind::Bandpass { low, high } => low > 0.0 && low < high && high < nyquist,
    }
}

/// Runs one causal pass of the cascade (direct form II transposed).
fn run_cascade(data: &mut [f64], sections: &[Biquad]) {
    for s in sections {
        let mut z1 = 0.0;
        let mut z2 = 0.0;
        for x in data.iter_mut() {
            let y = s.b0 * *x + z1;
            z1 = s.b1 * *x - s.a1 * y + z2;
            z2 = s.b2 * *x - s.a2 * y;
            *x = y;
        }
    }
}

/// Forward-backward filtering over an odd-extended copy of the signal.
///
/// The odd (point-reflected) edge extension suppresses the startup transient
/// of each causal pass, the same strategy scipy's filtfilt uses.
fn filtfilt(data: &[f64], sections: &[Biquad], pad: usize) -> Vec<f64> {
    let n = data.len();
    let pad = pad.min(n.saturating_sub(1));

    let mut extended = Vec::with_capacity(n + 2 * pad);
    for i in (1..=pad).rev() {
        extended.push(2.0 * data[0] - data[i]);
    }
    extended.extend_from_slice(data);
    for i in 1..=pad {
        extended.push(2.0 * data[n - 1] - data[n - 1 - i]);
    }

    run_cascade(&mut extended, sections);
    extended.reverse();
    run_cascade(&mut extended, sections);
    extended.reverse();

    extended[pad..pad + n].to_vec()
}

/// Zero-phase Butterworth filter over the full array.
///
/// Returns the input unchanged for an empty array, zero order, non-positive
/// sample rate, or cutoffs outside `(0, Nyquist)`.
pub fn butterworth(data: &[f64], kind: FilterKind, sample_rate: f64, order: usize) -> Vec<f64> {
    let nyquist = sample_rate / 2.0;
    if data.is_empty() || order == 0 || sample_rate <= 0.0 || !kind_in_domain(kind, nyquist) {
        debug!("butterworth parameters out of domain ({kind:?} at {sample_rate} Hz), passing input through");
        return data.to_vec();
    }

    let sections = butterworth_sections(kind, sample_rate, order);
    // scipy-style pad length for a transfer function of this order.
    let pad = 3 * (order + 1);
    filtfilt(data, &sections, pad)
}

/// Sigma (in samples) whose Gaussian frequency response is -3 dB at
/// `cutoff_freq`: `sigma_time = sqrt(ln 2)/(2*pi*fc) ~= 0.1325/fc`.
fn gaussian_sigma_samples(cutoff_freq: f64, sample_rate: f64) -> f64 {
    0.1325 * sample_rate / cutoff_freq
}

/// Gaussian-kernel lowpass with a -3 dB point at `cutoff_freq`.
///
/// Array boundaries are handled with reflective padding so the convolution
/// does not produce edge artifacts. Non-positive parameters or a cutoff at or
/// above Nyquist return the input unchanged.
pub fn gaussian_lowpass(data: &[f64], cutoff_freq: f64, sample_rate: f64) -> Vec<f64> {
    if cutoff_freq <= 0.0 || sample_rate <= 0.0 || cutoff_freq >= sample_rate / 2.0 {
        return data.to_vec();
    }
    if data.is_empty() {
        return Vec::new();
    }

    let sigma = gaussian_sigma_samples(cutoff_freq, sample_rate);
    let radius = (4.0 * sigma).ceil() as i64;

    let mut kernel = Vec::with_capacity(2 * radius as usize + 1);
    for k in -radius..=radius {
        kernel.push((-0.5 * (k as f64 / sigma).powi(2)).exp());
    }
    let norm: f64 = kernel.iter().sum();

    let n = data.len() as i64;
    let mut out = Vec::with_capacity(data.len());
    for i in 0..n {
        let mut acc = 0.0;
        for (w, k) in kernel.iter().zip(-radius..=radius) {
            acc += w * data[reflect_index(i + k, n)];
        }
        out.push(acc / norm);
    }
    out
}

/// Folds an out-of-range index back into `[0, n)` by edge reflection
/// (`d c b a | a b c d | d c b a`).
fn reflect_index(mut i: i64, n: i64) -> usize {
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// Gaussian lowpass restricted to the half-open sample range `[start_idx, end_idx)`.
///
/// The sub-range is padded with surrounding samples before filtering so the
/// kernel does not see an artificial edge at the cursor positions:
/// `6 * sigma_samples + 10` samples when the normalized cutoff is below 0.5
/// (100 otherwise), capped by the data available on each side. Samples
/// outside the range are returned untouched.
pub fn gaussian_lowpass_between(
    data: &[f64],
    cutoff_freq: f64,
    sample_rate: f64,
    start_idx: usize,
    end_idx: usize,
) -> Vec<f64> {
    let n = data.len();
    if start_idx >= end_idx || end_idx > n {
        return data.to_vec();
    }

    let padding_needed = if sample_rate > 0.0 && cutoff_freq / sample_rate < 0.5 {
        (6.0 * gaussian_sigma_samples(cutoff_freq, sample_rate)) as usize + 10
    } else {
        100
    };
    let padding = padding_needed.min(start_idx).min(n - end_idx);
    let padded_start = start_idx - padding;
    let padded_end = end_idx + padding;

    let filtered = gaussian_lowpass(&data[padded_start..padded_end], cutoff_freq, sample_rate);

    let mut out = data.to_vec();
    out[start_idx..end_idx]
        .copy_from_slice(&filtered[start_idx - padded_start..end_idx - padded_start]);
    out
}
