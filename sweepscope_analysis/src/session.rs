//! Per-channel analysis session state.
//!
//! The detectors themselves are stateless functions, but an interactive
//! caller accumulates state between calls: filters applied so far (filtering
//! is permanent and cumulative until reset), and a baseline display offset.
//! `AnalysisSession` owns that state explicitly so it is passed into each
//! operation instead of living in hidden globals.

use log::debug;
use sweepscope_recording::Sweep;

use crate::filter::{gaussian_lowpass, gaussian_lowpass_between};

/// State accumulated while analyzing one sweep on one channel.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    sweep: Sweep,
    /// Result of all filter applications so far; `None` until the first one.
    filtered: Option<Vec<f64>>,
    baseline_offset: f64,
}

impl AnalysisSession {
    pub fn new(sweep: Sweep) -> Self {
        Self {
            sweep,
            filtered: None,
            baseline_offset: 0.0,
        }
    }

    /// The underlying sweep, unmodified by any session operation.
    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    /// Current working data: the cumulative filter output if any filter has
    /// been applied, the original sweep data otherwise.
    pub fn data(&self) -> &[f64] {
        self.filtered.as_deref().unwrap_or(&self.sweep.data)
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered.is_some()
    }

    pub fn baseline_offset(&self) -> f64 {
        self.baseline_offset
    }

    /// Working data with the baseline offset subtracted, for display or for
    /// detectors that expect a corrected trace.
    pub fn corrected_data(&self) -> Vec<f64> {
        self.data().iter().map(|v| v - self.baseline_offset).collect()
    }

    /// Applies a Gaussian lowpass over the whole sweep, on top of any filters
    /// already applied.
    pub fn apply_gaussian_lowpass(&mut self, cutoff_freq: f64) {
        let filtered = gaussian_lowpass(self.data(), cutoff_freq, self.sweep.sample_rate);
        debug!(
            "gaussian lowpass at {cutoff_freq} Hz on sweep {} (cumulative: {})",
            self.sweep.sweep_number,
            self.is_filtered()
        );
        self.filtered = Some(filtered);
    }

    /// Applies a Gaussian lowpass only between the cursor positions `x1` and
    /// `x2` (seconds, either order). Samples outside the cursor range keep
    /// their current values. A cursor range containing no samples is a no-op.
    pub fn apply_gaussian_lowpass_between(&mut self, cutoff_freq: f64, x1: f64, x2: f64) {
        let Some((start_idx, last_idx)) = self.sweep.index_range(x1, x2) else {
            return;
        };
        let filtered = gaussian_lowpass_between(
            self.data(),
            cutoff_freq,
            self.sweep.sample_rate,
            start_idx,
            last_idx + 1,
        );
        self.filtered = Some(filtered);
    }

    /// Original (unfiltered, uncorrected) data value at the sample nearest
    /// the cursor position, the anchor for cursor-based baseline correction.
    pub fn cursor_baseline(&self, x: f64) -> Option<f64> {
        self.sweep.index_at_time(x).map(|idx| self.sweep.data[idx])
    }

    pub fn set_baseline_offset(&mut self, offset: f64) {
        self.baseline_offset = offset;
    }

    /// Drops all accumulated filters and the baseline offset, returning the
    /// session to the raw sweep.
    pub fn reset(&mut self) {
        self.filtered = None;
        self.baseline_offset = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_sweep() -> Sweep {
        let rate = 10_000.0;
        let data: Vec<f64> = (0..2000)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        Sweep {
            sweep_number: 0,
            channel: 0,
            time: (0..2000).map(|i| i as f64 / rate).collect(),
            data,
            command: None,
            sample_rate: rate,
        }
    }

    fn rms(data: &[f64]) -> f64 {
        (data.iter().map(|v| v * v).sum::<f64>() / data.len() as f64).sqrt()
    }

    #[test]
    fn filtering_is_cumulative_until_reset() {
        let mut session = AnalysisSession::new(noisy_sweep());
        let raw_rms = rms(session.data());
        assert!(!session.is_filtered());

        session.apply_gaussian_lowpass(2000.0);
        let once = rms(session.data());
        assert!(session.is_filtered());
        assert!(once < raw_rms);

        session.apply_gaussian_lowpass(2000.0);
        let twice = rms(session.data());
        assert!(twice < once);

        session.reset();
        assert!(!session.is_filtered());
        assert!((rms(session.data()) - raw_rms).abs() < 1e-12);
    }

    #[test]
    fn session_never_mutates_the_sweep() {
        let sweep = noisy_sweep();
        let original = sweep.data.clone();
        let mut session = AnalysisSession::new(sweep);
        session.apply_gaussian_lowpass(500.0);
        session.set_baseline_offset(0.3);
        assert_eq!(session.sweep().data, original);
    }

    #[test]
    fn cursor_bounded_filter_leaves_outside_samples_untouched() {
        let mut session = AnalysisSession::new(noisy_sweep());
        // Samples inside [0.05 s, 0.10 s] at 10 kHz: indices 500..=1000.
        session.apply_gaussian_lowpass_between(500.0, 0.10, 0.05);
        let data = session.data();
        assert_eq!(&data[..500], &session.sweep().data[..500]);
        assert_eq!(&data[1001..], &session.sweep().data[1001..]);
        assert!(data[600..900].iter().all(|v| v.abs() < 0.05));
    }

    #[test]
    fn cursor_range_without_samples_is_a_no_op() {
        let mut session = AnalysisSession::new(noisy_sweep());
        session.apply_gaussian_lowpass_between(500.0, 5.0, 6.0);
        assert!(!session.is_filtered());
    }

    #[test]
    fn baseline_offset_shifts_corrected_data_only() {
        let mut session = AnalysisSession::new(noisy_sweep());
        let anchor = session.cursor_baseline(0.0).unwrap();
        assert_eq!(anchor, 1.0);
        session.set_baseline_offset(anchor);
        assert_eq!(session.corrected_data()[0], 0.0);
        // Working data stays uncorrected.
        assert_eq!(session.data()[0], 1.0);
    }

    #[test]
    fn cursor_baseline_reads_original_data_even_after_filtering() {
        let mut session = AnalysisSession::new(noisy_sweep());
        session.apply_gaussian_lowpass(100.0);
        // The filtered trace is near zero here, but the anchor is the raw sample.
        assert_eq!(session.cursor_baseline(0.0), Some(1.0));
    }
}
