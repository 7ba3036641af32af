use serde::{Deserialize, Serialize};

/// One contiguous acquisition sweep for one channel.
///
/// `time` and `data` share indexing and length; `time` is monotonically
/// non-decreasing. Sweeps are value records: analysis operations never mutate
/// them and return fresh arrays instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sweep {
    /// Stable identity of the sweep within its recording.
    pub sweep_number: usize,
    /// Channel index the data was acquired on.
    pub channel: usize,
    /// Sample times in seconds, strictly increasing.
    pub time: Vec<f64>,
    /// Recorded signal, same indexing as `time`.
    pub data: Vec<f64>,
    /// Stimulus (command) waveform, if the protocol defines one.
    pub command: Option<Vec<f64>>,
    /// Nominal acquisition rate in Hz.
    pub sample_rate: f64,
}

impl Sweep {
    /// Number of samples in the sweep.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total sweep duration in seconds, 0 for sweeps with fewer than two samples.
    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) if self.time.len() > 1 => last - first,
            _ => 0.0,
        }
    }

    /// Sample rate derived from the time array rather than the file header.
    ///
    /// Robust to sub-range slices whose effective spacing differs from the
    /// nominal rate. Falls back to 1 Hz for degenerate (single-sample) arrays.
    pub fn effective_sample_rate(&self) -> f64 {
        effective_sample_rate(&self.time)
    }

    /// Index of the sample whose time is nearest to `t`, or `None` for an
    /// empty sweep. Used for cursor-anchored lookups.
    pub fn index_at_time(&self, t: f64) -> Option<usize> {
        if self.time.is_empty() {
            return None;
        }
        let mut best = 0;
        let mut best_diff = f64::INFINITY;
        for (i, &ti) in self.time.iter().enumerate() {
            let diff = (ti - t).abs();
            if diff < best_diff {
                best_diff = diff;
                best = i;
            }
        }
        Some(best)
    }

    /// Inclusive index bounds of the samples falling inside a cursor-selected
    /// time range. The bounds are normalized (`x1 > x2` is accepted) and the
    /// result is `None` when no sample lies inside the range.
    pub fn index_range(&self, x1: f64, x2: f64) -> Option<(usize, usize)> {
        let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let mut first = None;
        let mut last = None;
        for (i, &t) in self.time.iter().enumerate() {
            if t >= lo && t <= hi {
                if first.is_none() {
                    first = Some(i);
                }
                last = Some(i);
            }
        }
        Some((first?, last?))
    }
}

/// Sample rate implied by a time array: `len / (t_last - t_first)`.
///
/// Treated as 1 Hz when the array has fewer than two samples or zero span.
pub fn effective_sample_rate(time: &[f64]) -> f64 {
    if time.len() > 1 {
        let span = time[time.len() - 1] - time[0];
        if span > 0.0 {
            return time.len() as f64 / span;
        }
    }
    1.0
}

/// Per-channel metadata reported by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub index: usize,
    /// Unit string of the recorded (ADC) signal, e.g. "pA".
    pub adc_units: String,
    /// Unit string of the command (DAC) waveform, e.g. "mV".
    pub dac_units: String,
}

/// File-level protocol metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolInfo {
    pub name: String,
    pub channels: Vec<ChannelInfo>,
    pub sample_rate: f64,
    pub sweep_count: usize,
    pub sweep_length_sec: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_sweep(n: usize, rate: f64) -> Sweep {
        Sweep {
            sweep_number: 0,
            channel: 0,
            time: (0..n).map(|i| i as f64 / rate).collect(),
            data: (0..n).map(|i| i as f64).collect(),
            command: None,
            sample_rate: rate,
        }
    }

    #[test]
    fn effective_rate_matches_nominal_for_uniform_spacing() {
        let sweep = ramp_sweep(1000, 10_000.0);
        // len/(t_last - t_first) overestimates by n/(n-1); just check ballpark
        let rate = sweep.effective_sample_rate();
        assert!((rate - 10_000.0).abs() / 10_000.0 < 0.01);
    }

    #[test]
    fn effective_rate_degenerate_arrays() {
        assert_eq!(effective_sample_rate(&[]), 1.0);
        assert_eq!(effective_sample_rate(&[0.5]), 1.0);
        assert_eq!(effective_sample_rate(&[0.5, 0.5]), 1.0);
    }

    #[test]
    fn index_range_normalizes_cursor_order() {
        let sweep = ramp_sweep(100, 100.0);
        let fwd = sweep.index_range(0.1, 0.5).unwrap();
        let rev = sweep.index_range(0.5, 0.1).unwrap();
        assert_eq!(fwd, rev);
        assert_eq!(fwd, (10, 50));
    }

    #[test]
    fn index_range_outside_data_is_none() {
        let sweep = ramp_sweep(100, 100.0);
        assert!(sweep.index_range(5.0, 6.0).is_none());
    }

    #[test]
    fn index_at_time_picks_nearest_sample() {
        let sweep = ramp_sweep(100, 100.0);
        assert_eq!(sweep.index_at_time(0.204), Some(20));
        assert_eq!(sweep.index_at_time(-1.0), Some(0));
        assert_eq!(sweep.index_at_time(10.0), Some(99));
    }
}
