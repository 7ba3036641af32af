//! Rise and decay kinetics anchored to a detected peak.
//!
//! Both estimators return `None` (never zero, never a panic) when the peak
//! sits at an array boundary or the requested crossing does not exist; a
//! missing measurement must stay distinguishable from a zero one.

use crate::util;

/// 10-90%-style rise time from baseline to the sample at `peak_idx`.
///
/// The baseline level is the `baseline_pct` percentile of the data before the
/// peak. Both target levels are linear interpolations between baseline and
/// peak value. Of all upward crossings of each target on `data[..=peak_idx]`,
/// the one nearest the peak is used, which keeps noisy multi-crossing rising
/// edges from inflating the estimate.
pub fn rise_time(
    data: &[f64],
    time: &[f64],
    peak_idx: usize,
    baseline_pct: f64,
    peak_pct: f64,
) -> Option<f64> {
    debug_assert_eq!(data.len(), time.len());
    if peak_idx == 0 || peak_idx + 1 >= data.len() {
        return None;
    }

    let baseline = util::percentile(&data[..peak_idx], baseline_pct);
    let peak_value = data[peak_idx];
    let target_low = baseline + (peak_value - baseline) * (baseline_pct / 100.0);
    let target_high = baseline + (peak_value - baseline) * (peak_pct / 100.0);

    let rising = &data[..=peak_idx];
    let low_idx = last_upward_crossing(rising, target_low)?;
    let high_idx = last_upward_crossing(rising, target_high)?;
    if high_idx > low_idx {
        Some(time[high_idx] - time[low_idx])
    } else {
        None
    }
}

/// Index of the last sample after which the signal rises through `target`
/// (the sample before the crossing).
fn last_upward_crossing(data: &[f64], target: f64) -> Option<usize> {
    (0..data.len().saturating_sub(1))
        .rev()
        .find(|&i| data[i] < target && data[i + 1] >= target)
}

/// Time from the peak to the first sample below `peak_value * (1 - decay_pct/100)`.
///
/// `decay_pct = 63.2` targets the 1/e point (tau); 50 gives the half-life.
/// `None` when the decay never reaches the target within the array.
pub fn decay_time(data: &[f64], time: &[f64], peak_idx: usize, decay_pct: f64) -> Option<f64> {
    debug_assert_eq!(data.len(), time.len());
    if peak_idx == 0 || peak_idx + 1 >= data.len() {
        return None;
    }

    let peak_value = data[peak_idx];
    let target = peak_value * (1.0 - decay_pct / 100.0);
    let crossing = (peak_idx..data.len()).find(|&i| data[i] < target)?;
    Some(time[crossing] - time[peak_idx])
}
