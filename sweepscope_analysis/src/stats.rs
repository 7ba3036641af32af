//! Descriptive statistics and cursor measurements over an array segment.

use serde::{Deserialize, Serialize};

use crate::util;

/// Descriptive statistics of one array segment.
///
/// `std` and `variance` are population statistics; `range = max - min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q25: f64,
    pub q75: f64,
    pub range: f64,
    pub variance: f64,
}

/// Statistics over a non-empty segment.
///
/// Empty input is a caller error (the cursor selection always contains at
/// least one sample); the result is NaN-filled in release builds.
pub fn statistics(data: &[f64]) -> SummaryStatistics {
    debug_assert!(!data.is_empty(), "statistics over an empty segment");

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let min = util::min(data);
    let max = util::max(data);
    SummaryStatistics {
        mean: util::mean(data),
        std: util::std_dev(data),
        min,
        max,
        median: util::percentile_of_sorted(&sorted, 50.0),
        q25: util::percentile_of_sorted(&sorted, 25.0),
        q75: util::percentile_of_sorted(&sorted, 75.0),
        range: max - min,
        variance: util::variance(data),
    }
}

/// Two cursor points with their derived deltas and slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub delta_x: f64,
    pub delta_y: f64,
    /// `delta_y / delta_x`; 0 for coincident x positions (not an error).
    pub slope: f64,
}

/// Measurement between two cursor points.
pub fn measure(x1: f64, y1: f64, x2: f64, y2: f64) -> Measurement {
    let delta_x = x2 - x1;
    let delta_y = y2 - y1;
    let slope = if delta_x != 0.0 { delta_y / delta_x } else { 0.0 };
    Measurement {
        x1,
        y1,
        x2,
        y2,
        delta_x,
        delta_y,
        slope,
    }
}

/// Trapezoidal integral of `data` over `time`, restricted to an optional
/// half-open index range `[start, end)`.
pub fn area_under_curve(
    data: &[f64],
    time: &[f64],
    range: Option<(usize, usize)>,
) -> f64 {
    debug_assert_eq!(data.len(), time.len());
    let (start, end) = range.unwrap_or((0, data.len()));
    let end = end.min(data.len());
    if start + 1 >= end {
        return 0.0;
    }
    let mut area = 0.0;
    for i in start..end - 1 {
        area += 0.5 * (data[i + 1] + data[i]) * (time[i + 1] - time[i]);
    }
    area
}

/// Returns `data` with the mean of `[start, end)` subtracted.
pub fn baseline_subtract(data: &[f64], start: usize, end: Option<usize>) -> Vec<f64> {
    let end = end.unwrap_or(data.len()).min(data.len());
    if start >= end {
        return data.to_vec();
    }
    let baseline = util::mean(&data[start..end]);
    data.iter().map(|v| v - baseline).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_basic_fields() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = statistics(&data);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.median - 3.0).abs() < 1e-12);
        assert!((stats.min - 1.0).abs() < 1e-12);
        assert!((stats.max - 5.0).abs() < 1e-12);
        assert!((stats.range - 4.0).abs() < 1e-12);
        assert!((stats.variance - 2.0).abs() < 1e-12);
        assert!((stats.q25 - 2.0).abs() < 1e-12);
        assert!((stats.q75 - 4.0).abs() < 1e-12);
    }

    #[test]
    fn constant_shift_moves_mean_only() {
        let data = [0.3, -1.2, 2.5, 0.9, -0.4];
        let shifted: Vec<f64> = data.iter().map(|v| v + 7.5).collect();
        let a = statistics(&data);
        let b = statistics(&shifted);
        assert!((b.mean - (a.mean + 7.5)).abs() < 1e-12);
        assert!((b.std - a.std).abs() < 1e-12);
        assert!((b.variance - a.variance).abs() < 1e-12);
        assert!((b.range - a.range).abs() < 1e-12);
    }

    #[test]
    fn measurement_slope_and_degenerate_dx() {
        let m = measure(1.0, 2.0, 3.0, 6.0);
        assert!((m.delta_x - 2.0).abs() < 1e-12);
        assert!((m.delta_y - 4.0).abs() < 1e-12);
        assert!((m.slope - 2.0).abs() < 1e-12);

        let vertical = measure(1.0, 2.0, 1.0, 5.0);
        assert_eq!(vertical.slope, 0.0);
    }

    #[test]
    fn trapezoid_area_of_constant_signal() {
        let time: Vec<f64> = (0..101).map(|i| i as f64 * 0.01).collect();
        let data = vec![2.0; 101];
        let area = area_under_curve(&data, &time, None);
        assert!((area - 2.0).abs() < 1e-9);

        // Restricting to half the samples halves the area.
        let half = area_under_curve(&data, &time, Some((0, 51)));
        assert!((half - 1.0).abs() < 1e-9);
    }

    #[test]
    fn baseline_subtract_zeroes_the_window_mean() {
        let data = [5.0, 5.0, 5.0, 9.0, 9.0];
        let corrected = baseline_subtract(&data, 0, Some(3));
        assert_eq!(corrected, vec![0.0, 0.0, 0.0, 4.0, 4.0]);
    }

    #[test]
    fn baseline_subtract_degenerate_window_is_identity() {
        let data = [1.0, 2.0];
        assert_eq!(baseline_subtract(&data, 2, Some(2)), data.to_vec());
    }
}
