//! Contiguous threshold-crossing region detection.

use log::debug;
use serde::{Deserialize, Serialize};
use sweepscope_recording::sweep::effective_sample_rate;

/// Which side of the threshold counts as "inside an event".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Above,
    Below,
}

/// Detects contiguous regions where `data` is strictly beyond `threshold`.
///
/// Region edges come from the first-difference of the boolean mask, so a
/// returned start index is the sample at which the mask transition is seen
/// (the sample before the first in-region sample, unless the region touches
/// the array start). Regions touching either array boundary are kept by
/// treating the boundary as an implicit edge.
///
/// `min_duration` (seconds) is converted to samples using the average sample
/// spacing of the supplied `time` array, not the nominal rate, so the
/// detector behaves consistently on cursor-bounded slices. Regions spanning
/// fewer samples are dropped.
///
/// Returns inclusive `(start_idx, end_idx)` pairs in ascending order.
pub fn detect_events(
    data: &[f64],
    time: &[f64],
    threshold: f64,
    direction: Direction,
    min_duration: f64,
) -> Vec<(usize, usize)> {
    debug_assert_eq!(data.len(), time.len());
    if data.is_empty() {
        return Vec::new();
    }

    let mask: Vec<bool> = match direction {
        Direction::Above => data.iter().map(|&v| v > threshold).collect(),
        Direction::Below => data.iter().map(|&v| v < threshold).collect(),
    };

    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for i in 0..mask.len().saturating_sub(1) {
        match (mask[i], mask[i + 1]) {
            (false, true) => starts.push(i),
            (true, false) => ends.push(i),
            _ => {}
        }
    }
    if mask[0] {
        starts.insert(0, 0);
    }
    if *mask.last().unwrap() {
        ends.push(mask.len() - 1);
    }

    let min_samples = (min_duration * effective_sample_rate(time)) as usize;

    let events: Vec<(usize, usize)> = starts
        .into_iter()
        .zip(ends)
        .filter(|(start, end)| end - start >= min_samples)
        .collect();
    debug!(
        "{} threshold events ({:?} {threshold}) after min-duration filter",
        events.len(),
        direction
    );
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_axis(n: usize, rate: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 / rate).collect()
    }

    #[test]
    fn detects_single_excursion() {
        let mut data = vec![0.0; 100];
        for v in &mut data[40..60] {
            *v = 2.0;
        }
        let time = time_axis(100, 1000.0);
        let events = detect_events(&data, &time, 1.0, Direction::Above, 0.0);
        assert_eq!(events.len(), 1);
        let (start, end) = events[0];
        // Start is the transition sample, end the last in-region sample.
        assert_eq!(start, 39);
        assert_eq!(end, 59);
    }

    #[test]
    fn events_touching_boundaries_are_kept() {
        let mut data = vec![2.0; 100];
        for v in &mut data[30..70] {
            *v = 0.0;
        }
        let time = time_axis(100, 1000.0);
        let events = detect_events(&data, &time, 1.0, Direction::Above, 0.0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, 0);
        assert_eq!(events[1].1, 99);
    }

    #[test]
    fn min_duration_drops_short_events() {
        let mut data = vec![0.0; 1000];
        for v in &mut data[100..105] {
            *v = 2.0; // 5 samples = 0.5 ms at 10 kHz
        }
        for v in &mut data[500..700] {
            *v = 2.0; // 200 samples = 20 ms
        }
        let time = time_axis(1000, 10_000.0);
        let events = detect_events(&data, &time, 1.0, Direction::Above, 0.005);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], (499, 699));
    }

    #[test]
    fn above_and_below_partition_the_excursions() {
        let time = time_axis(400, 1000.0);
        let data: Vec<f64> = (0..400)
            .map(|i| (i as f64 * 0.05).sin() * 2.0)
            .collect();
        let above = detect_events(&data, &time, 0.5, Direction::Above, 0.0);
        let below = detect_events(&data, &time, 0.5, Direction::Below, 0.0);
        assert!(!above.is_empty());
        assert!(!below.is_empty());
        // No sample strictly above the threshold may fall inside a "below" event
        // interior, and vice versa (transition samples at the edges excepted).
        for &(start, end) in &above {
            for &(bs, be) in &below {
                assert!(end <= bs || be <= start);
            }
        }
    }

    #[test]
    fn no_crossings_yields_empty() {
        let data = vec![0.0; 50];
        let time = time_axis(50, 1000.0);
        assert!(detect_events(&data, &time, 1.0, Direction::Above, 0.0).is_empty());
    }

    #[test]
    fn whole_array_inside_event() {
        let data = vec![5.0; 50];
        let time = time_axis(50, 1000.0);
        let events = detect_events(&data, &time, 1.0, Direction::Above, 0.0);
        assert_eq!(events, vec![(0, 49)]);
    }
}
