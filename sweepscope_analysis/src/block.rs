//! Channel-block detection for single-channel current recordings, plus the
//! companion insert detector.
//!
//! A block is a period where the current moves from its resting (baseline)
//! level toward zero, the signature of a transient channel obstruction. The
//! block band is therefore asymmetric and sign-dependent: always between
//! baseline and zero, never past zero.

use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sweepscope_recording::Sweep;

use crate::util;

/// Parameters of the block search.
#[derive(Debug, Clone, Copy)]
pub struct BlockDetectionParameters {
    /// Manual baseline (open-channel) level. When `None` the baseline is
    /// estimated from the data distribution.
    pub baseline: Option<f64>,
    /// Multiplier on the baseline noise when placing the block threshold.
    /// Higher values detect more conservatively.
    pub threshold_factor: f64,
    /// Minimum block duration in seconds.
    pub min_duration: f64,
}

impl Default for BlockDetectionParameters {
    fn default() -> Self {
        Self {
            baseline: None,
            threshold_factor: 2.0,
            min_duration: 0.001,
        }
    }
}

impl BlockDetectionParameters {
    /// Defaults for multi-sweep aggregation, where the larger sample count
    /// warrants a more conservative threshold factor.
    pub fn for_multiple_sweeps() -> Self {
        Self {
            threshold_factor: 3.0,
            ..Self::default()
        }
    }
}

/// One detected block.
///
/// `block_depth` is `|baseline| - |average_amplitude|` and is deliberately
/// not clamped: a deeper-than-baseline excursion is a meaningful signal.
/// `sweep_number`/`channel` are filled in by multi-sweep aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockEvent {
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    /// Inclusive index bounds into the analyzed array.
    pub start_idx: usize,
    pub end_idx: usize,
    /// Mean current over `[start_idx, end_idx]`.
    pub average_amplitude: f64,
    /// Estimated open-channel level for this sweep.
    pub baseline_amplitude: f64,
    pub block_depth: f64,
    pub sweep_number: Option<usize>,
    pub channel: Option<usize>,
}

/// Median of the upper half of the sorted data, a robust "most open level"
/// estimate for a trace that spends most of its time at baseline.
fn estimate_baseline(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    util::percentile_of_sorted(&sorted[sorted.len() / 2..], 50.0)
}

/// Standard deviation of the samples near the baseline level (within 1.5x the
/// overall standard deviation). Falls back to the overall standard deviation
/// when fewer than 10 samples qualify.
fn baseline_noise(data: &[f64], baseline: f64) -> f64 {
    let overall_std = util::std_dev(data);
    let near_baseline: Vec<f64> = data
        .iter()
        .copied()
        .filter(|v| (v - baseline).abs() < overall_std * 1.5)
        .collect();
    if near_baseline.len() < 10 {
        overall_std
    } else {
        util::std_dev(&near_baseline)
    }
}

/// Detects block events in a single trace.
///
/// Returns events in ascending `start_time` order; an empty input or a trace
/// with no excursions yields an empty result.
pub fn detect_blocks(
    data: &[f64],
    time: &[f64],
    params: &BlockDetectionParameters,
) -> Vec<BlockEvent> {
    debug_assert_eq!(data.len(), time.len());
    if data.is_empty() || time.is_empty() {
        return Vec::new();
    }

    let baseline_amplitude = params
        .baseline
        .unwrap_or_else(|| estimate_baseline(data));
    let baseline_std = baseline_noise(data, baseline_amplitude);

    let factor = params.threshold_factor;
    let in_block: Vec<bool> = if baseline_amplitude < 0.0 {
        // Negative baseline: the block band sits between baseline and zero.
        let threshold = (baseline_amplitude + factor * baseline_std).min(0.0);
        data.iter()
            .map(|&v| v > threshold && v < 0.0 && v.abs() < baseline_amplitude.abs())
            .collect()
    } else if baseline_amplitude > 0.0 {
        let threshold = (baseline_amplitude - factor * baseline_std).max(0.0);
        data.iter()
            .map(|&v| v < threshold && v > 0.0 && v.abs() < baseline_amplitude.abs())
            .collect()
    } else {
        // Degenerate zero baseline: look for small deviations only.
        let threshold = factor * baseline_std;
        data.iter().map(|&v| v.abs() < threshold).collect()
    };
    trace!(
        "block band: baseline {baseline_amplitude}, noise {baseline_std}, factor {factor}"
    );

    // Run edges from the first-difference of the mask; the +1 places both
    // edges on the sample after the transition.
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for i in 0..in_block.len().saturating_sub(1) {
        match (in_block[i], in_block[i + 1]) {
            (false, true) => starts.push(i + 1),
            (true, false) => ends.push(i + 1),
            _ => {}
        }
    }
    if in_block[0] {
        starts.insert(0, 0);
    }
    if *in_block.last().unwrap_or(&false) {
        ends.push(data.len() - 1);
    }
    // A run touching only one boundary leaves the lists one edge apart.
    if starts.len() > ends.len() {
        ends.push(data.len() - 1);
    }
    if ends.len() > starts.len() {
        starts.insert(0, 0);
    }

    let sample_rate = if time.len() > 1 {
        time.len() as f64 / (time[time.len() - 1] - time[0])
    } else {
        1.0
    };
    let min_block_samples = (params.min_duration * sample_rate) as usize;

    let blocks: Vec<BlockEvent> = starts
        .into_iter()
        .zip(ends)
        .filter(|(start, end)| end - start >= min_block_samples)
        .map(|(start_idx, end_idx)| {
            let average_amplitude = util::mean(&data[start_idx..=end_idx]);
            BlockEvent {
                start_time: time[start_idx],
                end_time: time[end_idx],
                duration: time[end_idx] - time[start_idx],
                start_idx,
                end_idx,
                average_amplitude,
                baseline_amplitude,
                block_depth: baseline_amplitude.abs() - average_amplitude.abs(),
                sweep_number: None,
                channel: None,
            }
        })
        .collect();
    debug!("{} block events over {} samples", blocks.len(), data.len());
    blocks
}

/// Detects block events independently in each sweep and tags the results with
/// their sweep and channel.
///
/// Sweeps are analytically independent, so the per-sweep searches run in
/// parallel; the combined result is re-sorted by ascending sweep number so
/// the output ordering is deterministic.
pub fn detect_blocks_multiple_sweeps(
    sweeps: &[Sweep],
    params: &BlockDetectionParameters,
) -> Vec<BlockEvent> {
    let mut all_blocks: Vec<BlockEvent> = sweeps
        .par_iter()
        .flat_map_iter(|sweep| {
            detect_blocks(&sweep.data, &sweep.time, params)
                .into_iter()
                .map(|block| BlockEvent {
                    sweep_number: Some(sweep.sweep_number),
                    channel: Some(sweep.channel),
                    ..block
                })
                .collect::<Vec<_>>()
        })
        .collect();
    all_blocks.sort_by_key(|block| block.sweep_number);
    all_blocks
}

/// Parameters of the insert search. Windows are fractions of the sweep length.
#[derive(Debug, Clone, Copy)]
pub struct InsertDetectionParameters {
    pub baseline_window: (f64, f64),
    pub response_window: (f64, f64),
    /// Multiplier on the baseline noise in the deviation threshold.
    pub threshold_factor: f64,
}

impl Default for InsertDetectionParameters {
    fn default() -> Self {
        Self {
            baseline_window: (0.0, 0.1),
            response_window: (0.1, 0.2),
            threshold_factor: 3.0,
        }
    }
}

/// One sweep whose response window deviates significantly from its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsertRecord {
    /// Position of the sweep in the analyzed list.
    pub sweep: usize,
    pub baseline_mean: f64,
    pub baseline_std: f64,
    pub response_mean: f64,
    pub response_max: f64,
    pub response_min: f64,
    /// Largest absolute deviation of the response extremes from the baseline mean.
    pub deviation: f64,
}

fn fractional_window(fraction: (f64, f64), len: usize) -> (usize, usize) {
    let start = ((fraction.0 * len as f64) as usize).min(len);
    let end = ((fraction.1 * len as f64) as usize).min(len);
    (start, end)
}

/// Flags sweeps whose response window deviates from the baseline window by
/// more than `|baseline_mean| + factor * baseline_std`.
///
/// Sweeps whose window bounds collapse to zero width are skipped, not flagged.
pub fn detect_inserts(
    sweeps: &[Sweep],
    params: &InsertDetectionParameters,
) -> Vec<InsertRecord> {
    let mut inserts = Vec::new();
    for (i, sweep) in sweeps.iter().enumerate() {
        let (base_start, base_end) = fractional_window(params.baseline_window, sweep.len());
        let (resp_start, resp_end) = fractional_window(params.response_window, sweep.len());
        if base_end <= base_start || resp_end <= resp_start {
            continue;
        }

        let baseline_data = &sweep.data[base_start..base_end];
        let baseline_mean = util::mean(baseline_data);
        let baseline_std = util::std_dev(baseline_data);

        let response_data = &sweep.data[resp_start..resp_end];
        let response_max = util::max(response_data);
        let response_min = util::min(response_data);

        let threshold = baseline_mean.abs() + params.threshold_factor * baseline_std;
        let deviation = (response_max - baseline_mean)
            .abs()
            .max((response_min - baseline_mean).abs());

        if deviation > threshold {
            inserts.push(InsertRecord {
                sweep: i,
                baseline_mean,
                baseline_std,
                response_mean: util::mean(response_data),
                response_max,
                response_min,
                deviation,
            });
        }
    }
    debug!("{} inserts flagged in {} sweeps", inserts.len(), sweeps.len());
    inserts
}
