//! Local extremum detection with height / distance / prominence constraints.

use find_peaks::PeakFinder;
use log::debug;
use serde::{Deserialize, Serialize};

/// Which kind of extremum to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Peak,
    Trough,
}

/// Constraints for the extremum search. All bounds are optional.
#[derive(Debug, Clone)]
pub struct PeakDetectionParameters {
    /// Minimum value of a peak (minimum depth of a trough, same sign as the data).
    pub height: Option<f64>,
    /// Minimum separation between reported extrema, in samples.
    pub distance: Option<usize>,
    /// Minimum prominence relative to the neighboring troughs.
    pub prominence: Option<f64>,
    pub polarity: Polarity,
}

impl Default for PeakDetectionParameters {
    fn default() -> Self {
        Self {
            height: None,
            distance: None,
            prominence: None,
            polarity: Polarity::Peak,
        }
    }
}

/// A detected extremum.
///
/// `index` points into the analyzed array; downstream kinetics analysis must
/// be given the same array this index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub index: usize,
    /// `time[index]`, seconds.
    pub time: f64,
    /// `data[index]`, in original (non-negated) units even for troughs.
    pub value: f64,
    /// True for a peak, false for a trough.
    pub is_max: bool,
}

/// Finds peaks or troughs in `data`, in ascending index order.
///
/// Troughs are found by negating the data (and the height bound, since a
/// trough's required depth mirrors a peak's required height) and running the
/// same maxima search; reported values are the original data values.
///
/// No extrema found is an empty result, not an error.
pub fn find_peaks(data: &[f64], time: &[f64], params: &PeakDetectionParameters) -> Vec<Peak> {
    debug_assert_eq!(data.len(), time.len());
    if data.is_empty() {
        return Vec::new();
    }

    let find_max = params.polarity == Polarity::Peak;
    let negated: Vec<f64>;
    let search: &[f64] = if find_max {
        data
    } else {
        negated = data.iter().map(|v| -v).collect();
        &negated
    };

    let mut finder = PeakFinder::new(search);
    if let Some(height) = params.height {
        finder.with_min_height(if find_max { height } else { -height });
    }
    if let Some(prominence) = params.prominence {
        finder.with_min_prominence(prominence);
    }
    if let Some(distance) = params.distance {
        if distance > 0 {
            finder.with_min_distance(distance);
        }
    }

    let mut indices: Vec<usize> = finder
        .find_peaks()
        .iter()
        .map(|p| p.middle_position())
        .collect();
    indices.sort_unstable();

    debug!(
        "found {} {:?} extrema in {} samples",
        indices.len(),
        params.polarity,
        data.len()
    );

    indices
        .into_iter()
        .map(|index| Peak {
            index,
            time: time[index],
            value: data[index],
            is_max: find_max,
        })
        .collect()
}
