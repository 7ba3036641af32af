//! Analysis engine for multi-sweep electrophysiology recordings.
//!
//! Every operation is a pure function over the arrays of a
//! [`sweepscope_recording::Sweep`]; the caller sequences them (filter first,
//! then detect on the filtered data) and owns the results. Interactive state
//! that accumulates between calls lives in [`session::AnalysisSession`].

pub mod block;
pub mod events;
pub mod filter;
pub mod kinetics;
pub mod peaks;
pub mod session;
pub mod stats;
pub mod util;

pub use block::{
    detect_blocks, detect_blocks_multiple_sweeps, detect_inserts, BlockDetectionParameters,
    BlockEvent, InsertDetectionParameters, InsertRecord,
};
pub use events::{detect_events, Direction};
pub use filter::{
    butterworth, gaussian_lowpass, gaussian_lowpass_between, FilterKind, DEFAULT_FILTER_ORDER,
};
pub use kinetics::{decay_time, rise_time};
pub use peaks::{find_peaks, Peak, PeakDetectionParameters, Polarity};
pub use session::AnalysisSession;
pub use stats::{
    area_under_curve, baseline_subtract, measure, statistics, Measurement, SummaryStatistics,
};
