use log::warn;
use thiserror::Error;

use crate::sweep::{ProtocolInfo, Sweep};

/// Errors reported by a recording decoder.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("sweep {sweep} out of range (recording has {count} sweeps)")]
    SweepOutOfRange { sweep: usize, count: usize },
    #[error("channel {channel} out of range (recording has {count} channels)")]
    ChannelOutOfRange { channel: usize, count: usize },
    #[error("recording could not be decoded: {0}")]
    Decode(String),
}

/// Interface a file-format decoder must provide to the analysis layer.
///
/// The engine never parses files; it only consumes the decoded per-sweep
/// arrays and the file-level metadata exposed here.
pub trait RecordingSource {
    fn sweep_count(&self) -> usize;

    fn channel_count(&self) -> usize;

    /// Decoded data for one `(sweep_number, channel)` pair.
    fn sweep(&self, sweep_number: usize, channel: usize) -> Result<Sweep, RecordingError>;

    fn protocol_info(&self) -> ProtocolInfo;

    /// All sweeps of one channel, in ascending sweep-number order.
    ///
    /// Sweeps that fail to decode are skipped with a warning rather than
    /// aborting the whole batch.
    fn all_sweeps(&self, channel: usize) -> Vec<Sweep> {
        let mut sweeps = Vec::with_capacity(self.sweep_count());
        for number in 0..self.sweep_count() {
            match self.sweep(number, channel) {
                Ok(sweep) => sweeps.push(sweep),
                Err(err) => warn!("skipping sweep {number}: {err}"),
            }
        }
        sweeps
    }
}

/// In-memory recording backed by caller-supplied waveforms.
///
/// Stands in for a real file decoder in tests and demos: one waveform per
/// `(sweep, channel)` pair, all sharing a uniform time base.
pub struct SyntheticRecording {
    /// `waveforms[sweep][channel]`
    waveforms: Vec<Vec<Vec<f64>>>,
    sample_rate: f64,
    protocol_name: String,
}

impl SyntheticRecording {
    /// Builds a recording from `waveforms[sweep][channel]` sample vectors.
    ///
    /// All sweeps must have the same channel count; channel waveforms within a
    /// sweep must have equal length.
    pub fn new(waveforms: Vec<Vec<Vec<f64>>>, sample_rate: f64) -> Self {
        Self {
            waveforms,
            sample_rate,
            protocol_name: "synthetic".to_owned(),
        }
    }

    /// Convenience constructor for single-channel recordings.
    pub fn single_channel(sweeps: Vec<Vec<f64>>, sample_rate: f64) -> Self {
        Self::new(sweeps.into_iter().map(|s| vec![s]).collect(), sample_rate)
    }
}

impl RecordingSource for SyntheticRecording {
    fn sweep_count(&self) -> usize {
        self.waveforms.len()
    }

    fn channel_count(&self) -> usize {
        self.waveforms.first().map(|s| s.len()).unwrap_or(0)
    }

    fn sweep(&self, sweep_number: usize, channel: usize) -> Result<Sweep, RecordingError> {
        let sweep = self
            .waveforms
            .get(sweep_number)
            .ok_or(RecordingError::SweepOutOfRange {
                sweep: sweep_number,
                count: self.sweep_count(),
            })?;
        let data = sweep
            .get(channel)
            .ok_or(RecordingError::ChannelOutOfRange {
                channel,
                count: self.channel_count(),
            })?;
        let time = (0..data.len())
            .map(|i| i as f64 / self.sample_rate)
            .collect();
        Ok(Sweep {
            sweep_number,
            channel,
            time,
            data: data.clone(),
            command: None,
            sample_rate: self.sample_rate,
        })
    }

    fn protocol_info(&self) -> ProtocolInfo {
        let sweep_length_sec = self
            .waveforms
            .first()
            .and_then(|s| s.first())
            .map(|d| d.len() as f64 / self.sample_rate)
            .unwrap_or(0.0);
        ProtocolInfo {
            name: self.protocol_name.clone(),
            channels: (0..self.channel_count())
                .map(|index| crate::sweep::ChannelInfo {
                    index,
                    adc_units: "pA".to_owned(),
                    dac_units: "mV".to_owned(),
                })
                .collect(),
            sample_rate: self.sample_rate,
            sweep_count: self.sweep_count(),
            sweep_length_sec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_recording_round_trip() {
        let rec = SyntheticRecording::single_channel(
            vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]],
            1000.0,
        );
        assert_eq!(rec.sweep_count(), 2);
        assert_eq!(rec.channel_count(), 1);

        let sweep = rec.sweep(1, 0).unwrap();
        assert_eq!(sweep.sweep_number, 1);
        assert_eq!(sweep.data, vec![3.0, 4.0, 5.0]);
        assert_eq!(sweep.time.len(), sweep.data.len());
    }

    #[test]
    fn out_of_range_requests_are_errors() {
        let rec = SyntheticRecording::single_channel(vec![vec![0.0; 4]], 1000.0);
        assert!(matches!(
            rec.sweep(3, 0),
            Err(RecordingError::SweepOutOfRange { .. })
        ));
        assert!(matches!(
            rec.sweep(0, 2),
            Err(RecordingError::ChannelOutOfRange { .. })
        ));
    }

    #[test]
    fn all_sweeps_preserves_order() {
        let rec = SyntheticRecording::single_channel(
            vec![vec![0.0; 4], vec![1.0; 4], vec![2.0; 4]],
            1000.0,
        );
        let sweeps = rec.all_sweeps(0);
        let numbers: Vec<usize> = sweeps.iter().map(|s| s.sweep_number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }

    #[test]
    fn protocol_info_reflects_shape() {
        let rec = SyntheticRecording::single_channel(vec![vec![0.0; 500]], 1000.0);
        let info = rec.protocol_info();
        assert_eq!(info.sweep_count, 1);
        assert_eq!(info.channels.len(), 1);
        assert!((info.sweep_length_sec - 0.5).abs() < 1e-12);
    }
}
