//! Band aggregation: reduces a spectrum frame into bass/treble features.
//!
//! The split point and normalization mirror the reference visualizer exactly,
//! including the midpoint index that is counted in both halves (see
//! `split_halves`). Features are recomputed from scratch every tick; nothing
//! here carries state between frames.

use crate::error::{Result, VizError};

/// Per-tick scalar features derived from one spectrum frame.
///
/// Each value is the half's peak or mean magnitude divided by the half's bin
/// count, so typical magnitudes (0..=255 over ~128 bins) land in roughly
/// [0, 2].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandFeatures {
    pub lower_peak_fr: f32,
    pub lower_avg_fr: f32,
    pub upper_peak_fr: f32,
    pub upper_avg_fr: f32,
}

impl BandFeatures {
    /// Aggregate one spectrum frame into band features.
    ///
    /// Frames too short to yield a non-empty lower half are rejected rather
    /// than dividing by zero.
    pub fn from_bins(bins: &[u8]) -> Result<Self> {
        let (lower, upper) = split_halves(bins)?;

        let lower_len = lower.len() as f32;
        let upper_len = upper.len() as f32;

        Ok(Self {
            lower_peak_fr: max(lower) / lower_len,
            lower_avg_fr: avg(lower) / lower_len,
            upper_peak_fr: max(upper) / upper_len,
            upper_avg_fr: avg(upper) / upper_len,
        })
    }
}

/// Split a spectrum frame at the midpoint.
///
/// Lower half covers indices `[0, N/2 - 1)`, upper half `[N/2 - 1, N - 1)`.
/// Index `N/2 - 1` lands in both halves and index `N - 1` in neither; this
/// matches the reference output bit for bit and is kept deliberately.
pub fn split_halves(bins: &[u8]) -> Result<(&[u8], &[u8])> {
    let n = bins.len();
    let mid = (n / 2).saturating_sub(1);
    if mid == 0 {
        return Err(VizError::EmptySpectrum(n));
    }
    Ok((&bins[..mid], &bins[mid..n - 1]))
}

/// Fraction of `val` along `[min_val, max_val]`. Unspecified outside the range.
pub fn fractionate(val: f32, min_val: f32, max_val: f32) -> f32 {
    (val - min_val) / (max_val - min_val)
}

/// Linear rescale of `val` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// No clamping: callers must keep `val` inside the input range if stability
/// matters.
pub fn modulate(val: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let fr = fractionate(val, in_min, in_max);
    out_min + fr * (out_max - out_min)
}

/// Mean magnitude of a non-empty bin slice.
pub fn avg(bins: &[u8]) -> f32 {
    bins.iter().map(|&b| b as f32).sum::<f32>() / bins.len() as f32
}

/// Peak magnitude of a bin slice (0 for an empty slice).
pub fn max(bins: &[u8]) -> f32 {
    bins.iter().copied().max().unwrap_or(0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lengths_and_overlap() {
        let n = 256;
        let bins: Vec<u8> = (0..n).map(|i| (i % 251) as u8).collect();
        let (lower, upper) = split_halves(&bins).unwrap();

        // Lower covers [0, N/2 - 1), upper [N/2 - 1, N - 1).
        assert_eq!(lower.len(), n / 2 - 1);
        assert_eq!(upper.len(), n / 2);

        // Exactly one shared index: N/2 - 1.
        assert_eq!(lower.last(), Some(&bins[n / 2 - 2]));
        assert_eq!(upper.first(), Some(&bins[n / 2 - 1]));

        // Together the halves cover [0, N - 1).
        assert_eq!(lower.len() + upper.len(), n - 1);
        assert_eq!(upper.last(), Some(&bins[n - 2]));
    }

    #[test]
    fn test_split_rejects_degenerate_frames() {
        assert!(matches!(split_halves(&[]), Err(VizError::EmptySpectrum(0))));
        assert!(matches!(
            split_halves(&[42]),
            Err(VizError::EmptySpectrum(1))
        ));
        // A frame whose lower half would be empty is rejected too.
        assert!(matches!(
            split_halves(&[1, 2, 3]),
            Err(VizError::EmptySpectrum(3))
        ));
    }

    #[test]
    fn test_modulate_linearity() {
        assert_eq!(modulate(0.0, 0.0, 1.0, 0.0, 12.0), 0.0);
        assert_eq!(modulate(1.0, 0.0, 1.0, 0.0, 12.0), 12.0);
        assert_eq!(modulate(0.5, 0.0, 1.0, 0.0, 12.0), 6.0);
        assert_eq!(modulate(0.5, 0.0, 1.0, 0.0, 6.0), 3.0);
    }

    #[test]
    fn test_avg_and_max() {
        assert_eq!(avg(&[10, 20, 30]), 20.0);
        assert_eq!(max(&[10, 20, 30]), 30.0);
        assert_eq!(max(&[]), 0.0);
    }

    #[test]
    fn test_features_normalized_by_half_length() {
        // 8 bins: lower = [0..3) -> 3 bins, upper = [3..7) -> 4 bins.
        let bins = [30u8, 60, 90, 100, 100, 100, 100, 255];
        let f = BandFeatures::from_bins(&bins).unwrap();

        assert_eq!(f.lower_peak_fr, 90.0 / 3.0);
        assert_eq!(f.lower_avg_fr, 60.0 / 3.0);
        assert_eq!(f.upper_peak_fr, 100.0 / 4.0);
        assert_eq!(f.upper_avg_fr, 100.0 / 4.0);
    }

    #[test]
    fn test_silent_frame_yields_zero_features() {
        let bins = [0u8; 256];
        let f = BandFeatures::from_bins(&bins).unwrap();
        assert_eq!(f, BandFeatures::default());
    }
}
