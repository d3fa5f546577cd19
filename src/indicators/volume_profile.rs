//! Volume profile approximation over recent closes.
//!
//! Buckets the window's close prices into fixed-width bins weighted by
//! volume, takes the heaviest bin as the point of control and expands
//! around it until ~70% of the window's volume is covered (value area).

use serde::{Deserialize, Serialize};

use crate::types::Candle;

const BINS: usize = 24;
const VALUE_AREA_FRACTION: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// Point of control: price with the highest traded volume.
    pub poc: f64,
    #[serde(rename = "valueAreaHigh")]
    pub value_area_high: f64,
    #[serde(rename = "valueAreaLow")]
    pub value_area_low: f64,
}

pub fn volume_profile(candles: &[Candle]) -> VolumeProfile {
    let Some(last) = candles.last() else {
        return VolumeProfile::default();
    };

    let min = candles.iter().map(|c| c.close).fold(f64::MAX, f64::min);
    let max = candles.iter().map(|c| c.close).fold(f64::MIN, f64::max);

    if max == min {
        // Flat window: everything trades at one price.
        return VolumeProfile {
            poc: last.close,
            value_area_high: last.close,
            value_area_low: last.close,
        };
    }

    let bin_width = (max - min) / BINS as f64;
    let mut volumes = [0.0f64; BINS];
    let mut total_volume = 0.0;
    for candle in candles {
        let mut idx = ((candle.close - min) / bin_width) as usize;
        if idx >= BINS {
            idx = BINS - 1;
        }
        volumes[idx] += candle.volume;
        total_volume += candle.volume;
    }

    let poc_idx = volumes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);

    // Expand around the POC, always taking the heavier neighbor, until the
    // value-area fraction is covered.
    let mut lo = poc_idx;
    let mut hi = poc_idx;
    let mut covered = volumes[poc_idx];
    let target = total_volume * VALUE_AREA_FRACTION;
    while covered < target && (lo > 0 || hi < BINS - 1) {
        let below = if lo > 0 { volumes[lo - 1] } else { -1.0 };
        let above = if hi < BINS - 1 { volumes[hi + 1] } else { -1.0 };
        if above >= below {
            hi += 1;
            covered += volumes[hi];
        } else {
            lo -= 1;
            covered += volumes[lo];
        }
    }

    let bin_center = |idx: usize| min + (idx as f64 + 0.5) * bin_width;
    VolumeProfile {
        poc: bin_center(poc_idx),
        value_area_high: min + (hi as f64 + 1.0) * bin_width,
        value_area_low: min + lo as f64 * bin_width,
    }
}
