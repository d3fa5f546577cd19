//! Classic floor-trader pivot points.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PivotPoints {
    pub p: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

/// Pivot set from a window's high, low and close:
/// `p = (h + l + c) / 3`, `r1 = 2p - l`, `s1 = 2p - h`,
/// `r2/s2 = p ± (r1 - s1)`, `r3 = h + 2(p - l)`, `s3 = l - 2(h - p)`.
pub fn pivot_points(high: f64, low: f64, close: f64) -> PivotPoints {
    let p = (high + low + close) / 3.0;
    let r1 = 2.0 * p - low;
    let s1 = 2.0 * p - high;
    PivotPoints {
        p,
        r1,
        r2: p + (r1 - s1),
        r3: high + 2.0 * (p - low),
        s1,
        s2: p - (r1 - s1),
        s3: low - 2.0 * (high - p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn symmetric_bar_centers_pivot() {
        let pp = pivot_points(110.0, 90.0, 100.0);
        assert_approx(pp.p, 100.0, 1e-12);
        assert_approx(pp.r1, 110.0, 1e-12);
        assert_approx(pp.s1, 90.0, 1e-12);
    }

    #[test]
    fn levels_are_ordered() {
        let pp = pivot_points(112.0, 95.0, 104.0);
        assert!(pp.r3 > pp.r2);
        assert!(pp.r2 > pp.r1);
        assert!(pp.r1 > pp.p);
        assert!(pp.p > pp.s1);
        assert!(pp.s1 > pp.s2);
        assert!(pp.s2 > pp.s3);
    }
}
