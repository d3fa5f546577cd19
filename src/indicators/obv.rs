//! On-Balance Volume.

/// Cumulative running total: add volume on a close-over-close increase,
/// subtract on a decrease, hold on an equal close. Returns 0.0 with fewer
/// than two points.
pub fn obv(prices: &[f64], volumes: &[f64]) -> f64 {
    if prices.len() < 2 || volumes.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let n = prices.len().min(volumes.len());
    for i in 1..n {
        if prices[i] > prices[i - 1] {
            total += volumes[i];
        } else if prices[i] < prices[i - 1] {
            total -= volumes[i];
        }
    }
    total
}
