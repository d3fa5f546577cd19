//! Trade parameter derivation.
//!
//! Entry band, stop and targets from the current price and ATR. All
//! price arithmetic is signed by direction, so long and short share one
//! code path. Results are validated for ordering; a failed validation
//! (or non-positive inputs) drops to a pure percentage fallback that is
//! always internally consistent.

use tracing::debug;

use crate::config::TradeConfig;
use crate::types::{Direction, SymbolSpec};

use super::snapshot::{CalcRecord, RiskReward, TradeParameters};

/// Derive trade parameters for `direction` at `price`.
///
/// `prior_rr` supplies the R multiples, clamped into the configured
/// ranges. Appends one record per stage to `log`.
pub fn compute_trade_parameters(
    direction: Direction,
    price: f64,
    atr: f64,
    prior_rr: RiskReward,
    cfg: &TradeConfig,
    spec: &SymbolSpec,
    log: &mut Vec<CalcRecord>,
) -> TradeParameters {
    let s = direction.sign();

    if price <= 0.0 || !price.is_finite() || !atr.is_finite() || atr < 0.0 {
        log.push(CalcRecord::new(
            "trade.fallback",
            price,
            "invalid price or atr input",
        ));
        return percentage_fallback(direction, price.max(0.0), prior_rr, cfg, spec, log);
    }

    // Entry band: pulled back against the direction by `entry_pull_atr`
    // ATRs, pushed with it by `entry_push_atr`.
    let (below, above) = match direction {
        Direction::Long => (cfg.entry_pull_atr, cfg.entry_push_atr),
        Direction::Short => (cfg.entry_push_atr, cfg.entry_pull_atr),
    };
    let entry_low = spec.round(price - below * atr);
    let entry_high = spec.round(price + above * atr);
    let entry = (entry_low + entry_high) / 2.0;
    log.push(CalcRecord::new("trade.entry", entry, "atr entry band midpoint"));

    // Two stop candidates; keep whichever risks less (closer to entry).
    // A zero-ATR stop would sit on the entry itself, so it only
    // qualifies with a real distance.
    let atr_risk = cfg.stop_atr_mult * atr;
    let atr_stop = entry - s * atr_risk;
    let pct_stop = entry * (1.0 - s * cfg.max_risk_pct);
    let stop = if atr_risk > 0.0 && atr_risk <= (entry - pct_stop).abs() {
        log.push(CalcRecord::new("trade.stop", atr_stop, "atr stop tighter"));
        atr_stop
    } else {
        log.push(CalcRecord::new("trade.stop", pct_stop, "pct stop tighter"));
        pct_stop
    };
    let stop = spec.round(stop);

    let risk = (entry - stop).abs();
    let r1 = prior_rr.r1.clamp(cfg.r1_range.0, cfg.r1_range.1);
    let r2 = prior_rr.r2.clamp(cfg.r2_range.0, cfg.r2_range.1);
    let tp1 = spec.round(entry + s * risk * r1);
    let tp2 = spec.round(entry + s * risk * r2);
    log.push(CalcRecord::new("trade.tp1", tp1, format!("r1 = {r1}")));
    log.push(CalcRecord::new("trade.tp2", tp2, format!("r2 = {r2}")));

    let params = TradeParameters {
        entry_range_low: entry_low,
        entry_range_high: entry_high,
        stop_loss: stop,
        take_profit_one: tp1,
        take_profit_two: tp2,
        risk_reward: RiskReward { r1, r2 },
        fallback: false,
    };

    if !valid(direction, entry, &params) {
        debug!(
            symbol = %spec.symbol,
            %direction,
            "derived trade parameters failed ordering, using fallback"
        );
        log.push(CalcRecord::new(
            "trade.fallback",
            price,
            "ordering validation failed",
        ));
        return percentage_fallback(direction, price, prior_rr, cfg, spec, log);
    }

    params
}

/// Ordering checks, signed by direction: stop on the far side of entry,
/// targets strictly progressing with the trade.
fn valid(direction: Direction, entry: f64, p: &TradeParameters) -> bool {
    let s = direction.sign();
    p.entry_range_low <= p.entry_range_high
        && s * (entry - p.stop_loss) > 0.0
        && s * (p.take_profit_one - entry) > 0.0
        && s * (p.take_profit_two - p.take_profit_one) > 0.0
}

/// Percentage-of-price fallback, always self-consistent.
fn percentage_fallback(
    direction: Direction,
    price: f64,
    prior_rr: RiskReward,
    cfg: &TradeConfig,
    spec: &SymbolSpec,
    log: &mut Vec<CalcRecord>,
) -> TradeParameters {
    let s = direction.sign();
    let r1 = prior_rr.r1.clamp(cfg.r1_range.0, cfg.r1_range.1);
    let r2 = prior_rr.r2.clamp(cfg.r2_range.0, cfg.r2_range.1);
    let params = TradeParameters {
        entry_range_low: spec.round(price * (1.0 - cfg.fallback_entry_pct)),
        entry_range_high: spec.round(price * (1.0 + cfg.fallback_entry_pct)),
        stop_loss: spec.round(price * (1.0 - s * cfg.fallback_stop_pct)),
        take_profit_one: spec.round(price * (1.0 + s * cfg.fallback_tp1_pct)),
        take_profit_two: spec.round(price * (1.0 + s * cfg.fallback_tp2_pct)),
        risk_reward: RiskReward { r1, r2 },
        fallback: true,
    };
    log.push(CalcRecord::new(
        "trade.fallback.stop",
        params.stop_loss,
        "percentage of price",
    ));
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> SymbolSpec {
        SymbolSpec::new("BTCUSDT", "Bitcoin", 2)
    }

    #[test]
    fn long_parameters_are_ordered() {
        let mut log = Vec::new();
        let p = compute_trade_parameters(
            Direction::Long,
            50_000.0,
            500.0,
            RiskReward::default(),
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        assert!(!p.fallback);
        assert!(p.entry_range_low < p.entry_range_high);
        let entry = (p.entry_range_low + p.entry_range_high) / 2.0;
        assert!(p.stop_loss < entry);
        assert!(p.take_profit_one > entry);
        assert!(p.take_profit_two > p.take_profit_one);
        assert!(!log.is_empty());
    }

    #[test]
    fn short_parameters_mirror_long() {
        let mut log = Vec::new();
        let long = compute_trade_parameters(
            Direction::Long,
            50_000.0,
            500.0,
            RiskReward::default(),
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        let short = compute_trade_parameters(
            Direction::Short,
            50_000.0,
            500.0,
            RiskReward::default(),
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        // Band widths match; stop and targets sit on opposite sides.
        let long_width = long.entry_range_high - long.entry_range_low;
        let short_width = short.entry_range_high - short.entry_range_low;
        assert!((long_width - short_width).abs() < 1e-9);
        let entry = (short.entry_range_low + short.entry_range_high) / 2.0;
        assert!(short.stop_loss > entry);
        assert!(short.take_profit_one < entry);
        assert!(short.take_profit_two < short.take_profit_one);
    }

    #[test]
    fn atr_stop_used_when_tighter_than_pct_stop() {
        // 1.5 * 100 = 150 risk vs 5% of ~10_000 = 500: ATR stop wins.
        let mut log = Vec::new();
        let p = compute_trade_parameters(
            Direction::Long,
            10_000.0,
            100.0,
            RiskReward::default(),
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        let entry = (p.entry_range_low + p.entry_range_high) / 2.0;
        assert!((entry - p.stop_loss - 150.0).abs() < 1.0);
    }

    #[test]
    fn pct_stop_caps_wide_atr() {
        // 1.5 * 600 = 900 risk vs 5% of ~10_000 = 500: pct stop wins.
        let mut log = Vec::new();
        let p = compute_trade_parameters(
            Direction::Long,
            10_000.0,
            600.0,
            RiskReward::default(),
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        let entry = (p.entry_range_low + p.entry_range_high) / 2.0;
        let risk = entry - p.stop_loss;
        assert!((risk - entry * 0.05).abs() < 1.0, "risk = {risk}");
    }

    #[test]
    fn r_multiples_are_clamped() {
        let mut log = Vec::new();
        let p = compute_trade_parameters(
            Direction::Long,
            50_000.0,
            500.0,
            RiskReward { r1: 10.0, r2: 0.1 },
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        assert_eq!(p.risk_reward.r1, 2.0);
        assert_eq!(p.risk_reward.r2, 2.5);
    }

    #[test]
    fn zero_price_falls_back() {
        let mut log = Vec::new();
        let p = compute_trade_parameters(
            Direction::Long,
            0.0,
            10.0,
            RiskReward::default(),
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        assert!(p.fallback);
        assert!(log.iter().any(|r| r.stage == "trade.fallback"));
    }

    #[test]
    fn fallback_percentages_match_policy() {
        let mut log = Vec::new();
        let p = percentage_fallback(
            Direction::Long,
            1000.0,
            RiskReward::default(),
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        assert_eq!(p.entry_range_low, 995.0);
        assert_eq!(p.entry_range_high, 1005.0);
        assert_eq!(p.stop_loss, 950.0);
        assert_eq!(p.take_profit_one, 1075.0);
        assert_eq!(p.take_profit_two, 1150.0);
    }

    #[test]
    fn zero_atr_collapses_entry_band_but_stays_valid() {
        let mut log = Vec::new();
        let p = compute_trade_parameters(
            Direction::Long,
            1000.0,
            0.0,
            RiskReward::default(),
            &TradeConfig::default(),
            &btc(),
            &mut log,
        );
        assert!(!p.fallback);
        assert_eq!(p.entry_range_low, p.entry_range_high);
        // ATR stop degenerates, so the percentage stop takes over.
        assert_eq!(p.stop_loss, 950.0);
    }
}
