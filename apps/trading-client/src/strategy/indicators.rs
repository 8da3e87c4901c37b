//! Technical indicator math.
//!
//! Indicator scores are heuristics, not ledger arithmetic, so everything
//! here works on `f64` closing prices; money stays in `Decimal` elsewhere.
//! Short inputs degrade to neutral values rather than erroring, matching
//! how the scoring layer treats missing context.

/// Simple moving average over the last `period` values.
///
/// Falls back to the last value when fewer than `period` are available.
#[must_use]
pub fn sma(prices: &[f64], period: usize) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    if prices.len() < period || period == 0 {
        return prices[prices.len() - 1];
    }
    let window = &prices[prices.len() - period..];
    window.iter().sum::<f64>() / period as f64
}

/// Relative Strength Index over `period` deltas.
///
/// Returns the neutral 50 when there is not enough history, and 100 when
/// there are no losing days in the window.
#[must_use]
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len() - period..];

    let avg_gain = recent.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss = -recent.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Bollinger bands: `(upper, middle, lower)`.
///
/// Uses the population standard deviation over the window. Degrades to a
/// zero-width band at the last price on short input.
#[must_use]
pub fn bollinger_bands(prices: &[f64], period: usize, num_std: f64) -> (f64, f64, f64) {
    if prices.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    if prices.len() < period || period == 0 {
        let last = prices[prices.len() - 1];
        return (last, last, last);
    }

    let window = &prices[prices.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|p| (p - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    (middle + num_std * std_dev, middle, middle - num_std * std_dev)
}

/// Percent change between the last price and the price `days` ago.
#[must_use]
pub fn percent_change(prices: &[f64], days: usize) -> f64 {
    if prices.len() < days + 1 {
        return 0.0;
    }
    let past = prices[prices.len() - 1 - days];
    if past == 0.0 {
        return 0.0;
    }
    (prices[prices.len() - 1] - past) / past * 100.0
}

/// Latest volume relative to the average of the trailing window.
#[must_use]
pub fn volume_ratio(volumes: &[f64], period: usize) -> f64 {
    if volumes.is_empty() {
        return 1.0;
    }
    let last = volumes[volumes.len() - 1];
    let avg = if volumes.len() >= period && period > 0 {
        volumes[volumes.len() - period..].iter().sum::<f64>() / period as f64
    } else {
        last
    };
    if avg > 0.0 { last / avg } else { 1.0 }
}

/// Where the last price sits in the trailing high/low range, 0..1.
///
/// 0.5 when the range is degenerate.
#[must_use]
pub fn position_in_range(highs: &[f64], lows: &[f64], last_price: f64, period: usize) -> f64 {
    let high = if highs.len() >= period && period > 0 {
        highs[highs.len() - period..]
            .iter()
            .copied()
            .fold(f64::MIN, f64::max)
    } else {
        last_price
    };
    let low = if lows.len() >= period && period > 0 {
        lows[lows.len() - period..]
            .iter()
            .copied()
            .fold(f64::MAX, f64::min)
    } else {
        last_price
    };

    let range = high - low;
    if range > 0.0 {
        (last_price - low) / range
    } else {
        0.5
    }
}

/// Trend strength on a 0..1 scale from a least-squares slope.
///
/// 0.5 is trendless; values above favor an uptrend.
#[must_use]
pub fn trend_strength(prices: &[f64]) -> f64 {
    if prices.len() < 10 {
        return 0.5;
    }

    let n = prices.len() as f64;
    let sum_x: f64 = (0..prices.len()).map(|i| i as f64).sum();
    let sum_y: f64 = prices.iter().sum();
    let sum_xy: f64 = prices.iter().enumerate().map(|(i, p)| i as f64 * p).sum();
    let sum_x2: f64 = (0..prices.len()).map(|i| (i as f64).powi(2)).sum();

    let denom = n * sum_x2 - sum_x.powi(2);
    if denom == 0.0 {
        return 0.5;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;

    let min = prices.iter().copied().fold(f64::MAX, f64::min);
    let max = prices.iter().copied().fold(f64::MIN, f64::max);
    let max_price_change = (max - min) / n;
    if max_price_change == 0.0 {
        return 0.5;
    }

    let normalized = slope / max_price_change;
    ((normalized + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_averages_trailing_window() {
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((sma(&prices, 3) - 4.0).abs() < 1e-9);
        assert!((sma(&prices, 5) - 3.0).abs() < 1e-9);
        // Short input: last value.
        assert!((sma(&prices, 10) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_is_neutral_on_short_input() {
        assert!((rsi(&[100.0, 101.0], 14) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_is_100_with_no_losses() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i)).collect();
        assert!((rsi(&prices, 14) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_balanced_moves_sit_near_midline() {
        // Alternating +1/-1 moves: equal average gain and loss -> RSI 50.
        let mut prices = vec![100.0];
        for i in 0..20 {
            let last = *prices.last().unwrap();
            prices.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        let value = rsi(&prices, 14);
        assert!((value - 50.0).abs() < 5.0, "rsi {value}");
    }

    #[test]
    fn bollinger_bands_are_symmetric() {
        let prices: Vec<f64> = (0..25).map(|i| 100.0 + f64::from(i % 5)).collect();
        let (upper, middle, lower) = bollinger_bands(&prices, 20, 2.0);
        assert!(upper > middle);
        assert!(lower < middle);
        assert!((upper - middle - (middle - lower)).abs() < 1e-9);
    }

    #[test]
    fn percent_change_spans_the_requested_days() {
        let prices = [100.0, 110.0, 121.0];
        assert!((percent_change(&prices, 1) - 10.0).abs() < 1e-9);
        assert!((percent_change(&prices, 2) - 21.0).abs() < 1e-9);
        assert!((percent_change(&prices, 5) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn volume_ratio_compares_to_trailing_average() {
        let mut volumes = vec![100.0; 20];
        volumes.push(200.0);
        let ratio = volume_ratio(&volumes, 20);
        assert!(ratio > 1.8, "ratio {ratio}");
    }

    #[test]
    fn position_in_range_bounds() {
        let highs = vec![110.0; 20];
        let lows = vec![90.0; 20];
        assert!((position_in_range(&highs, &lows, 90.0, 20) - 0.0).abs() < 1e-9);
        assert!((position_in_range(&highs, &lows, 110.0, 20) - 1.0).abs() < 1e-9);
        assert!((position_in_range(&highs, &lows, 100.0, 20) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn trend_strength_detects_direction() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i)).collect();
        let falling: Vec<f64> = (0..30).map(|i| 100.0 - f64::from(i)).collect();
        assert!(trend_strength(&rising) > 0.7);
        assert!(trend_strength(&falling) < 0.3);
        assert!((trend_strength(&[1.0, 2.0]) - 0.5).abs() < 1e-9);
    }
}
