use crate::analyzer::narrative;
use crate::model::{PricePoint, Prediction, ProductStats, Trend};
use chrono::Utc;

/// Relative change below which a series counts as flat, in percent.
const STABLE_THRESHOLD_PCT: f64 = 2.0;
/// How many trailing observations form the recent window.
const RECENT_WINDOW: usize = 3;
/// Confidence lost per point of coefficient of variation.
const VOLATILITY_PENALTY: f64 = 2.0;

/// Trait defining the interface for a price-history analyzer.
pub trait Analyzer {
    /// Mean and population standard deviation over the full series,
    /// for the cached per-product summary. `None` for an empty series.
    fn calculate_stats(&self, history: &[PricePoint]) -> Option<ProductStats>;

    /// Full trend analysis over a product's price history.
    /// `None` means fewer than two observations, which is a normal
    /// displayable state rather than an error.
    fn analyze(&self, history: &[PricePoint]) -> Option<Prediction>;
}

/// Stateless implementation; a pure function of its input, safe to call
/// concurrently.
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for TrendAnalyzer {
    fn calculate_stats(&self, history: &[PricePoint]) -> Option<ProductStats> {
        let first = history.first()?;
        let prices: Vec<f64> = history.iter().map(|p| p.price).collect();
        let avg = mean(&prices);
        let std_dev = population_variance(&prices, avg).sqrt();

        Some(ProductStats {
            product_id: first.product_id.clone(),
            avg_price: avg,
            std_dev,
            last_updated: Utc::now(),
        })
    }

    fn analyze(&self, history: &[PricePoint]) -> Option<Prediction> {
        if history.len() < 2 {
            return None;
        }

        // Stable sort keeps insertion order for same-date points, so
        // repeated calls over the same store contents are bit-identical.
        let mut sorted: Vec<&PricePoint> = history.iter().collect();
        sorted.sort_by_key(|p| p.date);
        let prices: Vec<f64> = sorted.iter().map(|p| p.price).collect();
        let n = prices.len();

        let recent_avg = mean(&prices[n - RECENT_WINDOW.min(n)..]);
        let older_avg = mean(&prices[..n.saturating_sub(RECENT_WINDOW).max(1)]);

        // A zero baseline has no meaningful relative change; treat it as
        // neutral instead of dividing by it.
        let change_pct = if older_avg == 0.0 {
            0.0
        } else {
            (recent_avg - older_avg) / older_avg * 100.0
        };
        let trend = classify(change_pct);

        let (slope, intercept) = linear_regression(&prices);
        let predicted_price = (slope * n as f64 + intercept).max(0.0);

        let avg = mean(&prices);
        let std_dev = population_variance(&prices, avg).sqrt();
        // Same guard as above: an all-zero series is flat, not infinitely
        // volatile.
        let volatility = if avg == 0.0 {
            0.0
        } else {
            std_dev / avg * 100.0
        };

        let confidence = (100.0 - volatility * VOLATILITY_PENALTY)
            .clamp(0.0, 100.0)
            .round() as u8;

        let analysis = narrative::compose(trend, change_pct, slope, volatility);

        Some(Prediction {
            trend,
            confidence,
            predicted_price,
            analysis,
        })
    }
}

fn classify(change_pct: f64) -> Trend {
    if change_pct.abs() < STABLE_THRESHOLD_PCT {
        Trend::Stable
    } else if change_pct > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_variance(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Ordinary least squares fit of price against observation index.
/// Indices are distinct integers, so the denominator is strictly
/// positive for two or more observations.
fn linear_regression(prices: &[f64]) -> (f64, f64) {
    let n = prices.len() as f64;
    let mut x_sum = 0.0;
    let mut y_sum = 0.0;
    let mut xy_sum = 0.0;
    let mut x_sq_sum = 0.0;

    for (i, &price) in prices.iter().enumerate() {
        let x = i as f64;
        x_sum += x;
        y_sum += price;
        xy_sum += x * price;
        x_sq_sum += x * x;
    }

    let slope = (n * xy_sum - x_sum * y_sum) / (n * x_sq_sum - x_sum * x_sum);
    let intercept = (y_sum - slope * x_sum) / n;
    (slope, intercept)
}
