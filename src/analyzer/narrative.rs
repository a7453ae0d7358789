//! Narrative generation: maps the numeric outcome of an analysis to a
//! short human-readable rationale.

use crate::model::Trend;

/// Volatility below this still reads as "consistent" for a moving market.
const DIRECTIONAL_STEADY_CV: f64 = 15.0;
/// Flat markets get a stricter bar before being called settled.
const FLAT_STEADY_CV: f64 = 10.0;

/// Composes the analysis text from the classified trend, the percent
/// change between the recency windows, the regression slope and the
/// coefficient of variation. The text always conveys direction,
/// magnitude, a persistence hint and a volatility caveat.
pub fn compose(trend: Trend, change_pct: f64, slope: f64, volatility: f64) -> String {
    let magnitude = change_pct.abs();

    let steady = match trend {
        Trend::Stable => volatility < FLAT_STEADY_CV,
        _ => volatility < DIRECTIONAL_STEADY_CV,
    };
    let slope_agrees = match trend {
        Trend::Up => slope > 0.0,
        Trend::Down => slope < 0.0,
        Trend::Stable => false,
    };

    let lead = match trend {
        Trend::Up => format!(
            "Recent observations point upward, with a {magnitude:.1}% increase over the older baseline. "
        ),
        Trend::Down => format!(
            "Recent data indicates a downward trend with a {magnitude:.1}% decrease. "
        ),
        Trend::Stable => format!(
            "Prices are currently stable with minimal movement ({magnitude:.1}% change). "
        ),
    };

    let persistence = match (trend, slope_agrees) {
        (Trend::Up, true) => "The fitted line suggests the climb is likely to continue. ",
        (Trend::Down, true) => "The overall pattern suggests the decline may persist. ",
        _ => "",
    };

    let caveat = match (trend, steady) {
        (Trend::Up, true) => "Movements are consistent, supporting a steady upward trajectory.",
        (Trend::Up, false) => "Volatility is moderate, so expect some fluctuation along the way.",
        (Trend::Down, true) => "Changes are consistent, indicating a steady decline.",
        (Trend::Down, false) => {
            "Volatility is present, which leaves room for a recovery."
        }
        (Trend::Stable, true) => {
            "That stability holds across the whole series, suggesting a settled market."
        }
        (Trend::Stable, false) => {
            "The flat trend hides some volatility that could precede a directional move."
        }
    };

    let mut text = lead;
    text.push_str(persistence);
    text.push_str(caveat);
    text
}
