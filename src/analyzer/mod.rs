// Analyzer module: trend analysis core plus the narrative generator.

pub mod narrative;
pub mod trend_analysis;

// Re-export the main entry points for ease of use.
pub use trend_analysis::{Analyzer, TrendAnalyzer};
