// Utility functions
use rand::Rng;
use rand::distr::Alphanumeric;

/// Random 16-character alphanumeric record id.
pub fn generate_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
