use crate::model::ValidationError;
use chrono::NaiveDate;

/// Rejects prices the store must never contain. The analyzer itself
/// tolerates zero and negative values; this runs on the entry path.
pub fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() {
        return Err(ValidationError::NonFinitePrice);
    }
    if price < 0.0 {
        return Err(ValidationError::NegativePrice(price));
    }
    Ok(())
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(text: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_and_positive_prices() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(19.99).is_ok());
    }

    #[test]
    fn rejects_negative_and_non_finite_prices() {
        assert_eq!(validate_price(-1.0), Err(ValidationError::NegativePrice(-1.0)));
        assert_eq!(validate_price(f64::NAN), Err(ValidationError::NonFinitePrice));
        assert_eq!(validate_price(f64::INFINITY), Err(ValidationError::NonFinitePrice));
    }

    #[test]
    fn parses_iso_dates() {
        let date = parse_date("2024-03-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(parse_date(" 2024-03-15 ").unwrap(), date);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date("15.03.2024").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("").is_err());
    }
}
