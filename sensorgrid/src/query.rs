//! Proximity query parameter parsing.
//!
//! Turns user-supplied `radius` and `location` strings into validated
//! numbers:
//! - Radius: `<digits><unit>` where unit is `km` or `mi` (e.g. "50km",
//!   "100mi"), converted to meters.
//! - Location: `<lat>,<lon>` decimal degrees (e.g. "45.12,-90.34").
//!
//! Both grammars are anchored: the whole input must match, so "xx50kmyy"
//! is rejected rather than partially parsed.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Meters per statute mile.
const METERS_PER_MILE: f64 = 1609.34;

/// Meters per kilometer.
const METERS_PER_KM: f64 = 1000.0;

/// Error parsing a proximity query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The radius string doesn't match the `<digits><km|mi>` grammar.
    #[error("invalid value for \"radius\": must be formatted like \"50km\" or \"100mi\"")]
    InvalidRadius(String),

    /// The location string doesn't match the `<lat>,<lon>` grammar.
    #[error("invalid value for \"location\": must be formatted like \"45.12,-90.34\"")]
    InvalidLocation(String),

    /// A parser invariant was violated. Not a user error.
    #[error("internal query parse error: {0}")]
    Internal(&'static str),
}

/// Get the radius grammar regex, e.g. "50km".
///
/// Captures:
/// - Group 1: magnitude (digits only, no sign or fraction)
/// - Group 2: unit ("km" or "mi", lowercase)
fn radius_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)(km|mi)$").unwrap())
}

/// Get the location grammar regex, e.g. "45.12,-90.34".
///
/// Captures:
/// - Group 1: latitude (optional sign, optional fractional part)
/// - Group 2: longitude (same shape)
///
/// No whitespace is tolerated anywhere, including around the comma.
fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)$").unwrap())
}

/// Parse a radius string into meters.
///
/// Kilometers convert at exactly 1000 m; miles at 1609.34 m, rounded to the
/// nearest meter so "100mi" is exactly 160934 rather than a truncation
/// artifact.
///
/// # Arguments
///
/// * `raw` - Radius string, e.g. "50km" or "100mi"
///
/// # Errors
///
/// Returns [`QueryError::InvalidRadius`] when `raw` doesn't match the
/// grammar. Uppercase units, signs, fractions, embedded whitespace, and a
/// missing unit are all rejected.
pub fn parse_radius(raw: &str) -> Result<f64, QueryError> {
    let captures = radius_pattern()
        .captures(raw)
        .ok_or_else(|| QueryError::InvalidRadius(raw.to_string()))?;

    if captures.len() != 3 {
        return Err(QueryError::Internal(
            "unexpected capture group count for radius",
        ));
    }

    let magnitude: f64 = captures[1]
        .parse::<u64>()
        .map_err(|_| QueryError::InvalidRadius(raw.to_string()))? as f64;

    match &captures[2] {
        "km" => Ok(magnitude * METERS_PER_KM),
        "mi" => Ok((magnitude * METERS_PER_MILE).round()),
        _ => Err(QueryError::Internal("unexpected radius unit capture")),
    }
}

/// Parse a location string into `(lat, lon)` decimal degrees.
///
/// Latitude comes first on the wire. The grammar does not range-check:
/// "91.0,200.0" parses successfully.
///
/// # Errors
///
/// Returns [`QueryError::InvalidLocation`] when `raw` doesn't match the
/// `<lat>,<lon>` grammar.
pub fn parse_location(raw: &str) -> Result<(f64, f64), QueryError> {
    let captures = location_pattern()
        .captures(raw)
        .ok_or_else(|| QueryError::InvalidLocation(raw.to_string()))?;

    if captures.len() != 3 {
        return Err(QueryError::Internal(
            "unexpected capture group count for location",
        ));
    }

    let lat: f64 = captures[1]
        .parse()
        .map_err(|_| QueryError::InvalidLocation(raw.to_string()))?;
    let lon: f64 = captures[2]
        .parse()
        .map_err(|_| QueryError::InvalidLocation(raw.to_string()))?;

    Ok((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_radius_km() {
        assert_eq!(parse_radius("50km").unwrap(), 50_000.0);
        assert_eq!(parse_radius("1km").unwrap(), 1_000.0);
        assert_eq!(parse_radius("0km").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_radius_mi_rounds_to_nearest_meter() {
        assert_eq!(parse_radius("100mi").unwrap(), 160_934.0);
        assert_eq!(parse_radius("1mi").unwrap(), 1_609.0);
    }

    #[test]
    fn test_parse_radius_rejects_malformed() {
        for raw in [
            "50",       // missing unit
            "km",       // missing magnitude
            "50 km",    // embedded whitespace
            " 50km",    // leading whitespace
            "50km ",    // trailing whitespace
            "-5km",     // sign
            "1.5km",    // fraction
            "50KM",     // uppercase unit
            "50xyz",    // unknown unit
            "50miles",  // unit suffix
            "xx50kmyy", // embedded match
            "",
        ] {
            let err = parse_radius(raw).unwrap_err();
            assert_eq!(
                err,
                QueryError::InvalidRadius(raw.to_string()),
                "expected rejection for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_radius_error_display() {
        let err = parse_radius("bogus").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for \"radius\": must be formatted like \"50km\" or \"100mi\""
        );
    }

    #[test]
    fn test_parse_location_decimal_pair() {
        assert_eq!(parse_location("45.12,-90.34").unwrap(), (45.12, -90.34));
        assert_eq!(parse_location("-45.12,90.34").unwrap(), (-45.12, 90.34));
    }

    #[test]
    fn test_parse_location_whole_degrees() {
        assert_eq!(parse_location("45,-90").unwrap(), (45.0, -90.0));
    }

    #[test]
    fn test_parse_location_does_not_range_check() {
        assert_eq!(parse_location("91.0,200.0").unwrap(), (91.0, 200.0));
    }

    #[test]
    fn test_parse_location_rejects_malformed() {
        for raw in [
            "45.12",          // missing longitude
            "45.12,",         // empty longitude
            "45.,-90.",       // bare decimal point
            ",-90.34",        // empty latitude
            "45.12, -90.34",  // whitespace after comma
            " 45.12,-90.34",  // leading whitespace
            "45.12,-90.34,7", // extra component
            "abc",
            "Minneapolis, MN",
            "",
        ] {
            let err = parse_location(raw).unwrap_err();
            assert_eq!(
                err,
                QueryError::InvalidLocation(raw.to_string()),
                "expected rejection for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_location_error_display() {
        let err = parse_location("bogus").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for \"location\": must be formatted like \"45.12,-90.34\""
        );
    }
}
