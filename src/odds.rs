//! Conversion between American-style odds and implied probability.
//!
//! Implied probability is the market's break-even assessment; decimal odds
//! feed the Kelly `b` term in stake sizing.

use crate::error::{GridEdgeError, Result};

/// Convert American odds to the implied probability.
///
/// Favorites (negative odds): `|odds| / (|odds| + 100)`.
/// Underdogs and even money (non-negative): `100 / (odds + 100)`.
///
/// Odds of zero are undefined and rejected.
pub fn odds_to_probability(odds: i32) -> Result<f64> {
    if odds == 0 {
        return Err(GridEdgeError::InvalidOdds(odds));
    }

    let p = if odds < 0 {
        let magnitude = f64::from(odds.abs());
        magnitude / (magnitude + 100.0)
    } else {
        100.0 / (f64::from(odds) + 100.0)
    };

    Ok(p)
}

/// Convert a probability to decimal odds (`1/p`).
///
/// Rejects `p <= 0`, where the payout is undefined.
pub fn probability_to_decimal_odds(p: f64) -> Result<f64> {
    if p <= 0.0 {
        return Err(GridEdgeError::Domain(format!(
            "cannot convert probability {p} to decimal odds"
        )));
    }
    Ok(1.0 / p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_odds() {
        // -340: 340 / 440
        let p = odds_to_probability(-340).unwrap();
        assert!((p - 340.0 / 440.0).abs() < 1e-12, "p={}", p);
    }

    #[test]
    fn test_underdog_odds() {
        // +150: 100 / 250 = 0.4
        let p = odds_to_probability(150).unwrap();
        assert!((p - 0.4).abs() < 1e-12, "p={}", p);
    }

    #[test]
    fn test_even_odds() {
        let p = odds_to_probability(100).unwrap();
        assert!((p - 0.5).abs() < 1e-12, "p={}", p);
    }

    #[test]
    fn test_zero_odds_rejected() {
        assert!(matches!(
            odds_to_probability(0),
            Err(GridEdgeError::InvalidOdds(0))
        ));
    }

    #[test]
    fn test_decimal_odds() {
        let dec = probability_to_decimal_odds(0.5).unwrap();
        assert!((dec - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_nonpositive_probability_rejected() {
        assert!(probability_to_decimal_odds(0.0).is_err());
        assert!(probability_to_decimal_odds(-0.2).is_err());
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        // odds -> implied -> decimal must reproduce the implied probability
        for odds in [-340, -200, -110, 100, 120, 250, 900] {
            let implied = odds_to_probability(odds).unwrap();
            let decimal = probability_to_decimal_odds(implied).unwrap();
            assert!(
                (1.0 / decimal - implied).abs() < 1e-9,
                "round trip drifted for odds {}: implied={} decimal={}",
                odds,
                implied,
                decimal
            );
        }
    }
}
